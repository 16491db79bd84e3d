// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Graph command - visualize the unit tree as a graph

use miette::Result;
use std::path::PathBuf;

use super::GraphFormat;
use crate::config::MerlinConfig;
use crate::pipeline::UnitGraph;

/// Run the graph command
pub async fn run(snapshot_path: PathBuf, format: GraphFormat, config: &MerlinConfig) -> Result<()> {
    let snapshot = super::load_snapshot(&snapshot_path).await?;
    let suffix_len = config.display.label_suffix_len;

    let graph = UnitGraph::build(&snapshot.units);

    let output = match format {
        GraphFormat::Text => graph.to_text(suffix_len)?,
        GraphFormat::Dot => graph.to_dot(suffix_len),
        GraphFormat::Mermaid => graph.to_mermaid(suffix_len),
    };

    println!("{}", output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_graph_every_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("snapshot.json");
        tokio::fs::write(
            &path,
            r#"{
  "pipeline": { "id": "p1", "name": "nightly" },
  "units": [
    { "id": "u1", "commandId": "c1" },
    { "id": "u2", "parentUnitId": "u1", "zipId": "z1" }
  ]
}"#,
        )
        .await
        .unwrap();

        for format in [GraphFormat::Text, GraphFormat::Dot, GraphFormat::Mermaid] {
            run(path.clone(), format, &MerlinConfig::default()).await.unwrap();
        }
    }
}
