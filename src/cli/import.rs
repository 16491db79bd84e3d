// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Import command - rebuild a snapshot from a YAML document

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use crate::document::from_text;
use crate::errors::MerlinResult;
use crate::pipeline::{build_forest, Snapshot};
use crate::utils::{print_info, print_success};

/// Run the import command
pub async fn run(document_path: PathBuf, json: bool, verbose: bool) -> Result<()> {
    let snapshot = import_file(&document_path).await?;

    if json {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    let forest = build_forest(&snapshot.units);

    print_success(&format!("Document {} is valid", document_path.display()));
    println!();
    println!("{}:", "Imported pipeline".bold());
    println!("  Name: {}", snapshot.pipeline.name);
    println!("  Units: {}", snapshot.units.len());
    println!("  Roots: {}", forest.roots().count());
    println!("  Max depth: {}", forest.max_depth());

    if verbose {
        for unit in &snapshot.units {
            if unit.detail().is_none() {
                print_info(&format!("{} has no runner detail", unit.display_name()));
            }
        }
    }

    Ok(())
}

/// Read and rebuild the document at `path`
pub async fn import_file(path: &Path) -> MerlinResult<Snapshot> {
    let text = super::read_input(path).await?;
    let snapshot = from_text(&text)?;

    tracing::info!(
        path = %path.display(),
        pipeline = %snapshot.pipeline.name,
        units = snapshot.units.len(),
        "imported pipeline document"
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"
pipeline: { id: p1, name: nightly, agentId: agent-1 }
units:
  - { id: a, type: Command, position: { x: 0, y: 0 }, policy: {}, config: { reference: c1 } }
  - { id: b, type: Zip, parentUnitId: a, position: { x: 0, y: 1 }, policy: {}, config: { reference: z1 } }
"#;

    #[tokio::test]
    async fn test_import_summary_and_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nightly.yaml");
        tokio::fs::write(&path, DOCUMENT).await.unwrap();

        run(path.clone(), false, true).await.unwrap();
        run(path, true, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        tokio::fs::write(&path, "pipeline: { name: nightly }\n").await.unwrap();

        let err = import_file(&path).await.unwrap_err();
        assert!(err
            .problems()
            .iter()
            .any(|p| p == "Missing `units` section"));
    }
}
