// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for merlin.

pub mod export;
pub mod graph;
pub mod import;
pub mod inspect;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::MerlinConfig;
use crate::errors::{MerlinError, MerlinResult};
use crate::pipeline::Snapshot;

/// Pipeline unit inspector and converter
///
/// Rebuild, check and convert the unit trees of job pipelines.
#[derive(Parser, Debug)]
#[clap(
    name = "merlin",
    version,
    about = "Inspect, validate and convert job pipeline unit trees",
    long_about = None,
    after_help = "Examples:\n\
        merlin inspect nightly.json             Show the unit tree\n\
        merlin validate nightly.json            Check the unit forest\n\
        merlin graph nightly.json -f mermaid    Render the execution graph\n\
        merlin export nightly.json -o out.yaml  Write the YAML document\n\
        merlin import out.yaml --json           Rebuild a snapshot from YAML\n\n\
        See 'merlin <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Configuration file (defaults to .merlin.yaml)
    #[clap(long, global = true, value_name = "FILE", env = "MERLIN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the unit tree of a pipeline snapshot
    Inspect {
        /// Snapshot file (JSON)
        snapshot: PathBuf,
    },

    /// Validate the unit forest of a pipeline snapshot
    Validate {
        /// Snapshot file (JSON)
        snapshot: PathBuf,
    },

    /// Show the pipeline as a graph
    Graph {
        /// Snapshot file (JSON)
        snapshot: PathBuf,

        /// Output format
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// Export a pipeline snapshot as a YAML document
    Export {
        /// Snapshot file (JSON)
        snapshot: PathBuf,

        /// Output file (default: export.default_output, else stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a YAML document back into a pipeline snapshot
    Import {
        /// Document file (YAML)
        document: PathBuf,

        /// Print the rebuilt snapshot as JSON
        #[clap(long)]
        json: bool,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Read a file that a command was pointed at
pub async fn read_input(path: &Path) -> MerlinResult<String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(MerlinError::SnapshotNotFound {
            path: path.to_path_buf(),
        });
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MerlinError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
}

/// Load a pipeline snapshot from a JSON file
pub async fn load_snapshot(path: &Path) -> MerlinResult<Snapshot> {
    let content = read_input(path).await?;
    let snapshot = Snapshot::from_json(&content)?;

    tracing::debug!(
        path = %path.display(),
        pipeline = %snapshot.pipeline.name,
        units = snapshot.units.len(),
        "loaded snapshot"
    );

    Ok(snapshot)
}

/// Load the configuration named by `--config`, or .merlin.yaml in the working directory
pub fn load_config(path: Option<&Path>) -> MerlinResult<MerlinConfig> {
    match path {
        Some(path) => MerlinConfig::load(path),
        None => MerlinConfig::load(Path::new(crate::config::CONFIG_FILE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_graph_format() {
        assert_eq!("Mermaid".parse::<GraphFormat>().unwrap(), GraphFormat::Mermaid);
        assert_eq!("dot".parse::<GraphFormat>().unwrap(), GraphFormat::Dot);
        assert!("svg".parse::<GraphFormat>().is_err());
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from(["merlin", "-v", "graph", "p.json", "--format", "dot"]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Graph { snapshot, format } => {
                assert_eq!(snapshot, PathBuf::from("p.json"));
                assert_eq!(format, GraphFormat::Dot);
            }
            other => panic!("Expected graph command, got {:?}", other),
        }
    }

    #[test]
    fn test_graph_format_defaults_to_text() {
        let cli = Cli::try_parse_from(["merlin", "graph", "p.json"]).unwrap();

        match cli.command {
            Commands::Graph { format, .. } => assert_eq!(format, GraphFormat::Text),
            other => panic!("Expected graph command, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_graph_format_is_rejected() {
        let err = Cli::try_parse_from(["merlin", "graph", "p.json", "-f", "svg"]).unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[tokio::test]
    async fn test_load_missing_snapshot() {
        let temp = TempDir::new().unwrap();
        let err = load_snapshot(&temp.path().join("missing.json")).await.unwrap_err();

        assert!(matches!(err, MerlinError::SnapshotNotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("p.json");
        tokio::fs::write(
            &path,
            r#"{
  "pipeline": { "id": "p1", "name": "nightly" },
  "units": [
    { "id": "u1", "pipelineId": "p1", "commandId": "c1" }
  ]
}"#,
        )
        .await
        .unwrap();

        let snapshot = load_snapshot(&path).await.unwrap();
        assert_eq!(snapshot.pipeline.name, "nightly");
        assert_eq!(snapshot.units[0].command_id.as_deref(), Some("c1"));
    }
}
