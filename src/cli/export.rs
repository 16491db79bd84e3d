// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Export command - write a snapshot as a YAML document

use miette::Result;
use std::path::{Path, PathBuf};

use crate::config::MerlinConfig;
use crate::document::to_text_with;
use crate::errors::{MerlinError, MerlinResult};
use crate::utils::print_success;

/// Run the export command
pub async fn run(snapshot_path: PathBuf, output: Option<PathBuf>, config: &MerlinConfig) -> Result<()> {
    let output = output.or_else(|| config.export.default_output.clone());

    match output {
        Some(path) => {
            export_file(&snapshot_path, &path, config).await?;
            print_success(&format!("Exported {}", path.display()));
        }
        None => {
            let snapshot = super::load_snapshot(&snapshot_path).await?;
            let text = to_text_with(&snapshot.pipeline, &snapshot.units, &config.export_options())?;
            print!("{}", text);
        }
    }

    Ok(())
}

/// Export the snapshot at `snapshot_path` into a document at `output`
pub async fn export_file(snapshot_path: &Path, output: &Path, config: &MerlinConfig) -> MerlinResult<()> {
    let snapshot = super::load_snapshot(snapshot_path).await?;
    let text = to_text_with(&snapshot.pipeline, &snapshot.units, &config.export_options())?;

    tokio::fs::write(output, text)
        .await
        .map_err(|e| MerlinError::FileWriteError {
            path: output.to_path_buf(),
            error: e.to_string(),
        })?;

    tracing::info!(
        pipeline = %snapshot.pipeline.name,
        units = snapshot.units.len(),
        output = %output.display(),
        "exported pipeline"
    );

    Ok(())
}
