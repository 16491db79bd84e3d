// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Error types
//!
//! Resolution failures are loud, document problems are collected, and
//! everything else is plumbing around snapshot and document files.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for merlin operations
pub type MerlinResult<T> = Result<T, MerlinError>;

/// Main error type for merlin
#[derive(Error, Debug, Diagnostic)]
pub enum MerlinError {
    // ─────────────────────────────────────────────────────────────────────────
    // Runner Resolution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Unit '{unit_id}' has no runner reference")]
    #[diagnostic(
        code(merlin::unknown_runner_type),
        help("Exactly one of commandId, queryQueueId, sftpDownloaderId, sftpUploaderId, zipId, unzipId or callPipelineId must be set")
    )]
    UnknownRunnerType { unit_id: String },

    #[error("Unit '{unit_id}' references more than one runner: {}", .fields.join(", "))]
    #[diagnostic(
        code(merlin::ambiguous_runner_type),
        help("A unit wraps exactly one runner; clear all but one reference field")
    )]
    AmbiguousRunnerType { unit_id: String, fields: Vec<String> },

    #[error("Parent cycle detected")]
    #[diagnostic(
        code(merlin::parent_cycle),
        help("Units on a cycle never reach a root; fix their parentUnitId values")
    )]
    ParentCycle { units: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Document Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Malformed pipeline document ({} problem(s)):\n{}", .errors.len(), render_problems(.errors))]
    #[diagnostic(
        code(merlin::malformed_document),
        help("Fix every listed problem and import the document again")
    )]
    MalformedDocument { errors: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Snapshot file not found: {path}")]
    #[diagnostic(
        code(merlin::snapshot_not_found),
        help("A snapshot is a JSON file holding a `pipeline` record and its `units`")
    )]
    SnapshotNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(merlin::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(merlin::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(merlin::io_error))]
    Io { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(merlin::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(merlin::json_error))]
    Json { message: String },
}

fn render_problems(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<std::io::Error> for MerlinError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for MerlinError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for MerlinError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl MerlinError {
    /// Build a malformed-document error from collected problems
    pub fn malformed<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MalformedDocument {
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Id of the unit a resolution error is about
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Self::UnknownRunnerType { unit_id } | Self::AmbiguousRunnerType { unit_id, .. } => {
                Some(unit_id)
            }
            _ => None,
        }
    }

    /// Problems carried by a malformed-document error
    pub fn problems(&self) -> &[String] {
        match self {
            Self::MalformedDocument { errors } => errors,
            _ => &[],
        }
    }
}
