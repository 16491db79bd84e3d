// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Pipeline definition structures
//!
//! Flat records exactly as the backend returns them: a pipeline, its units,
//! and the lazily resolved runner details hanging off each unit.

use serde::{Deserialize, Serialize};

use super::runner::{resolve_runner_type, RunnerDetail, RunnerRef, RunnerType};
use crate::errors::MerlinResult;

/// Number of trailing id characters used in synthesized unit labels
pub const DEFAULT_LABEL_SUFFIX_LEN: usize = 4;

/// Pipeline record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Pipeline id
    #[serde(default)]
    pub id: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// Agent that owns and runs the pipeline
    #[serde(default)]
    pub agent_id: Option<String>,

    /// Stop the whole pipeline when a unit fails
    #[serde(default)]
    pub abort_on_error: bool,

    /// Stop the whole pipeline when a unit times out
    #[serde(default)]
    pub abort_on_timeout: bool,

    /// Keep running sibling branches after a failure
    #[serde(default)]
    pub continue_on_error: bool,

    /// Delete the pipeline after its first run
    #[serde(default)]
    pub disposable: bool,
}

/// A pipeline together with its flat unit list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pipeline: Pipeline,

    #[serde(default)]
    pub units: Vec<PipelineUnit>,
}

impl Snapshot {
    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> MerlinResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Serialize the snapshot to pretty JSON
    pub fn to_json(&self) -> MerlinResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Retry, timeout and failure handling for a single unit
///
/// Integers are signed so that out-of-range values coming from the backend
/// can be represented and reported instead of rejected at parse time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutionPolicy {
    pub retry_count: i64,
    pub retry_after_milliseconds: i64,
    pub timeout_milliseconds: i64,
    pub continue_on_error: bool,
    pub abort_on_error: bool,
    pub abort_on_timeout: bool,
}

/// One task node of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineUnit {
    /// Unit id
    pub id: String,

    /// Owning pipeline
    #[serde(default)]
    pub pipeline_id: String,

    /// Parent unit; `None` marks a root
    #[serde(default)]
    pub parent_unit_id: Option<String>,

    #[serde(default)]
    pub command_id: Option<String>,

    #[serde(default)]
    pub query_queue_id: Option<String>,

    #[serde(default)]
    pub sftp_downloader_id: Option<String>,

    #[serde(default)]
    pub sftp_uploader_id: Option<String>,

    #[serde(default)]
    pub zip_id: Option<String>,

    #[serde(default)]
    pub unzip_id: Option<String>,

    #[serde(default, alias = "callPipeline")]
    pub call_pipeline_id: Option<String>,

    /// Execution policy (flat on the wire)
    #[serde(flatten)]
    pub policy: ExecutionPolicy,

    #[serde(default)]
    pub pos_x: f64,

    #[serde(default)]
    pub pos_y: f64,

    #[serde(rename = "Command", default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,

    #[serde(rename = "QueryQueue", default, skip_serializing_if = "Option::is_none")]
    pub query_queue: Option<QueryQueue>,

    #[serde(rename = "SFTPDownloader", default, skip_serializing_if = "Option::is_none")]
    pub sftp_downloader: Option<SftpTransfer>,

    #[serde(rename = "SFTPUploader", default, skip_serializing_if = "Option::is_none")]
    pub sftp_uploader: Option<SftpTransfer>,

    #[serde(rename = "Zip", default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<Zip>,

    #[serde(rename = "Unzip", default, skip_serializing_if = "Option::is_none")]
    pub unzip: Option<Unzip>,

    #[serde(rename = "CallPipeline", default, skip_serializing_if = "Option::is_none")]
    pub call_pipeline: Option<PipelineCall>,
}

impl PipelineUnit {
    /// Parent id, treating blank strings as absent
    pub fn parent_id(&self) -> Option<&str> {
        non_blank(self.parent_unit_id.as_deref())
    }

    /// Whether this unit starts a chain
    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }

    /// Reference id stored for a runner type, if set
    pub fn reference(&self, runner_type: RunnerType) -> Option<&str> {
        let field = match runner_type {
            RunnerType::Command => &self.command_id,
            RunnerType::QueryQueue => &self.query_queue_id,
            RunnerType::SftpDownloader => &self.sftp_downloader_id,
            RunnerType::SftpUploader => &self.sftp_uploader_id,
            RunnerType::Zip => &self.zip_id,
            RunnerType::Unzip => &self.unzip_id,
            RunnerType::CallPipeline => &self.call_pipeline_id,
        };
        non_blank(field.as_deref())
    }

    /// Set the reference id for a runner type
    pub fn set_reference(&mut self, runner_type: RunnerType, id: impl Into<String>) {
        let id = Some(id.into());
        match runner_type {
            RunnerType::Command => self.command_id = id,
            RunnerType::QueryQueue => self.query_queue_id = id,
            RunnerType::SftpDownloader => self.sftp_downloader_id = id,
            RunnerType::SftpUploader => self.sftp_uploader_id = id,
            RunnerType::Zip => self.zip_id = id,
            RunnerType::Unzip => self.unzip_id = id,
            RunnerType::CallPipeline => self.call_pipeline_id = id,
        }
    }

    /// Resolve which runner this unit wraps
    pub fn runner_type(&self) -> MerlinResult<RunnerType> {
        resolve_runner_type(self)
    }

    /// Resolve the runner together with its reference id
    pub fn runner(&self) -> MerlinResult<RunnerRef<'_>> {
        let runner_type = resolve_runner_type(self)?;
        let id = self.reference(runner_type).unwrap_or_default();
        Ok(RunnerRef::new(runner_type, id))
    }

    /// The resolved runner detail, if it has been loaded
    ///
    /// A detail of another runner kind, or one whose id disagrees with the
    /// reference id, counts as unresolved.
    pub fn detail(&self) -> Option<RunnerDetail<'_>> {
        let runner = self.runner().ok()?;
        let detail = match runner.runner_type() {
            RunnerType::Command => self.command.as_ref().map(RunnerDetail::Command),
            RunnerType::QueryQueue => self.query_queue.as_ref().map(RunnerDetail::QueryQueue),
            RunnerType::SftpDownloader => self
                .sftp_downloader
                .as_ref()
                .map(RunnerDetail::SftpDownloader),
            RunnerType::SftpUploader => self.sftp_uploader.as_ref().map(RunnerDetail::SftpUploader),
            RunnerType::Zip => self.zip.as_ref().map(RunnerDetail::Zip),
            RunnerType::Unzip => self.unzip.as_ref().map(RunnerDetail::Unzip),
            RunnerType::CallPipeline => self.call_pipeline.as_ref().map(RunnerDetail::CallPipeline),
        }?;

        match non_blank(Some(detail.id())) {
            Some(id) if id != runner.reference_id() => None,
            _ => Some(detail),
        }
    }

    /// Attach a detail object, storing it in the field matching its kind
    pub fn set_detail(&mut self, detail: OwnedDetail) {
        match detail {
            OwnedDetail::Command(d) => self.command = Some(d),
            OwnedDetail::QueryQueue(d) => self.query_queue = Some(d),
            OwnedDetail::SftpDownloader(d) => self.sftp_downloader = Some(d),
            OwnedDetail::SftpUploader(d) => self.sftp_uploader = Some(d),
            OwnedDetail::Zip(d) => self.zip = Some(d),
            OwnedDetail::Unzip(d) => self.unzip = Some(d),
            OwnedDetail::CallPipeline(d) => self.call_pipeline = Some(d),
        }
    }

    /// Human-readable label using the default suffix length
    pub fn display_name(&self) -> String {
        self.display_name_with(DEFAULT_LABEL_SUFFIX_LEN)
    }

    /// Human-readable label, never empty
    ///
    /// Uses the detail's own name when loaded, otherwise the runner type
    /// followed by the last `suffix_len` characters of the unit id.
    pub fn display_name_with(&self, suffix_len: usize) -> String {
        if let Some(name) = self.detail().and_then(|d| d.name()) {
            return name.to_string();
        }

        let kind = match self.runner_type() {
            Ok(t) => t.as_str(),
            Err(_) => "Unknown",
        };

        let chars: Vec<char> = self.id.trim().chars().collect();
        let start = chars.len().saturating_sub(suffix_len.max(1));
        let suffix: String = chars[start..].iter().collect();

        if suffix.is_empty() {
            kind.to_string()
        } else {
            format!("{} {}", kind, suffix)
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Command runner detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    pub name: Option<String>,
    /// Executable or script body
    pub target: String,
    pub args: Option<String>,
    pub working_directory: Option<String>,
    /// Target is an inline script rather than an executable
    pub raw_script: bool,
    /// Run without waiting on the scheduler queue
    pub instant: bool,
    pub return_output: bool,
    pub return_output_type: Option<String>,
}

/// Query queue runner detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryQueue {
    pub id: String,
    pub name: Option<String>,
    /// Statements, executed by ascending `order`
    pub statements: Vec<QueryStatement>,
}

impl QueryQueue {
    /// Statements sorted by their explicit order
    pub fn ordered_statements(&self) -> Vec<&QueryStatement> {
        let mut statements: Vec<&QueryStatement> = self.statements.iter().collect();
        statements.sort_by_key(|s| s.order);
        statements
    }
}

/// One SQL statement of a query queue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryStatement {
    pub id: String,
    pub order: i64,
    pub statement: String,
    pub output_path: Option<String>,
    pub return_output: bool,
    /// Column separator for file output
    pub separator: Option<String>,
    /// Rows per output chunk
    pub chunk_size: Option<i64>,
    pub encoding: Option<String>,
    pub date_format: Option<String>,
    pub sql_connection: Option<SqlConnection>,
}

/// Database connection used by a statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SqlConnection {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub connection_string: String,
}

/// SFTP downloader or uploader detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SftpTransfer {
    pub id: String,
    pub name: Option<String>,
    pub link: Option<SftpLink>,
    pub file_streams: Vec<FileStream>,
}

/// SFTP server credentials reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SftpLink {
    pub id: String,
    pub name: String,
    pub server: String,
    pub port: u16,
    pub user: String,
}

/// Input/output pair moved by a transfer runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileStream {
    pub input: String,
    pub output: String,
    pub return_output: bool,
}

/// Zip runner detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Zip {
    pub id: String,
    pub name: Option<String>,
    pub output_name: Option<String>,
    pub output_path: Option<String>,
    pub file_streams: Vec<ZipFileStream>,
}

/// File selection added to an archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZipFileStream {
    pub input: String,
    pub wildcard_expression: Option<String>,
}

/// Unzip runner detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Unzip {
    pub id: String,
    pub name: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub file_streams: Vec<FileStream>,
}

/// Call into another pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineCall {
    /// Id of the called pipeline
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// An owned detail of any runner kind
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedDetail {
    Command(Command),
    QueryQueue(QueryQueue),
    SftpDownloader(SftpTransfer),
    SftpUploader(SftpTransfer),
    Zip(Zip),
    Unzip(Unzip),
    CallPipeline(PipelineCall),
}
