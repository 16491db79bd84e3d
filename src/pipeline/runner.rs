// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Runner type resolution
//!
//! A unit record carries seven sibling reference fields of which exactly one
//! may be set. Resolution turns that convention into a tagged value.

use serde::{Deserialize, Serialize};

use super::definition::{Command, PipelineCall, PipelineUnit, QueryQueue, SftpTransfer, Unzip, Zip};
use crate::errors::{MerlinError, MerlinResult};

/// Kind of task a unit performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunnerType {
    Command,
    QueryQueue,
    #[serde(rename = "SFTPDownloader")]
    SftpDownloader,
    #[serde(rename = "SFTPUploader")]
    SftpUploader,
    Zip,
    Unzip,
    CallPipeline,
}

impl RunnerType {
    /// Reference fields in the order they are inspected
    pub const PRIORITY: [RunnerType; 7] = [
        RunnerType::Command,
        RunnerType::QueryQueue,
        RunnerType::SftpDownloader,
        RunnerType::SftpUploader,
        RunnerType::Zip,
        RunnerType::Unzip,
        RunnerType::CallPipeline,
    ];

    /// Tag used in documents and labels
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::QueryQueue => "QueryQueue",
            Self::SftpDownloader => "SFTPDownloader",
            Self::SftpUploader => "SFTPUploader",
            Self::Zip => "Zip",
            Self::Unzip => "Unzip",
            Self::CallPipeline => "CallPipeline",
        }
    }

    /// Name of the unit field holding the reference id
    pub fn reference_field(self) -> &'static str {
        match self {
            Self::Command => "commandId",
            Self::QueryQueue => "queryQueueId",
            Self::SftpDownloader => "sftpDownloaderId",
            Self::SftpUploader => "sftpUploaderId",
            Self::Zip => "zipId",
            Self::Unzip => "unzipId",
            Self::CallPipeline => "callPipelineId",
        }
    }
}

impl std::fmt::Display for RunnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RunnerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunnerType::PRIORITY
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown runner type: {}", s))
    }
}

/// Resolve the runner type of a unit
///
/// Exactly one reference field must be set. Several set fields are an error
/// rather than a silent pick; the fields are reported in priority order.
pub fn resolve_runner_type(unit: &PipelineUnit) -> MerlinResult<RunnerType> {
    let set: Vec<RunnerType> = RunnerType::PRIORITY
        .iter()
        .copied()
        .filter(|t| unit.reference(*t).is_some())
        .collect();

    match set.as_slice() {
        [] => Err(MerlinError::UnknownRunnerType {
            unit_id: unit.id.clone(),
        }),
        [only] => Ok(*only),
        many => Err(MerlinError::AmbiguousRunnerType {
            unit_id: unit.id.clone(),
            fields: many.iter().map(|t| t.reference_field().to_string()).collect(),
        }),
    }
}

/// A resolved runner reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerRef<'a> {
    Command(&'a str),
    QueryQueue(&'a str),
    SftpDownloader(&'a str),
    SftpUploader(&'a str),
    Zip(&'a str),
    Unzip(&'a str),
    CallPipeline(&'a str),
}

impl<'a> RunnerRef<'a> {
    pub fn new(runner_type: RunnerType, id: &'a str) -> Self {
        match runner_type {
            RunnerType::Command => Self::Command(id),
            RunnerType::QueryQueue => Self::QueryQueue(id),
            RunnerType::SftpDownloader => Self::SftpDownloader(id),
            RunnerType::SftpUploader => Self::SftpUploader(id),
            RunnerType::Zip => Self::Zip(id),
            RunnerType::Unzip => Self::Unzip(id),
            RunnerType::CallPipeline => Self::CallPipeline(id),
        }
    }

    pub fn runner_type(&self) -> RunnerType {
        match self {
            Self::Command(_) => RunnerType::Command,
            Self::QueryQueue(_) => RunnerType::QueryQueue,
            Self::SftpDownloader(_) => RunnerType::SftpDownloader,
            Self::SftpUploader(_) => RunnerType::SftpUploader,
            Self::Zip(_) => RunnerType::Zip,
            Self::Unzip(_) => RunnerType::Unzip,
            Self::CallPipeline(_) => RunnerType::CallPipeline,
        }
    }

    pub fn reference_id(&self) -> &'a str {
        match *self {
            Self::Command(id)
            | Self::QueryQueue(id)
            | Self::SftpDownloader(id)
            | Self::SftpUploader(id)
            | Self::Zip(id)
            | Self::Unzip(id)
            | Self::CallPipeline(id) => id,
        }
    }
}

/// A loaded runner detail, borrowed from its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunnerDetail<'a> {
    Command(&'a Command),
    QueryQueue(&'a QueryQueue),
    SftpDownloader(&'a SftpTransfer),
    SftpUploader(&'a SftpTransfer),
    Zip(&'a Zip),
    Unzip(&'a Unzip),
    CallPipeline(&'a PipelineCall),
}

impl<'a> RunnerDetail<'a> {
    pub fn id(&self) -> &'a str {
        match *self {
            Self::Command(d) => &d.id,
            Self::QueryQueue(d) => &d.id,
            Self::SftpDownloader(d) | Self::SftpUploader(d) => &d.id,
            Self::Zip(d) => &d.id,
            Self::Unzip(d) => &d.id,
            Self::CallPipeline(d) => &d.id,
        }
    }

    /// The detail's own name, if it has a non-blank one
    pub fn name(&self) -> Option<&'a str> {
        let name = match *self {
            Self::Command(d) => d.name.as_deref(),
            Self::QueryQueue(d) => d.name.as_deref(),
            Self::SftpDownloader(d) | Self::SftpUploader(d) => d.name.as_deref(),
            Self::Zip(d) => d.name.as_deref(),
            Self::Unzip(d) => d.name.as_deref(),
            Self::CallPipeline(d) => d.name.as_deref(),
        };
        name.map(str::trim).filter(|n| !n.is_empty())
    }
}
