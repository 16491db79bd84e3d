// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Pipeline document structures
//!
//! The exported YAML has three sections: `pipeline` metadata, `units` and
//! `dependencies`. Each unit is tagged by `type` and carries a `config`
//! block shaped by that type.

use serde::{Deserialize, Serialize};

use crate::pipeline::{
    Command, ExecutionPolicy, OwnedDetail, Pipeline, PipelineCall, QueryQueue, RunnerType,
    SftpTransfer, Unzip, Zip,
};

/// Note written into config blocks whose detail was not loaded
pub const UNRESOLVED_NOTE: &str = "Runner detail unavailable; only the reference id was exported";

/// A whole pipeline document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineDocument {
    pub pipeline: Pipeline,
    pub units: Vec<UnitDescriptor>,
    pub dependencies: Vec<DependencyEdge>,
}

/// One unit as written to the document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDescriptor {
    pub id: String,

    /// Display name at export time
    pub name: String,

    pub parent_unit_id: Option<String>,

    pub position: Position,

    pub policy: ExecutionPolicy,

    /// `type` tag plus `config` block
    #[serde(flatten)]
    pub runner: RunnerConfig,
}

/// Presentation coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Parent → child edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

/// Reference id plus the detail, or a note when the detail is missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigBlock<T> {
    #[serde(deserialize_with = "scalar_reference")]
    pub reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> ConfigBlock<T> {
    /// Block for a loaded detail
    pub fn resolved(reference: impl Into<String>, detail: T) -> Self {
        Self {
            reference: reference.into(),
            detail: Some(detail),
            note: None,
        }
    }

    /// Block for a missing detail
    pub fn unresolved(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            detail: None,
            note: Some(UNRESOLVED_NOTE.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.detail.is_some()
    }
}

/// Reference ids written by hand may come back as numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarReference {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

fn scalar_reference<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ScalarReference::deserialize(deserializer)? {
        ScalarReference::Text(s) => s,
        ScalarReference::Signed(n) => n.to_string(),
        ScalarReference::Unsigned(n) => n.to_string(),
        ScalarReference::Float(n) => n.to_string(),
    })
}

/// Runner-specific configuration, tagged by runner type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "config")]
pub enum RunnerConfig {
    Command(ConfigBlock<Command>),
    QueryQueue(ConfigBlock<QueryQueue>),
    #[serde(rename = "SFTPDownloader")]
    SftpDownloader(ConfigBlock<SftpTransfer>),
    #[serde(rename = "SFTPUploader")]
    SftpUploader(ConfigBlock<SftpTransfer>),
    Zip(ConfigBlock<Zip>),
    Unzip(ConfigBlock<Unzip>),
    CallPipeline(ConfigBlock<PipelineCall>),
}

impl RunnerConfig {
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

    pub fn reference(&self) -> &str {
        match self {
            Self::Command(b) => &b.reference,
            Self::QueryQueue(b) => &b.reference,
            Self::SftpDownloader(b) | Self::SftpUploader(b) => &b.reference,
            Self::Zip(b) => &b.reference,
            Self::Unzip(b) => &b.reference,
            Self::CallPipeline(b) => &b.reference,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Command(b) => b.is_resolved(),
            Self::QueryQueue(b) => b.is_resolved(),
            Self::SftpDownloader(b) | Self::SftpUploader(b) => b.is_resolved(),
            Self::Zip(b) => b.is_resolved(),
            Self::Unzip(b) => b.is_resolved(),
            Self::CallPipeline(b) => b.is_resolved(),
        }
    }

    /// Decode the `config` value for a known runner type
    pub fn decode(runner_type: RunnerType, config: serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
        Ok(match runner_type {
            RunnerType::Command => Self::Command(serde_yaml::from_value(config)?),
            RunnerType::QueryQueue => Self::QueryQueue(serde_yaml::from_value(config)?),
            RunnerType::SftpDownloader => Self::SftpDownloader(serde_yaml::from_value(config)?),
            RunnerType::SftpUploader => Self::SftpUploader(serde_yaml::from_value(config)?),
            RunnerType::Zip => Self::Zip(serde_yaml::from_value(config)?),
            RunnerType::Unzip => Self::Unzip(serde_yaml::from_value(config)?),
            RunnerType::CallPipeline => Self::CallPipeline(serde_yaml::from_value(config)?),
        })
    }

    /// The detail carried by the block, with its id defaulted to the reference
    pub fn into_detail(self) -> Option<OwnedDetail> {
        fn take<T>(block: ConfigBlock<T>, id: impl Fn(&mut T) -> &mut String) -> Option<T> {
            let reference = block.reference;
            block.detail.map(|mut d| {
                let slot = id(&mut d);
                if slot.trim().is_empty() {
                    *slot = reference;
                }
                d
            })
        }

        match self {
            Self::Command(b) => take(b, |d| &mut d.id).map(OwnedDetail::Command),
            Self::QueryQueue(b) => take(b, |d| &mut d.id).map(OwnedDetail::QueryQueue),
            Self::SftpDownloader(b) => take(b, |d| &mut d.id).map(OwnedDetail::SftpDownloader),
            Self::SftpUploader(b) => take(b, |d| &mut d.id).map(OwnedDetail::SftpUploader),
            Self::Zip(b) => take(b, |d| &mut d.id).map(OwnedDetail::Zip),
            Self::Unzip(b) => take(b, |d| &mut d.id).map(OwnedDetail::Unzip),
            Self::CallPipeline(b) => take(b, |d| &mut d.id).map(OwnedDetail::CallPipeline),
        }
    }
}
