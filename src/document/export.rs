// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Pipeline → YAML export

use crate::document::schema::{
    ConfigBlock, DependencyEdge, PipelineDocument, Position, RunnerConfig, UnitDescriptor,
};
use crate::errors::MerlinResult;
use crate::pipeline::{Pipeline, PipelineUnit, RunnerDetail, RunnerType, DEFAULT_LABEL_SUFFIX_LEN};

/// Options for building an export document
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Trailing id characters in synthesized unit names
    pub label_suffix_len: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            label_suffix_len: DEFAULT_LABEL_SUFFIX_LEN,
        }
    }
}

/// Build the document for a pipeline and its units
///
/// Fails only when a unit's runner cannot be resolved; a missing detail
/// degrades to a reference-only config block. A pipeline without an
/// `agentId` still exports, but the document will not import back.
pub fn build_document(
    pipeline: &Pipeline,
    units: &[PipelineUnit],
    options: &ExportOptions,
) -> MerlinResult<PipelineDocument> {
    if crate::pipeline::non_blank(pipeline.agent_id.as_deref()).is_none() {
        tracing::warn!(
            pipeline = %pipeline.name,
            "exporting pipeline without agentId; the document cannot be imported"
        );
    }

    let mut descriptors = Vec::with_capacity(units.len());
    let mut dependencies = Vec::new();

    for unit in units {
        let runner = runner_config(unit)?;
        if !runner.is_resolved() {
            tracing::debug!(unit = %unit.id, "exporting unit without runner detail");
        }

        let parent = unit.parent_id().map(String::from);
        if let Some(from) = &parent {
            dependencies.push(DependencyEdge {
                from: from.clone(),
                to: unit.id.clone(),
            });
        }

        descriptors.push(UnitDescriptor {
            id: unit.id.clone(),
            name: unit.display_name_with(options.label_suffix_len),
            parent_unit_id: parent,
            position: Position {
                x: unit.pos_x,
                y: unit.pos_y,
            },
            policy: unit.policy,
            runner,
        });
    }

    Ok(PipelineDocument {
        pipeline: pipeline.clone(),
        units: descriptors,
        dependencies,
    })
}

fn runner_config(unit: &PipelineUnit) -> MerlinResult<RunnerConfig> {
    let runner = unit.runner()?;
    let reference = runner.reference_id();

    let config = match (runner.runner_type(), unit.detail()) {
        (_, Some(RunnerDetail::Command(d))) => RunnerConfig::Command(ConfigBlock::resolved(reference, d.clone())),
        (_, Some(RunnerDetail::QueryQueue(d))) => {
            let mut queue = d.clone();
            queue.statements.sort_by_key(|s| s.order);
            RunnerConfig::QueryQueue(ConfigBlock::resolved(reference, queue))
        }
        (_, Some(RunnerDetail::SftpDownloader(d))) => {
            RunnerConfig::SftpDownloader(ConfigBlock::resolved(reference, d.clone()))
        }
        (_, Some(RunnerDetail::SftpUploader(d))) => {
            RunnerConfig::SftpUploader(ConfigBlock::resolved(reference, d.clone()))
        }
        (_, Some(RunnerDetail::Zip(d))) => RunnerConfig::Zip(ConfigBlock::resolved(reference, d.clone())),
        (_, Some(RunnerDetail::Unzip(d))) => RunnerConfig::Unzip(ConfigBlock::resolved(reference, d.clone())),
        (_, Some(RunnerDetail::CallPipeline(d))) => {
            RunnerConfig::CallPipeline(ConfigBlock::resolved(reference, d.clone()))
        }
        (RunnerType::Command, None) => RunnerConfig::Command(ConfigBlock::unresolved(reference)),
        (RunnerType::QueryQueue, None) => RunnerConfig::QueryQueue(ConfigBlock::unresolved(reference)),
        (RunnerType::SftpDownloader, None) => RunnerConfig::SftpDownloader(ConfigBlock::unresolved(reference)),
        (RunnerType::SftpUploader, None) => RunnerConfig::SftpUploader(ConfigBlock::unresolved(reference)),
        (RunnerType::Zip, None) => RunnerConfig::Zip(ConfigBlock::unresolved(reference)),
        (RunnerType::Unzip, None) => RunnerConfig::Unzip(ConfigBlock::unresolved(reference)),
        (RunnerType::CallPipeline, None) => RunnerConfig::CallPipeline(ConfigBlock::unresolved(reference)),
    };

    Ok(config)
}

/// Serialize a pipeline and its units to YAML
pub fn to_text(pipeline: &Pipeline, units: &[PipelineUnit]) -> MerlinResult<String> {
    to_text_with(pipeline, units, &ExportOptions::default())
}

/// Serialize a pipeline and its units to YAML with explicit options
pub fn to_text_with(
    pipeline: &Pipeline,
    units: &[PipelineUnit],
    options: &ExportOptions,
) -> MerlinResult<String> {
    let document = build_document(pipeline, units, options)?;
    let text = serde_yaml::to_string(&document)?;

    tracing::debug!(
        pipeline = %pipeline.name,
        units = document.units.len(),
        edges = document.dependencies.len(),
        "exported pipeline document"
    );

    Ok(text)
}
