// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Pipeline documents
//!
//! Converts a pipeline and its flat unit list to a human-editable YAML
//! document and back.

mod export;
mod import;
mod schema;

pub use export::{build_document, to_text, to_text_with, ExportOptions};
pub use import::from_text;
pub use schema::{
    ConfigBlock, DependencyEdge, PipelineDocument, Position, RunnerConfig, UnitDescriptor,
    UNRESOLVED_NOTE,
};
