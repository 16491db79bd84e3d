// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! # merlin - pipeline unit model
//!
//! A job pipeline is stored as a flat list of units, each pointing at its
//! parent and at exactly one runner (command, query queue, SFTP transfer,
//! zip, unzip or a nested pipeline call). `merlin` turns that list back
//! into its execution forest and converts whole pipelines to and from a
//! portable YAML document.
//!
//! ## Features
//!
//! - **Runner resolution** - Strict: a unit with zero or several runner references is an error
//! - **Forest building** - Roots, ordered children, unit count and depth in linear time
//! - **Validation** - Structural and policy problems collected, never thrown
//! - **YAML conversion** - `to_text` / `from_text` with all-or-nothing import
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the unit tree of a snapshot
//! merlin inspect nightly.json
//!
//! # Export it as YAML and read it back
//! merlin export nightly.json -o nightly.yaml
//! merlin import nightly.yaml --json
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod errors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use errors::{MerlinError, MerlinResult};
pub use pipeline::{Pipeline, PipelineUnit, RunnerType, Snapshot, UnitForest};

// Re-export the converter
pub use document::{from_text, to_text};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
