// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Pipeline definitions and the unit model
//!
//! Flat unit records, runner resolution, the parent/child forest rebuilt
//! from them, and the checks and queries that run over it.

mod definition;
mod forest;
mod graph;
mod runner;
mod search;
mod validation;

pub use definition::*;
pub use forest::{build_forest, count_units, max_depth, UnitChain, UnitForest};
pub use graph::UnitGraph;
pub use runner::{resolve_runner_type, RunnerDetail, RunnerRef, RunnerType};
pub use search::{find_by_runner_type, runner_type_histogram};
pub use validation::{
    validate, ForestValidator, UnresolvedDetailPolicy, ValidationOptions, ValidationResult,
};
