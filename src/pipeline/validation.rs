// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Forest validation
//!
//! Checks a unit forest for structural and policy problems. Validation never
//! fails; every problem is collected into a [`ValidationResult`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineUnit, UnitForest, UnitGraph};

/// How a unit without a loaded runner detail is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedDetailPolicy {
    /// Not reported
    Ignore,
    /// Reported as a warning (default)
    #[default]
    Warn,
    /// Reported as an error
    Error,
}

/// Options for forest validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    pub unresolved_detail: UnresolvedDetailPolicy,
}

/// Forest validator
pub struct ForestValidator;

impl ForestValidator {
    /// Validate with default options
    pub fn validate(forest: &UnitForest<'_>) -> ValidationResult {
        Self::validate_with(forest, &ValidationOptions::default())
    }

    /// Validate every unit of the forest, reachable or not
    pub fn validate_with(forest: &UnitForest<'_>, options: &ValidationOptions) -> ValidationResult {
        let mut result = ValidationResult::new();

        if forest.is_empty() {
            result.add_error("Pipeline must have at least one root unit");
        }

        // Check for duplicate unit ids
        let mut seen_ids = HashSet::new();
        for unit in forest.units() {
            if !seen_ids.insert(unit.id.as_str()) {
                result.add_error(&format!("Duplicate unit id: '{}'", unit.id));
            }
        }

        for unit in forest.units() {
            Self::validate_unit(unit, options, &mut result);
        }

        Self::validate_reachability(forest, &mut result);

        tracing::debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated unit forest"
        );

        result
    }

    /// Validate a single unit's runner reference and execution policy
    fn validate_unit(unit: &PipelineUnit, options: &ValidationOptions, result: &mut ValidationResult) {
        match unit.runner_type() {
            Ok(runner_type) => {
                if unit.detail().is_none() {
                    let message = format!(
                        "Unit '{}': {} detail '{}' is not loaded",
                        unit.id,
                        runner_type,
                        unit.reference(runner_type).unwrap_or_default()
                    );
                    match options.unresolved_detail {
                        UnresolvedDetailPolicy::Ignore => {}
                        UnresolvedDetailPolicy::Warn => result.add_warning(&message),
                        UnresolvedDetailPolicy::Error => result.add_error(&message),
                    }
                }
            }
            Err(e) => result.add_error(&e.to_string()),
        }

        let policy = &unit.policy;
        if policy.retry_count < 0 {
            result.add_error(&format!(
                "Unit '{}': retryCount must be >= 0 (got {})",
                unit.id, policy.retry_count
            ));
        }
        if policy.retry_after_milliseconds < 0 {
            result.add_error(&format!(
                "Unit '{}': retryAfterMilliseconds must be >= 0 (got {})",
                unit.id, policy.retry_after_milliseconds
            ));
        }
        if policy.timeout_milliseconds <= 0 {
            result.add_error(&format!(
                "Unit '{}': timeoutMilliseconds must be > 0 (got {})",
                unit.id, policy.timeout_milliseconds
            ));
        }
    }

    /// Report units no root reaches
    ///
    /// Each one is on a parent cycle, names an unknown parent, or sits below
    /// an ancestor that does either.
    fn validate_reachability(forest: &UnitForest<'_>, result: &mut ValidationResult) {
        let unreachable = forest.unreachable();
        if unreachable.is_empty() {
            return;
        }

        let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
        for unit in forest.units() {
            parents.entry(unit.id.as_str()).or_insert(unit.parent_id());
        }

        let on_cycle: HashSet<String> = UnitGraph::build(forest.units())
            .cycles()
            .into_iter()
            .flatten()
            .collect();

        for unit in unreachable {
            if on_cycle.contains(&unit.id) {
                result.add_error(&format!(
                    "Unit '{}' is part of a parent cycle and is not reachable from any root",
                    unit.id
                ));
                continue;
            }

            let parent = unit.parent_id().unwrap_or_default();
            if !parents.contains_key(parent) {
                result.add_error(&format!(
                    "Unit '{}' references unknown parent unit '{}'",
                    unit.id, parent
                ));
                continue;
            }

            match Self::stranding_ancestor(parent, &parents, &on_cycle) {
                Some((ancestor, true)) => result.add_error(&format!(
                    "Unit '{}' is not reachable from any root (ancestor '{}' is on a parent cycle)",
                    unit.id, ancestor
                )),
                Some((ancestor, false)) => result.add_error(&format!(
                    "Unit '{}' is not reachable from any root (ancestor '{}' is orphaned)",
                    unit.id, ancestor
                )),
                None => result.add_error(&format!(
                    "Unit '{}' is not reachable from any root",
                    unit.id
                )),
            }
        }
    }

    /// First ancestor that is on a cycle (`true`) or names an unknown parent (`false`)
    fn stranding_ancestor<'u>(
        start: &'u str,
        parents: &HashMap<&'u str, Option<&'u str>>,
        on_cycle: &HashSet<String>,
    ) -> Option<(&'u str, bool)> {
        let mut current = start;

        // Bounded by the unit count; every chain ends at a root, an orphan or a cycle.
        for _ in 0..=parents.len() {
            if on_cycle.contains(current) {
                return Some((current, true));
            }
            match parents.get(current).copied().flatten() {
                None => return None,
                Some(next) if !parents.contains_key(next) => return Some((current, false)),
                Some(next) => current = next,
            }
        }

        None
    }
}

/// Validate a forest with default options
pub fn validate(forest: &UnitForest<'_>) -> ValidationResult {
    ForestValidator::validate(forest)
}

/// Result of forest validation
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
