// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Validate command - check the unit forest of a snapshot

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::MerlinConfig;
use crate::pipeline::{build_forest, ForestValidator, UnitGraph};

/// Run the validate command
pub async fn run(snapshot_path: PathBuf, config: &MerlinConfig, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let snapshot = match super::load_snapshot(&snapshot_path).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("  {} Failed to load snapshot", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} Snapshot file is valid JSON", "✓".green());

    let forest = build_forest(&snapshot.units);
    let validation = ForestValidator::validate_with(&forest, &config.validation_options());

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        let suffix_len = config.display.label_suffix_len;

        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", snapshot.pipeline.name);
        println!("  Units: {} ({} reachable)", snapshot.units.len(), forest.count_units());
        println!("  Depth: {}", forest.max_depth());

        let graph = UnitGraph::build(&snapshot.units);
        if let Ok(order) = graph.topological_order() {
            for unit in order {
                let parent = unit
                    .parent_id()
                    .map(|p| format!(" [after: {}]", p))
                    .unwrap_or_default();
                println!("    - {}{}", unit.display_name_with(suffix_len), parent.dimmed());
            }
        }
    }

    println!();

    if !validation.is_valid() {
        tracing::info!(errors = validation.errors.len(), "validation failed");
        return Err(miette::miette!("Pipeline validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }

    Ok(())
}
