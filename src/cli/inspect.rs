// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Inspect command - print the unit tree of a snapshot

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::MerlinConfig;
use crate::pipeline::{build_forest, runner_type_histogram, PipelineUnit};
use crate::utils::{print_header, print_section, print_warning};

/// Run the inspect command
pub async fn run(snapshot_path: PathBuf, config: &MerlinConfig, verbose: bool) -> Result<()> {
    let snapshot = super::load_snapshot(&snapshot_path).await?;
    let suffix_len = config.display.label_suffix_len;

    let forest = build_forest(&snapshot.units);

    print_header(&format!("Pipeline: {}", snapshot.pipeline.name));
    if let Some(description) = &snapshot.pipeline.description {
        println!("{}", description.dimmed());
    }

    print_section("Units");
    for (depth, unit) in forest.walk() {
        println!("{}{}", "  ".repeat(depth + 1), unit_line(unit, suffix_len, verbose));
    }

    let unreachable = forest.unreachable();
    if !unreachable.is_empty() {
        print_section("Unreachable");
        for unit in &unreachable {
            print_warning(&unit_line(unit, suffix_len, verbose));
        }
    }

    print_section("Summary");
    println!("  Units in forest: {}", forest.count_units());
    println!("  Total units:     {}", snapshot.units.len());
    println!("  Roots:           {}", forest.roots().count());
    println!("  Max depth:       {}", forest.max_depth());

    print_section("Runner types");
    for (runner_type, count) in runner_type_histogram(&snapshot.units) {
        println!("  {:<16} {}", runner_type.as_str(), count);
    }

    Ok(())
}

fn unit_line(unit: &PipelineUnit, suffix_len: usize, verbose: bool) -> String {
    let kind = match unit.runner_type() {
        Ok(t) => t.as_str().cyan(),
        Err(_) => "unresolved".red(),
    };

    let mut line = format!("{} ({})", unit.display_name_with(suffix_len).bold(), kind);
    if unit.detail().is_none() {
        line.push_str(&format!(" {}", "[detail not loaded]".dimmed()));
    }
    if verbose {
        line.push_str(&format!(" {}", unit.id.dimmed()));
    }
    line
}
