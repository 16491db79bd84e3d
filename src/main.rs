// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! merlin - pipeline unit inspector and converter
//!
//! Rebuild, validate and convert the unit trees of job pipelines.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merlin::cli::{load_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merlin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    merlin::utils::apply_color_preference();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let config = load_config(cli.config.as_deref())?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Inspect { snapshot } => {
            merlin::cli::inspect::run(snapshot, &config, cli.verbose).await
        }
        Commands::Validate { snapshot } => {
            merlin::cli::validate::run(snapshot, &config, cli.verbose).await
        }
        Commands::Graph { snapshot, format } => {
            merlin::cli::graph::run(snapshot, format, &config).await
        }
        Commands::Export { snapshot, output } => {
            merlin::cli::export::run(snapshot, output, &config).await
        }
        Commands::Import { document, json } => {
            merlin::cli::import::run(document, json, cli.verbose).await
        }
    }
}
