//! Markweave CLI
//!
//! Renders Markdown files through the plugin pipeline.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

use markweave_core::{Markweave, RenderConfig};

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(has_failures) => {
            if has_failures {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether any input failed.
fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Render {
            files,
            format,
            spans,
        } => commands::render::run_render(&load_pipeline(cli)?, files, *format, *spans),
        Commands::Ast { file } => commands::ast::run_ast(&load_pipeline(cli)?, file).map(|_| false),
        Commands::Init { force } => commands::init::run_init(*force).map(|_| false),
    }
}

/// Builds the pipeline from `--config`, a discovered config file, or the
/// defaults.
fn load_pipeline(cli: &Cli) -> Result<Markweave> {
    let config = match &cli.config {
        Some(path) => RenderConfig::from_file(path).into_diagnostic()?,
        None => {
            let cwd = std::env::current_dir().into_diagnostic()?;
            match RenderConfig::discover(&cwd) {
                Some(path) => {
                    tracing::debug!("Using config {}", path.display());
                    RenderConfig::from_file(path).into_diagnostic()?
                }
                None => RenderConfig::new(),
            }
        }
    };

    Markweave::builder()
        .with_config(&config)
        .into_diagnostic()?
        .build()
        .into_diagnostic()
}
