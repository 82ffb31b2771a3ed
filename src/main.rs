//! artifact-sandbox - compile and render untrusted component snippets in an
//! isolated context, and run Python snippets out of process.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod protocol;
mod render;
mod runner;
mod runtime;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{SandboxConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    let shutdown_rx = core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(SandboxConfig::load(cli)?);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        match &cli.command {
            Commands::Render { file, output, .. } => cli::render::render_once(config, file, output).await,
            Commands::Watch { file, output, .. } => cli::watch::watch(cli, file, output, shutdown_rx).await,
            Commands::Exec { file, json, .. } => cli::exec::exec(config, file, *json).await,
        }
    })
}
