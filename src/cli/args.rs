//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Compile and render untrusted component snippets in an isolated context
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: sandbox.toml)
    #[arg(short = 'C', long, global = true, default_value = "sandbox.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile a component snippet and render it once
    #[command(visible_alias = "r")]
    Render {
        /// Component source (JSX/TSX). Use `-` to read from stdin
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        limits: ContextArgs,
    },

    /// Re-render a component snippet whenever it changes
    #[command(visible_alias = "w")]
    Watch {
        /// Component source (JSX/TSX)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        limits: ContextArgs,
    },

    /// Run a Python snippet and stream its output
    #[command(visible_alias = "x")]
    Exec {
        /// Python source. Use `-` to read from stdin
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Kill the interpreter after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Interpreter to run (default: python3)
        #[arg(short, long)]
        interpreter: Option<String>,

        /// Print runner events as JSON lines instead of raw output
        #[arg(long)]
        json: bool,
    },
}

/// Where the rendered document goes.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the rendered document here instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Context limits that override `[context]`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Milliseconds to wait for React/ReactDOM to be bound
    #[arg(long)]
    pub binding_timeout: Option<u64>,

    /// Milliseconds one render may run before it is interrupted
    #[arg(long)]
    pub render_timeout: Option<u64>,

    /// Rendering library script replacing the embedded one
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub library: Option<PathBuf>,
}

impl Cli {
    /// Context overrides, for the commands that render.
    pub fn context_args(&self) -> Option<&ContextArgs> {
        match &self.command {
            Commands::Render { limits, .. } | Commands::Watch { limits, .. } => Some(limits),
            Commands::Exec { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "artifact-sandbox",
            "render",
            "App.tsx",
            "-o",
            "out.html",
            "--binding-timeout",
            "200",
        ])
        .unwrap();
        let Commands::Render { file, output, limits } = &cli.command else {
            panic!("expected render");
        };
        assert_eq!(file, &PathBuf::from("App.tsx"));
        assert_eq!(output.output.as_deref(), Some(std::path::Path::new("out.html")));
        assert_eq!(limits.binding_timeout, Some(200));
        assert_eq!(cli.config, PathBuf::from("sandbox.toml"));
        assert!(cli.context_args().is_some());
    }

    #[test]
    fn test_parse_exec_global_flags() {
        let cli = Cli::try_parse_from([
            "artifact-sandbox",
            "exec",
            "job.py",
            "--timeout",
            "3",
            "--json",
            "-v",
            "-C",
            "other.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Commands::Exec { timeout: Some(3), json: true, .. }));
        assert!(cli.context_args().is_none());
    }
}
