//! Sandbox configuration management for `sandbox.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── context    # [context]
//! │   ├── transform  # [transform]
//! │   └── runner     # [runner]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── handle     # Global config handle
//! └── mod.rs         # SandboxConfig (this file)
//! ```
//!
//! A missing config file is not an error: every section has defaults.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ContextConfig, RunnerConfig, TransformConfig};
pub use types::{ConfigDiagnostics, ConfigError, cfg, init_config, reload_config};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sandbox.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Rendering context settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Transformer worker settings
    #[serde(default)]
    pub transform: TransformConfig,

    /// Python runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl SandboxConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; falls back to defaults
    /// rooted at cwd when none exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.config_path = config_path;
        config.apply_cli(cli);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Join a path with the config root. Absolute paths are kept as-is.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if let Some(limits) = cli.context_args() {
            Self::update_option(&mut self.context.binding_timeout_ms, limits.binding_timeout.as_ref());
            Self::update_option(&mut self.context.render_timeout_ms, limits.render_timeout.as_ref());
            // relative to cwd, not to the config root
            if let Some(library) = &limits.library {
                self.context.library =
                    Some(std::path::absolute(library).unwrap_or_else(|_| library.clone()));
            }
        }
        if let Commands::Exec {
            timeout,
            interpreter,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.runner.timeout_secs, timeout.as_ref());
            Self::update_option(&mut self.runner.interpreter, interpreter.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve relative paths against the config root.
    fn normalize_paths(&mut self) {
        if let Some(library) = self.context.library.take() {
            self.context.library = Some(self.root_join(library));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.context.validate(&mut diag);
        self.transform.validate(&mut diag);
        self.runner.validate(&mut diag);

        diag.into_result().map_err(Into::into)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SandboxConfig {
    let (parsed, ignored) = SandboxConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
