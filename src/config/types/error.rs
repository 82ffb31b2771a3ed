//! Configuration error types.

use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn `sandbox.toml` into a usable [`SandboxConfig`].
///
/// [`SandboxConfig`]: crate::config::SandboxConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("sandbox.toml is not valid TOML")]
    Toml(#[from] toml::de::Error),

    // no #[source]: the diagnostics already print themselves in full
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One rejected field, addressed as `section.field`.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: &'static str,
    pub message: String,
    pub hint: Option<String>,
}

impl ConfigDiagnostic {
    /// `("context", "binding_timeout_ms")` for `context.binding_timeout_ms`.
    pub fn split(&self) -> (&'static str, &'static str) {
        self.field.split_once('.').unwrap_or(("", self.field))
    }
}

/// Validation errors collected across all sections before failing.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.push(field, message.into(), None);
    }

    pub fn error_with_hint(
        &mut self,
        field: &'static str,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(field, message.into(), Some(hint.into()));
    }

    fn push(&mut self, field: &'static str, message: String, hint: Option<String>) {
        self.errors.push(ConfigDiagnostic { field, message, hint });
    }

    #[cfg(test)]
    pub fn errors(&self) -> &[ConfigDiagnostic] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Diagnostics(self))
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    /// ```text
    /// invalid sandbox.toml (2 errors)
    ///
    /// [context]
    ///   binding_timeout_ms → must be greater than 0
    /// [runner]
    ///   batch_lines → must be greater than 0
    ///     hint: ...
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let noun = if count == 1 { "error" } else { "errors" };
        write!(f, "{} ({count} {noun})", "invalid sandbox.toml".red().bold())?;

        let mut section = None;
        for err in &self.errors {
            let (name, field) = err.split();
            if section != Some(name) {
                section = Some(name);
                write!(f, "\n\n{}", format!("[{name}]").cyan())?;
            }
            write!(f, "\n  {} {} {}", field, "→".red(), err.message)?;
            if let Some(hint) = &err.hint {
                write!(f, "\n    {} {hint}", "hint:".yellow())?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
