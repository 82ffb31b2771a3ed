//! `[context]` section configuration.
//!
//! Settings for the isolated rendering context.
//!
//! # Example
//!
//! ```toml
//! [context]
//! ready_delay_ms = 50          # Delay before INIT_COMPLETE is announced
//! binding_poll_interval_ms = 10
//! binding_timeout_ms = 3000    # Give up waiting for React/ReactDOM
//! render_timeout_ms = 1000     # Interrupt runaway components
//! memory_limit_mb = 64
//! max_stack_kb = 1024
//! suspense_retries = 8
//! library = "vendor/react.js"  # Replace the embedded rendering library
//! title = "artifact"
//! ```

use crate::config::ConfigDiagnostics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Rendering context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Milliseconds between context creation and `INIT_COMPLETE`.
    pub ready_delay_ms: u64,

    /// Interval of the rendering-library binding poll.
    pub binding_poll_interval_ms: u64,

    /// Upper bound of the binding poll.
    pub binding_timeout_ms: u64,

    /// Deadline for one import-and-render pass.
    pub render_timeout_ms: u64,

    /// QuickJS heap limit.
    pub memory_limit_mb: usize,

    /// QuickJS stack limit.
    pub max_stack_kb: usize,

    /// How many times a suspended subtree is retried before giving up.
    pub suspense_retries: u32,

    /// Script evaluated instead of the embedded rendering library.
    /// Must install `React` and `ReactDOM` on `globalThis`.
    pub library: Option<PathBuf>,

    /// `<title>` of the rendered document.
    pub title: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ready_delay_ms: 50,
            binding_poll_interval_ms: 10,
            binding_timeout_ms: 3000,
            render_timeout_ms: 1000,
            memory_limit_mb: 64,
            max_stack_kb: 1024,
            suspense_retries: 8,
            library: None,
            title: "artifact".into(),
        }
    }
}

impl ContextConfig {
    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }

    pub fn binding_poll_interval(&self) -> Duration {
        Duration::from_millis(self.binding_poll_interval_ms)
    }

    pub fn binding_timeout(&self) -> Duration {
        Duration::from_millis(self.binding_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.binding_poll_interval_ms == 0 {
            diag.error("context.binding_poll_interval_ms", "must be greater than 0");
        } else if self.binding_poll_interval_ms > self.binding_timeout_ms {
            diag.error_with_hint(
                "context.binding_poll_interval_ms",
                "poll interval exceeds binding_timeout_ms",
                "lower the interval or raise the timeout",
            );
        }
        if self.render_timeout_ms == 0 {
            diag.error("context.render_timeout_ms", "must be greater than 0");
        }
        if self.memory_limit_mb == 0 {
            diag.error("context.memory_limit_mb", "must be greater than 0");
        }
        if self.max_stack_kb < 64 {
            diag.error_with_hint(
                "context.max_stack_kb",
                format!("{} KiB is too small to run the rendering library", self.max_stack_kb),
                "use at least 64",
            );
        }
        if let Some(library) = &self.library
            && !library.is_file()
        {
            diag.error(
                "context.library",
                format!("`{}` does not exist", library.display()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_context_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.context.ready_delay_ms, 50);
        assert_eq!(config.context.binding_timeout_ms, 3000);
        assert_eq!(config.context.suspense_retries, 8);
        assert!(config.context.library.is_none());
        assert_eq!(config.context.title, "artifact");
    }

    #[test]
    fn test_context_overrides() {
        let config = test_parse_config(
            "[context]\nbinding_timeout_ms = 250\nrender_timeout_ms = 20\ntitle = \"demo\"",
        );
        assert_eq!(config.context.binding_timeout().as_millis(), 250);
        assert_eq!(config.context.render_timeout().as_millis(), 20);
        assert_eq!(config.context.title, "demo");
        // untouched fields keep their defaults
        assert_eq!(config.context.binding_poll_interval_ms, 10);
    }

    #[test]
    fn test_context_validate() {
        let config = test_parse_config(
            "[context]\nbinding_poll_interval_ms = 0\nmax_stack_kb = 8\nlibrary = \"/no/such/react.js\"",
        );
        let mut diag = ConfigDiagnostics::new();
        config.context.validate(&mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            ["context.binding_poll_interval_ms", "context.max_stack_kb", "context.library"]
        );
    }
}
