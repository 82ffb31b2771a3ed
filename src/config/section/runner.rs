//! `[runner]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [runner]
//! interpreter = "python3"
//! batch_lines = 32          # Flush output after this many lines
//! batch_interval_ms = 50    # ...or after this long
//! timeout_secs = 30         # Kill the process after this long
//! ```

use crate::config::ConfigDiagnostics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Python runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub interpreter: String,
    pub batch_lines: usize,
    pub batch_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".into(),
            batch_lines: 32,
            batch_interval_ms: 50,
            timeout_secs: 30,
        }
    }
}

impl RunnerConfig {
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.interpreter.trim().is_empty() {
            diag.error("runner.interpreter", "must not be empty");
        }
        if self.batch_lines == 0 {
            diag.error("runner.batch_lines", "must be greater than 0");
        }
        if self.batch_interval_ms == 0 {
            diag.error("runner.batch_interval_ms", "must be greater than 0");
        }
        if self.timeout_secs == 0 {
            diag.error("runner.timeout_secs", "must be greater than 0");
        }
    }
}
