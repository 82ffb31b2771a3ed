//! `[transform]` section configuration.
//!
//! Settings for the transformer worker.
//!
//! # Example
//!
//! ```toml
//! [transform]
//! cache_capacity = 256                # Compiled modules kept in memory
//! cache_ttl_secs = 600                # Optional expiry
//! pragma = "React.createElement"
//! pragma_frag = "React.Fragment"
//! typescript = true                   # Accept TSX input
//! react_global = "React"
//! dom_global = "ReactDOM"
//! ```

use crate::config::ConfigDiagnostics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transformer worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Maximum number of compiled modules in the cache.
    pub cache_capacity: u64,

    /// Time-to-live of a cache entry. `None` keeps entries until evicted.
    pub cache_ttl_secs: Option<u64>,

    /// JSX element factory.
    pub pragma: String,

    /// JSX fragment factory.
    pub pragma_frag: String,

    /// Parse sources as TSX instead of JSX.
    pub typescript: bool,

    /// Global that `react` imports are rewritten to.
    pub react_global: String,

    /// Global that `react-dom` imports are rewritten to.
    pub dom_global: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            cache_ttl_secs: None,
            pragma: "React.createElement".into(),
            pragma_frag: "React.Fragment".into(),
            typescript: true,
            react_global: "React".into(),
            dom_global: "ReactDOM".into(),
        }
    }
}

impl TransformConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.cache_capacity == 0 {
            diag.error_with_hint(
                "transform.cache_capacity",
                "must be greater than 0",
                "identical sources are expected to hit the cache",
            );
        }
        if self.cache_ttl_secs == Some(0) {
            diag.error("transform.cache_ttl_secs", "must be greater than 0 when set");
        }
        for (field, value) in [
            ("transform.pragma", &self.pragma),
            ("transform.pragma_frag", &self.pragma_frag),
        ] {
            if value.trim().is_empty() {
                diag.error(field, "must not be empty");
            }
        }
        for (field, value) in [
            ("transform.react_global", &self.react_global),
            ("transform.dom_global", &self.dom_global),
        ] {
            if !is_identifier(value) {
                diag.error(field, format!("`{value}` is not a valid JavaScript identifier"));
            }
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::is_identifier;
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_transform_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.transform.cache_capacity, 256);
        assert!(config.transform.cache_ttl().is_none());
        assert_eq!(config.transform.pragma, "React.createElement");
        assert!(config.transform.typescript);
    }

    #[test]
    fn test_transform_validate() {
        let config = test_parse_config(
            "[transform]\ncache_capacity = 0\npragma = \" \"\nreact_global = \"1React\"",
        );
        let mut diag = ConfigDiagnostics::new();
        config.transform.validate(&mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            ["transform.cache_capacity", "transform.pragma", "transform.react_global"]
        );
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("React"));
        assert!(is_identifier("$r_1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }
}
