//! Process-wide config with hash-gated reload.
//!
//! Readers take an `Arc` snapshot through [`cfg`]; `watch` swaps in a new
//! config when `sandbox.toml` changes. Components hold the snapshot they
//! were spawned with, so a reload only reaches new bridges.

use crate::cli::Cli;
use crate::config::SandboxConfig;
use crate::core::ContentHash;
use anyhow::Result;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

pub static CONFIG: LazyLock<ArcSwap<SandboxConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SandboxConfig::default()));

/// Hash of the file the current config came from. `None` for defaults.
static LOADED_FROM: Mutex<Option<ContentHash>> = Mutex::new(None);

#[inline]
pub fn cfg() -> Arc<SandboxConfig> {
    CONFIG.load_full()
}

pub fn init_config(config: SandboxConfig) -> Arc<SandboxConfig> {
    *LOADED_FROM.lock() = file_hash(&config.config_path);

    let config = Arc::new(config);
    CONFIG.store(Arc::clone(&config));
    config
}

/// Re-read `sandbox.toml`. `Ok(true)` if a different config is now active.
///
/// Saving the file without changing it, or a missing file, keeps the
/// current config. A config that fails to load or validate is an error and
/// also keeps the current one.
pub fn reload_config(cli: &Cli) -> Result<bool> {
    let current = cfg();
    let Some(hash) = file_hash(&current.config_path) else {
        return Ok(false);
    };
    if *LOADED_FROM.lock() == Some(hash) {
        return Ok(false);
    }

    CONFIG.store(Arc::new(SandboxConfig::load(cli)?));
    *LOADED_FROM.lock() = Some(hash);
    Ok(true)
}

fn file_hash(path: &Path) -> Option<ContentHash> {
    fs::read_to_string(path).ok().map(|content| ContentHash::of(&content))
}
