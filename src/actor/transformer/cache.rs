//! Bounded module cache keyed by source content hash.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;

use crate::config::TransformConfig;
use crate::core::ContentHash;

/// Compiled module text by source hash.
#[derive(Clone)]
pub struct ModuleCache {
    inner: Cache<ContentHash, Arc<str>>,
}

impl ModuleCache {
    pub fn new(config: &TransformConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.cache_capacity);
        if let Some(ttl) = config.cache_ttl() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    pub fn get(&self, key: &ContentHash) -> Option<Arc<str>> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: ContentHash, module: Arc<str>) {
        self.inner.insert(key, module);
    }

    /// Entry count after pending evictions have been applied.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

/// Worker counters, shared with whoever holds the worker's handle.
#[derive(Debug, Default)]
pub struct TransformStats {
    hits: AtomicU64,
    misses: AtomicU64,
    compilations: AtomicU64,
    failures: AtomicU64,
    entries: AtomicU64,
}

/// Point-in-time copy of [`TransformStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub compilations: u64,
    pub failures: u64,
    pub entries: u64,
}

impl TransformStats {
    pub(super) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn compiled(&self) {
        self.compilations.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn set_entries(&self, entries: u64) {
        self.entries.store(entries, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries: self.entries.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} hits, {} misses, {} compiled, {} failed, {} cached",
            self.hits, self.misses, self.compilations, self.failures, self.entries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_same_key() {
        let cache = ModuleCache::new(&TransformConfig::default());
        cache.insert(ContentHash::of("a"), Arc::from("compiled a"));
        assert_eq!(cache.get(&ContentHash::of("a")).as_deref(), Some("compiled a"));
        assert!(cache.get(&ContentHash::of("a ")).is_none());
    }

    #[test]
    fn test_cache_is_bounded() {
        let config = TransformConfig {
            cache_capacity: 4,
            ..TransformConfig::default()
        };
        let cache = ModuleCache::new(&config);
        for i in 0..64 {
            let source = format!("source {i}");
            cache.insert(ContentHash::of(&source), Arc::from(source.as_str()));
        }
        assert!(cache.entry_count() <= 4);
    }
}
