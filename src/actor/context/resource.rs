//! Transient object-URL-like resources wrapping compiled module text.
//!
//! Each resource lives exactly as long as the import that created it; the
//! [`ObjectUrl`] guard releases it on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::log;

/// Creation/release counters, shared with the context's handle.
#[derive(Debug, Default)]
pub struct ResourceStats {
    created: AtomicU64,
    released: AtomicU64,
}

impl ResourceStats {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> u64 {
        self.created() - self.released()
    }
}

struct Shared {
    live: Mutex<FxHashSet<u64>>,
    stats: Arc<ResourceStats>,
}

/// Issues resource ids, never reusing one.
pub struct ResourceRegistry {
    next_id: u64,
    shared: Arc<Shared>,
}

impl ResourceRegistry {
    pub fn new(stats: Arc<ResourceStats>) -> Self {
        Self {
            next_id: 0,
            shared: Arc::new(Shared {
                live: Mutex::new(FxHashSet::default()),
                stats,
            }),
        }
    }

    /// Wrap module text in a new resource.
    pub fn create(&mut self, source: String) -> ObjectUrl {
        self.next_id += 1;
        let id = self.next_id;
        self.shared.live.lock().insert(id);
        self.shared.stats.created.fetch_add(1, Ordering::SeqCst);
        ObjectUrl {
            id,
            url: format!("blob:sandbox/{id}"),
            source,
            shared: Arc::clone(&self.shared),
        }
    }

    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.shared.live.lock().len()
    }

    pub fn stats(&self) -> &ResourceStats {
        &self.shared.stats
    }
}

/// A live resource. Dropping it releases it.
pub struct ObjectUrl {
    id: u64,
    url: String,
    source: String,
    shared: Arc<Shared>,
}

impl ObjectUrl {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if self.shared.live.lock().remove(&self.id) {
            self.shared.stats.released.fetch_add(1, Ordering::SeqCst);
        } else {
            log!("context"; "resource {} released twice", self.url);
        }
    }
}
