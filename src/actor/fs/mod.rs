//! FileSystem Actor
//!
//! Watches the submitted source file (and the config file) for `watch` mode
//! and sends debounced events to the watch loop.
//!
//! ```text
//! Watcher → Debouncer (pure timing) → tracked-path filter → WatchEvent
//! ```
//!
//! Parent directories are watched rather than the files themselves, so
//! rename-on-save editors keep working.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

// Pure timing and deduplication.
mod debouncer;

#[cfg(test)]
mod tests;

use debouncer::{ChangeKind, Debouncer};

/// Debounced change of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    SourceChanged,
    SourceRemoved,
    ConfigChanged,
}

/// FileSystem Actor - watches the tracked files
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    source: PathBuf,
    config: Option<PathBuf>,
    tx: mpsc::Sender<WatchEvent>,
    debouncer: Debouncer,
}

impl FsActor {
    /// Start watching immediately; events buffer until [`FsActor::run`].
    pub fn new(
        source: &Path,
        config: Option<&Path>,
        tx: mpsc::Sender<WatchEvent>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let source = normalize_path(source);
        let config = config.map(normalize_path);

        let mut dirs: Vec<&Path> = std::iter::once(&source)
            .chain(config.as_ref())
            .filter_map(|path| path.parent())
            .collect();
        dirs.dedup();
        for dir in dirs {
            crate::debug!("watch"; "watching {}", dir.display());
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            source,
            config,
            tx,
            debouncer: Debouncer::new(),
        })
    }

    /// Run the actor event loop until the receiving side closes.
    pub async fn run(self) {
        let Self {
            notify_rx,
            _watcher,
            source,
            config,
            tx,
            mut debouncer,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify is sync-only
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    for event in classify(&changes, &source, config.as_deref()) {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Map raw changes to events for the tracked files, ignoring the rest.
fn classify(
    changes: &FxHashMap<PathBuf, ChangeKind>,
    source: &Path,
    config: Option<&Path>,
) -> Vec<WatchEvent> {
    let mut events = Vec::new();

    // Config first: a reload replaces the bridge the source is submitted to.
    if let Some(config) = config
        && changes.get(config).is_some_and(|kind| *kind != ChangeKind::Removed)
    {
        events.push(WatchEvent::ConfigChanged);
    }

    match changes.get(source) {
        Some(ChangeKind::Removed) => events.push(WatchEvent::SourceRemoved),
        Some(_) => events.push(WatchEvent::SourceChanged),
        None => {}
    }
    events
}

/// Absolute path with a canonical parent. Works for files that no longer exist.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let parent = absolute.parent().and_then(|parent| parent.canonicalize().ok());
    match (parent, absolute.file_name()) {
        (Some(parent), Some(name)) => parent.join(name),
        _ => absolute.clone(),
    }
}
