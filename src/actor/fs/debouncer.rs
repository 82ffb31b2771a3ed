use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 200;
pub(super) const FLUSH_COOLDOWN_MS: u64 = 500;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Pure debouncer: only handles timing and event deduplication.
pub(super) struct Debouncer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    pub(super) last_flush: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_flush: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (editor rename-save)
    /// - Modify + Remove → Remove
    /// - Create + Remove → nothing
    /// - otherwise first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);

            match (self.changes.get(&path).copied(), kind) {
                (None, _) | (Some(ChangeKind::Removed), ChangeKind::Created | ChangeKind::Modified) => {
                    crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                    self.changes.insert(path, kind);
                }
                (Some(ChangeKind::Modified), ChangeKind::Removed) => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (Some(ChangeKind::Created), ChangeKind::Removed) => {
                    self.changes.remove(&path);
                }
                _ => continue,
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the accumulated changes once debounce and cooldown have elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;
        self.last_flush = Some(Instant::now());
        Some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }

        if let Some(last_flush) = self.last_flush
            && last_flush.elapsed() < Duration::from_millis(FLUSH_COOLDOWN_MS)
        {
            return false;
        }

        !self.changes.is_empty()
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining =
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_flush
            .map(|t| Duration::from_millis(FLUSH_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
