use std::path::{Path, PathBuf};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::debouncer::{ChangeKind, DEBOUNCE_MS, Debouncer, FLUSH_COOLDOWN_MS};
use super::{FsActor, WatchEvent, classify, normalize_path};

fn make_event(paths: &[&Path], kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.iter().map(|p| p.to_path_buf()).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn tmp(name: &str) -> PathBuf {
    normalize_path(&std::env::temp_dir().join(name))
}

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
    assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
}

#[test]
fn test_event_dedup_rules() {
    let mut debouncer = Debouncer::new();
    let saved = tmp("saved.tsx");
    let deleted = tmp("deleted.tsx");
    let flicker = tmp("flicker.tsx");

    // rename-save: remove then create
    debouncer.add_event(&make_event(&[&saved], remove_kind()));
    debouncer.add_event(&make_event(&[&saved], create_kind()));
    debouncer.add_event(&make_event(&[&deleted], modify_kind()));
    debouncer.add_event(&make_event(&[&deleted], remove_kind()));
    debouncer.add_event(&make_event(&[&flicker], create_kind()));
    debouncer.add_event(&make_event(&[&flicker], remove_kind()));

    assert_eq!(debouncer.changes.len(), 2);
    assert_eq!(debouncer.changes[&saved], ChangeKind::Created);
    assert_eq!(debouncer.changes[&deleted], ChangeKind::Removed);
}

#[test]
fn test_temp_files_and_metadata_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(&[&tmp(".artifact.tsx.swp")], modify_kind()));
    debouncer.add_event(&make_event(&[&tmp("artifact.tsx~")], create_kind()));
    debouncer.add_event(&make_event(
        &[&tmp("artifact.tsx")],
        notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
            notify::event::MetadataKind::WriteTime,
        )),
    ));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_ready_after_debounce_and_cooldown() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(&[&tmp("a.tsx")], modify_kind()));
    assert!(!debouncer.is_ready());

    std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 20));
    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);

    debouncer.add_event(&make_event(&[&tmp("a.tsx")], modify_kind()));
    std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 20));
    // still cooling down from the previous flush
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() <= Duration::from_millis(FLUSH_COOLDOWN_MS));
}

#[test]
fn test_classify_tracked_paths_only() {
    let source = tmp("artifact.tsx");
    let config = tmp("sandbox.toml");
    let mut changes = FxHashMap::default();
    changes.insert(source.clone(), ChangeKind::Modified);
    changes.insert(config.clone(), ChangeKind::Created);
    changes.insert(tmp("unrelated.tsx"), ChangeKind::Modified);

    assert_eq!(
        classify(&changes, &source, Some(&config)),
        vec![WatchEvent::ConfigChanged, WatchEvent::SourceChanged]
    );

    changes.insert(source.clone(), ChangeKind::Removed);
    changes.insert(config.clone(), ChangeKind::Removed);
    assert_eq!(
        classify(&changes, &source, Some(&config)),
        vec![WatchEvent::SourceRemoved]
    );
    assert!(classify(&FxHashMap::default(), &source, None).is_empty());
}

#[test]
fn test_normalize_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("not-yet.tsx");
    let normalized = normalize_path(&path);
    assert!(normalized.is_absolute());
    assert_eq!(normalized.file_name(), path.file_name());
    assert_eq!(normalized.parent().unwrap(), dir.path().canonicalize().unwrap());
}

#[tokio::test]
async fn test_actor_reports_source_write() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("artifact.tsx");
    std::fs::write(&source, "export default () => null;").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(&source, None, tx).unwrap();
    let task = tokio::spawn(actor.run());

    std::fs::write(&source, "export default () => <p>changed</p>;").unwrap();
    let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no watch event");
    assert_eq!(event, Some(WatchEvent::SourceChanged));

    drop(rx);
    task.abort();
}
