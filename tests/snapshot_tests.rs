//! Tests for the SnapshotStore and SnapshotScheduler
//!
//! These tests verify:
//! - Dump writes one `key:value` line per entry
//! - Restore reads entries back; missing file means empty
//! - Atomic replacement leaves no temp file behind
//! - Malformed and tombstone lines are skipped and counted
//! - The scheduler ticks, never overlaps, and stops promptly

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lazykv::snapshot::{SnapshotScheduler, SnapshotStore};
use lazykv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store() -> (TempDir, SnapshotStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path().join("snapshot.db"));
    (temp_dir, store)
}

fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn restore_map(store: &SnapshotStore) -> HashMap<String, String> {
    store.restore().unwrap().map(|e| e.unwrap()).collect()
}

// =============================================================================
// Dump / Restore Tests
// =============================================================================

#[test]
fn test_restore_missing_file_is_empty() {
    let (_temp, store) = setup_store();

    let reader = store.restore().unwrap();

    assert!(!reader.exists());
    assert!(restore_map(&store).is_empty());
}

#[test]
fn test_dump_and_restore() {
    let (_temp, store) = setup_store();

    let written = store
        .dump(&entries(&[("a", "1"), ("b", "2"), ("url", "http://x:80")]))
        .unwrap();
    assert_eq!(written, 3);

    let restored = restore_map(&store);
    assert_eq!(restored.len(), 3);
    assert_eq!(restored["a"], "1");
    assert_eq!(restored["b"], "2");
    assert_eq!(restored["url"], "http://x:80");
}

#[test]
fn test_dump_line_format() {
    let (_temp, store) = setup_store();

    store.dump(&entries(&[("k", "v")])).unwrap();

    assert_eq!(fs::read_to_string(store.path()).unwrap(), "k:v\n");
}

#[test]
fn test_dump_replaces_previous_snapshot() {
    let (temp, store) = setup_store();

    store.dump(&entries(&[("old", "1"), ("shared", "1")])).unwrap();
    store.dump(&entries(&[("shared", "2")])).unwrap();

    let restored = restore_map(&store);
    assert_eq!(restored.len(), 1);
    assert_eq!(restored["shared"], "2");

    // Only the snapshot itself remains; the temp file was renamed away
    let files: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_dump_empty_map() {
    let (_temp, store) = setup_store();

    store.dump(&entries(&[("a", "1")])).unwrap();
    assert_eq!(store.dump(&[]).unwrap(), 0);

    assert!(store.path().exists());
    assert!(restore_map(&store).is_empty());
}

#[test]
fn test_dump_with_collects_under_lock() {
    let (_temp, store) = setup_store();

    let written = store
        .dump_with(|| entries(&[("x", "1"), ("y", "2")]))
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(restore_map(&store).len(), 2);
}

#[test]
fn test_dump_into_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path().join("gone").join("snapshot.db"));

    let err = store.dump(&entries(&[("a", "1")])).unwrap_err();

    assert!(matches!(err, KvError::Snapshot(_)));
}

#[test]
fn test_failed_dump_keeps_previous_snapshot() {
    let (temp, store) = setup_store();
    store.dump(&entries(&[("a", "1")])).unwrap();

    // A directory squatting on the temp path makes the next dump fail
    fs::create_dir(temp.path().join("snapshot.db.tmp")).unwrap();
    assert!(store.dump(&entries(&[("b", "2")])).is_err());

    let restored = restore_map(&store);
    assert_eq!(restored.len(), 1);
    assert_eq!(restored["a"], "1");
}

#[test]
fn test_restore_skips_malformed_and_tombstone_lines() {
    let (_temp, store) = setup_store();
    fs::write(store.path(), "a:1\n:bad\ndeleted\n\nb:2\n").unwrap();

    let mut reader = store.restore().unwrap();
    let restored: HashMap<String, String> = reader.by_ref().map(|e| e.unwrap()).collect();

    assert_eq!(restored.len(), 2);
    let stats = reader.stats();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.skipped, 3);
}

#[test]
fn test_restore_unreadable_snapshot_is_an_error() {
    let (_temp, store) = setup_store();
    fs::write(store.path(), b"a:1\n\xff\xff\n").unwrap();

    let result: Result<Vec<_>, _> = store.restore().unwrap().collect();

    assert!(matches!(result, Err(KvError::Snapshot(_))));
}

// =============================================================================
// Scheduler Tests
// =============================================================================

#[test]
fn test_scheduler_runs_periodically() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);

    let mut scheduler = SnapshotScheduler::spawn(Duration::from_millis(10), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(0))
    })
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while ticks.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    scheduler.stop();

    assert!(ticks.load(Ordering::SeqCst) >= 3);
    assert!(!scheduler.is_running());
}

#[test]
fn test_scheduler_stop_is_prompt() {
    let mut scheduler =
        SnapshotScheduler::spawn(Duration::from_secs(3600), || Ok(Some(0))).unwrap();
    assert!(scheduler.is_running());
    assert_eq!(scheduler.interval(), Duration::from_secs(3600));

    let started = Instant::now();
    scheduler.stop();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!scheduler.is_running());
}

#[test]
fn test_scheduler_never_overlaps() {
    let running = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let ticks = Arc::new(AtomicUsize::new(0));
    let (r, m, t) = (Arc::clone(&running), Arc::clone(&max_seen), Arc::clone(&ticks));

    // Each dump takes longer than the interval
    let mut scheduler = SnapshotScheduler::spawn(Duration::from_millis(1), move || {
        let now = r.fetch_add(1, Ordering::SeqCst) + 1;
        m.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        r.fetch_sub(1, Ordering::SeqCst);
        t.fetch_add(1, Ordering::SeqCst);
        Ok(Some(0))
    })
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while ticks.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    scheduler.stop();

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scheduler_survives_task_errors() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);

    let mut scheduler = SnapshotScheduler::spawn(Duration::from_millis(5), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(KvError::Snapshot("disk full".to_string()))
    })
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while ticks.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    scheduler.stop();

    assert!(ticks.load(Ordering::SeqCst) >= 2);
}

#[test]
fn test_try_dump_skips_while_busy() {
    let (_temp, store) = setup_store();
    let store = Arc::new(store);

    let outer = Arc::clone(&store);
    let result = store
        .dump_with(|| {
            // The dump lock is held here, so a concurrent attempt must skip
            let inner = outer.try_dump_with(|| panic!("must not collect while busy"));
            assert!(matches!(inner, Ok(None)));
            entries(&[("a", "1")])
        })
        .unwrap();

    assert_eq!(result, 1);
    assert_eq!(store.try_dump_with(|| entries(&[])).unwrap(), Some(0));
}
