//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Own the authoritative in-memory map
//! - Make every mutation durable in the WAL before it becomes visible
//! - Keep the recency cache in step with the map
//! - Restore state on startup and snapshot it periodically

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, RecencyCache};
use crate::codec::{validate_key, validate_value, Record};
use crate::config::Config;
use crate::error::{KvError, Result};
use crate::snapshot::{SnapshotScheduler, SnapshotStore};
use crate::wal::{RecoveryResult, WalRecovery, WalWriter};

/// A stored key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

/// What startup found on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Entries seeded from the snapshot
    pub snapshot_entries: u64,

    /// Malformed snapshot lines skipped
    pub snapshot_skipped: u64,

    /// WAL replay outcome
    pub wal: RecoveryResult,

    /// Live keys after recovery
    pub keys: usize,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete): exclusive `map` write lock
///   - WAL append happens while the write lock is held, so the WAL order is
///     the order in which mutations become visible
///   - Lock order: map → wal → cache
///
/// - **Reads** (get):
///   - Cache hit: cache lock only, never touches the map lock
///   - Cache miss: shared `map` read lock; the cache is refilled before the
///     read lock is released so a concurrent writer cannot be overwritten by
///     a stale refill
///
/// - **Snapshots**: map read lock only while copying entries; the file write
///   happens after the lock is released
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// State shared with the background snapshot thread
    shared: Arc<Shared>,

    /// Periodic snapshot task (None when disabled or after close)
    scheduler: Mutex<Option<SnapshotScheduler>>,

    /// Startup recovery statistics
    recovery: RecoveryReport,
}

struct Shared {
    /// Authoritative key → value map
    map: RwLock<HashMap<String, String>>,

    /// Write-ahead log (None once closed)
    wal: Mutex<Option<WalWriter>>,

    /// Read accelerator (internal lock)
    cache: RecencyCache,

    /// Snapshot file (internal dump lock)
    snapshots: SnapshotStore,

    /// Set once by `close`
    closed: AtomicBool,
}

impl Shared {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::Closed);
        }
        Ok(())
    }

    fn copy_entries(&self) -> Vec<(String, String)> {
        let map = self.map.read();
        map.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn snapshot(&self) -> Result<usize> {
        self.snapshots.dump_with(|| self.copy_entries())
    }

    /// Tick of the background task: skip when closed or already dumping
    fn scheduled_snapshot(&self) -> Result<Option<usize>> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(None);
        }
        self.snapshots.try_dump_with(|| self.copy_entries())
    }

    fn append(&self, record: &Record) -> Result<()> {
        let mut wal = self.wal.lock();
        let writer = wal.as_mut().ok_or(KvError::Closed)?;
        if let Err(e) = writer.append(record) {
            tracing::warn!(key = record.key(), "WAL append failed: {}", e);
            return Err(e);
        }
        Ok(())
    }
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create parent directories of both files
    /// 2. Seed the map from the snapshot, if one exists
    /// 3. Replay the WAL on top (later records win, tombstones remove)
    /// 4. Open the WAL for appending
    /// 5. Start the periodic snapshot task
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create directories
        for path in [&config.wal_path, &config.snapshot_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        let mut map = HashMap::new();

        // Step 2: Snapshot first, it is the oldest state
        let snapshots = SnapshotStore::new(&config.snapshot_path);
        let mut restore = snapshots.restore()?;
        for entry in restore.by_ref() {
            let (key, value) = entry?;
            map.insert(key, value);
        }
        let snapshot_stats = restore.stats();

        // Step 3: WAL replay always wins over the snapshot
        let wal_result = WalRecovery::replay(&config.wal_path, |record| match record {
            Record::Put { key, value } => {
                map.insert(key, value);
            }
            Record::Delete { key } => {
                map.remove(&key);
            }
        })?;

        // Step 4: Open the log at the configured path
        let wal = WalWriter::open(&config.wal_path, config.wal_sync_strategy)?;

        let recovery = RecoveryReport {
            snapshot_entries: snapshot_stats.records,
            snapshot_skipped: snapshot_stats.skipped,
            wal: wal_result,
            keys: map.len(),
        };
        tracing::info!(
            wal = %config.wal_path.display(),
            snapshot = %config.snapshot_path.display(),
            snapshot_entries = recovery.snapshot_entries,
            snapshot_skipped = recovery.snapshot_skipped,
            wal_records = recovery.wal.entries_recovered,
            wal_skipped = recovery.wal.entries_corrupted,
            wal_truncated = recovery.wal.was_truncated,
            keys = recovery.keys,
            "engine recovered"
        );

        let shared = Arc::new(Shared {
            map: RwLock::new(map),
            wal: Mutex::new(Some(wal)),
            cache: RecencyCache::new(config.cache_capacity),
            snapshots,
            closed: AtomicBool::new(false),
        });

        // Step 5: Background snapshots
        let scheduler = match config.snapshot_interval {
            Some(interval) => {
                let task_shared = Arc::clone(&shared);
                Some(SnapshotScheduler::spawn(interval, move || {
                    task_shared.scheduled_snapshot()
                })?)
            }
            None => None,
        };

        Ok(Self {
            config,
            shared,
            scheduler: Mutex::new(scheduler),
            recovery,
        })
    }

    /// Open with both files inside `dir` (convenience method)
    ///
    /// Uses default config otherwise
    pub fn open_path(dir: &Path) -> Result<Self> {
        Self::open(Config::in_dir(dir))
    }

    /// Get a value by key
    ///
    /// Lookup order:
    /// 1. Recency cache
    /// 2. Authoritative map (refills the cache on a hit)
    ///
    /// `Ok(None)` means the key does not exist. Keys that could never be
    /// stored (containing ':' or a newline) are simply absent.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if key.is_empty() {
            return Err(KvError::InvalidInput("key must not be empty".to_string()));
        }
        self.shared.ensure_open()?;

        if let Some(value) = self.shared.cache.get(key) {
            tracing::trace!(key, "cache hit");
            return Ok(Some(value));
        }

        let map = self.shared.map.read();
        match map.get(key) {
            Some(value) => {
                self.shared.cache.put(key.to_owned(), value.clone());
                Ok(Some(value.clone()))
            }
            None => Ok(None),
        }
    }

    /// Set a key-value pair
    ///
    /// Steps:
    /// 1. Validate input
    /// 2. Acquire the map write lock
    /// 3. Append to WAL (durability); on failure nothing else changes
    /// 4. Update the map, then the cache
    pub fn set(&self, key: &str, value: &str) -> Result<Entry> {
        validate_key(key)?;
        validate_value(value)?;
        self.shared.ensure_open()?;

        let mut map = self.shared.map.write();

        self.shared.append(&Record::put(key, value))?;

        map.insert(key.to_owned(), value.to_owned());
        self.shared.cache.put(key.to_owned(), value.to_owned());
        tracing::trace!(key, "set");

        Ok(Entry {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Delete a key
    ///
    /// Always logs a tombstone, even when the key is absent.
    pub fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.shared.ensure_open()?;

        let mut map = self.shared.map.write();

        self.shared.append(&Record::delete(key))?;

        let existed = map.remove(key).is_some();
        self.shared.cache.remove(key);
        tracing::trace!(key, existed, "delete");

        Ok(())
    }

    /// Write a snapshot now; returns the number of entries written
    pub fn snapshot(&self) -> Result<usize> {
        self.shared.ensure_open()?;
        let entries = self.shared.snapshot()?;
        tracing::info!(entries, "snapshot complete");
        Ok(entries)
    }

    /// Close the engine gracefully
    ///
    /// Stops the snapshot task, waits for in-flight writes, then syncs and
    /// releases the WAL. Every later call fails with [`KvError::Closed`].
    pub fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return Err(KvError::Closed);
        }

        // Step 1: Stop the background task (an in-flight dump completes)
        if let Some(mut scheduler) = self.scheduler.lock().take() {
            scheduler.stop();
        }

        // Step 2: Wait out writers that got past the closed check
        let _map = self.shared.map.write();

        // Step 3: Release the log
        let writer = self.shared.wal.lock().take();
        if let Some(mut writer) = writer {
            writer.sync()?;
        }

        tracing::info!("engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.shared.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Whether `key` is currently cache-resident (does not promote it)
    pub fn is_cached(&self, key: &str) -> bool {
        self.shared.cache.contains(key)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.shared.cache.stats()
    }

    /// Get the startup recovery statistics
    pub fn recovery(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.close() {
                tracing::warn!("error closing engine on drop: {}", e);
            }
        }
    }
}
