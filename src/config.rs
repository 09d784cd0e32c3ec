//! Configuration for LazyKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{KvError, Result};

/// Main configuration for a LazyKV engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Location of the write-ahead log. Opened at exactly this path.
    pub wal_path: PathBuf,

    /// Location of the full-state snapshot
    pub snapshot_path: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// How hard each append is pushed to disk before it returns
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Max number of cached entries (0 disables the cache)
    pub cache_capacity: usize,

    // -------------------------------------------------------------------------
    // Snapshot Configuration
    // -------------------------------------------------------------------------
    /// Time between automatic snapshots; `None` disables the background task
    pub snapshot_interval: Option<Duration>,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// Flush to the OS page cache only; survives a process crash, not power loss
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from("./lazykv_data/wal.log"),
            snapshot_path: PathBuf::from("./lazykv_data/snapshot.db"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            cache_capacity: 1024,
            snapshot_interval: Some(Duration::from_secs(60 * 60)), // hourly
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config with both files placed inside `dir`, everything else default
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            wal_path: dir.join("wal.log"),
            snapshot_path: dir.join("snapshot.db"),
            ..Self::default()
        }
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.wal_path.as_os_str().is_empty() {
            return Err(KvError::Config("wal_path must not be empty".to_string()));
        }
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(KvError::Config(
                "snapshot_path must not be empty".to_string(),
            ));
        }
        if self.wal_path == self.snapshot_path {
            return Err(KvError::Config(
                "wal_path and snapshot_path must differ".to_string(),
            ));
        }
        if self.snapshot_interval == Some(Duration::ZERO) {
            return Err(KvError::Config(
                "snapshot_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Place the WAL and snapshot files inside a directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.config.wal_path = dir.join("wal.log");
        self.config.snapshot_path = dir.join("snapshot.db");
        self
    }

    /// Set the WAL file path
    pub fn wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_path = path.into();
        self
    }

    /// Set the snapshot file path
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the cache capacity (in entries)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the automatic snapshot interval
    pub fn snapshot_interval(mut self, interval: Duration) -> Self {
        self.config.snapshot_interval = Some(interval);
        self
    }

    /// Turn off the background snapshot task
    pub fn disable_periodic_snapshots(mut self) -> Self {
        self.config.snapshot_interval = None;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
