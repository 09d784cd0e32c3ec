//! Snapshot Store
//!
//! Dumps a copy of the map to disk and reads it back.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::codec::{ReadStats, Record, RecordReader, DELIMITER};
use crate::error::{KvError, Result};

/// Owns the snapshot file location and serializes dumps to it
///
/// ## Concurrency:
/// - `dump_lock`: at most one dump writes the temp file at a time
/// - The entries are collected *after* the lock is taken, so dumps land on
///   disk in the same order their copies were made
pub struct SnapshotStore {
    path: PathBuf,
    dump_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dump_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `entries` as the new snapshot; returns how many were written
    pub fn dump(&self, entries: &[(String, String)]) -> Result<usize> {
        let _guard = self.dump_lock.lock();
        self.write_atomic(entries)
    }

    /// Take the dump lock, then collect and write the entries
    pub fn dump_with<F>(&self, collect: F) -> Result<usize>
    where
        F: FnOnce() -> Vec<(String, String)>,
    {
        let _guard = self.dump_lock.lock();
        let entries = collect();
        self.write_atomic(&entries)
    }

    /// Like [`dump_with`](Self::dump_with), but returns `Ok(None)` without
    /// collecting anything when another dump is already running
    pub fn try_dump_with<F>(&self, collect: F) -> Result<Option<usize>>
    where
        F: FnOnce() -> Vec<(String, String)>,
    {
        let Some(_guard) = self.dump_lock.try_lock() else {
            return Ok(None);
        };
        let entries = collect();
        self.write_atomic(&entries).map(Some)
    }

    /// Open the current snapshot for reading
    pub fn restore(&self) -> Result<SnapshotReader> {
        SnapshotReader::open(&self.path)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// `snapshot.db` → `snapshot.db.tmp`
    fn temp_path(&self) -> Result<PathBuf> {
        let name = self.path.file_name().ok_or_else(|| {
            KvError::Snapshot(format!("invalid snapshot path: {}", self.path.display()))
        })?;
        let mut temp_name = OsString::from(name);
        temp_name.push(".tmp");
        Ok(self.path.with_file_name(temp_name))
    }

    fn write_atomic(&self, entries: &[(String, String)]) -> Result<usize> {
        let temp_path = self.temp_path()?;

        if let Err(e) = Self::write_file(&temp_path, entries) {
            let _ = fs::remove_file(&temp_path);
            return Err(KvError::Snapshot(format!(
                "failed to write {}: {}",
                temp_path.display(),
                e
            )));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            KvError::Snapshot(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        self.sync_parent_dir();

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "snapshot written"
        );
        Ok(entries.len())
    }

    fn write_file(path: &Path, entries: &[(String, String)]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (key, value) in entries {
            writeln!(writer, "{}{}{}", key, DELIMITER, value)?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }

    /// Persist the rename itself; not supported on every platform
    fn sync_parent_dir(&self) {
        let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return;
        };
        if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::trace!(dir = %parent.display(), "directory sync skipped: {}", e);
        }
    }
}

/// Reads `(key, value)` pairs back from a snapshot file
///
/// A missing file yields nothing. Tombstone lines never appear in a well-formed
/// snapshot, so they are skipped and counted like any other malformed line.
pub struct SnapshotReader {
    records: Option<RecordReader<BufReader<File>>>,
}

impl SnapshotReader {
    pub fn open(path: &Path) -> Result<Self> {
        let records = match File::open(path) {
            Ok(file) => Some(RecordReader::new(BufReader::new(file), "snapshot")),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(KvError::Snapshot(format!(
                    "failed to open {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self { records })
    }

    pub fn exists(&self) -> bool {
        self.records.is_some()
    }

    pub fn stats(&self) -> ReadStats {
        self.records
            .as_ref()
            .map(RecordReader::stats)
            .unwrap_or_default()
    }
}

impl Iterator for SnapshotReader {
    type Item = Result<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records.as_mut()?;
        loop {
            match records.next()? {
                Ok(Record::Put { key, value }) => return Some(Ok((key, value))),
                Ok(Record::Delete { .. }) => records.reject_last("tombstone in snapshot"),
                Err(KvError::Io(e)) => return Some(Err(KvError::Snapshot(e.to_string()))),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
