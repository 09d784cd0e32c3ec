//! WAL Reader
//!
//! Handles reading records from the WAL file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use crate::codec::{ReadStats, Record, RecordReader};
use crate::error::{KvError, Result};

/// Reads records from the WAL file in append order
///
/// Opening the same path again starts a fresh pass from the beginning.
/// A missing file reads as an empty log.
pub struct WalReader {
    records: Option<RecordReader<BufReader<File>>>,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let records = match File::open(path) {
            Ok(file) => Some(RecordReader::new(BufReader::new(file), "wal")),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self { records })
    }

    /// Whether a log file was actually found
    pub fn exists(&self) -> bool {
        self.records.is_some()
    }

    /// Counters for the records consumed so far
    pub fn stats(&self) -> ReadStats {
        self.records
            .as_ref()
            .map(RecordReader::stats)
            .unwrap_or_default()
    }
}

impl Iterator for WalReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.records.as_mut()?.next()?;
        Some(item.map_err(|e| match e {
            KvError::Io(io_err) if io_err.kind() == io::ErrorKind::InvalidData => {
                KvError::WalCorruption(io_err.to_string())
            }
            other => other,
        }))
    }
}
