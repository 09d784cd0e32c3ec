//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::codec::Record;
use crate::config::WalSyncStrategy;
use crate::error::{KvError, Result};

/// Appends records to the WAL file
///
/// Each record is handed to the OS with a single `write_all` before `append`
/// returns, and with [`WalSyncStrategy::EveryWrite`] it is also on stable
/// storage. If any step fails the file is cut back to its last committed
/// length, so a failed record can never be replayed or glued onto the next
/// one. If even that cut fails the writer is poisoned: every later append
/// fails with [`KvError::WalCorruption`] until the log is reopened, where
/// recovery drops the partial line.
pub struct WalWriter {
    file: File,
    path: PathBuf,
    sync_strategy: WalSyncStrategy,
    /// File length after the last successful append
    committed_len: u64,
    records_written: u64,
    /// Partial bytes past `committed_len` could not be removed
    poisoned: bool,
    #[cfg(test)]
    faults: InjectedFaults,
}

/// Failures the tests can force on the next append
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct InjectedFaults {
    /// Write the first half of the line, then fail
    pub(crate) torn_write: bool,
    /// Fail the truncate that undoes a partial write
    pub(crate) failed_rollback: bool,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let committed_len = file.metadata()?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            committed_len,
            records_written: 0,
            poisoned: false,
            #[cfg(test)]
            faults: InjectedFaults::default(),
        })
    }

    /// Append a record; returns how many records this writer has appended
    pub fn append(&mut self, record: &Record) -> Result<u64> {
        if self.poisoned {
            return Err(KvError::WalCorruption(format!(
                "{} ends in a partial record that could not be removed",
                self.path.display()
            )));
        }

        let line = record.encode();

        if let Err(e) = self.write_line(line.as_bytes()) {
            if let Err(rollback_err) = self.rollback() {
                self.poisoned = true;
                tracing::error!(
                    path = %self.path.display(),
                    committed_len = self.committed_len,
                    "failed to roll back partial WAL append, refusing further writes: {}",
                    rollback_err
                );
            }
            return Err(e);
        }

        self.committed_len += line.len() as u64;
        self.records_written += 1;
        Ok(self.records_written)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Number of records appended through this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Bytes in the file that belong to complete, acknowledged records
    pub fn committed_len(&self) -> u64 {
        self.committed_len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a failed rollback has stopped this writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    #[cfg(test)]
    pub(crate) fn inject_faults(&mut self, faults: InjectedFaults) {
        self.faults = faults;
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        #[cfg(test)]
        {
            if self.faults.torn_write {
                self.file.write_all(&line[..line.len() / 2])?;
                return Err(io::Error::new(io::ErrorKind::Other, "injected write failure").into());
            }
        }

        self.file.write_all(line)?;
        if self.sync_strategy == WalSyncStrategy::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> io::Result<()> {
        #[cfg(test)]
        {
            if self.faults.failed_rollback {
                return Err(io::Error::new(io::ErrorKind::Other, "injected truncate failure"));
            }
        }

        self.file.set_len(self.committed_len)
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        // Best effort sync on drop
        let _ = self.sync();
    }
}
