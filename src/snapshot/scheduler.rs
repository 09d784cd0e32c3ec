//! Periodic snapshot task
//!
//! A dedicated thread that runs a dump every `interval` until told to stop.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};

use crate::error::Result;

/// Handle to the background snapshot thread
///
/// The thread waits on a stop channel with a timeout of one interval, so a
/// stop request wakes it immediately. A dump runs to completion on the thread
/// itself; the next wait only starts after it returns, so dumps never overlap.
pub struct SnapshotScheduler {
    interval: Duration,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotScheduler {
    /// Spawn the thread
    ///
    /// `task` returns `Ok(Some(n))` after writing `n` entries and `Ok(None)`
    /// when it chose to skip this tick.
    pub fn spawn<F>(interval: Duration, mut task: F) -> Result<Self>
    where
        F: FnMut() -> Result<Option<usize>> + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("lazykv-snapshot".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => match task() {
                        Ok(Some(entries)) => {
                            tracing::info!(entries, "periodic snapshot complete")
                        }
                        Ok(None) => tracing::debug!("periodic snapshot skipped"),
                        Err(e) => tracing::error!("periodic snapshot failed: {}", e),
                    },
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        tracing::debug!(?interval, "snapshot scheduler started");

        Ok(Self {
            interval,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it to exit
    ///
    /// A dump in progress is allowed to finish first.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A full channel or a gone receiver both mean the thread will exit
            let _ = stop_tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("snapshot thread panicked");
            }
            tracing::debug!("snapshot scheduler stopped");
        }
    }
}

impl Drop for SnapshotScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
