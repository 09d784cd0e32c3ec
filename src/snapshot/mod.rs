//! Snapshot Module
//!
//! Whole-state dump and restore, independent of the WAL's per-mutation
//! granularity.
//!
//! ## Responsibilities
//! - Write every live entry as one `key:value` line
//! - Replace the previous snapshot atomically (temp file + rename)
//! - Restore entries on startup; a missing file means "start empty"
//! - Run dumps periodically on a background thread that stops on close
//!
//! ## Startup Ordering
//! ```text
//!   snapshot.db  ──seed──▶  map  ◀──replay (wins)──  wal.log
//! ```
//! The snapshot is older than anything in the WAL, so it is applied first and
//! every WAL record, tombstones included, is applied on top of it.

mod store;
mod scheduler;

pub use store::{SnapshotReader, SnapshotStore};
pub use scheduler::SnapshotScheduler;
