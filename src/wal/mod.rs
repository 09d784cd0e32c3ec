//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append one record per mutation, flushed before the mutation is applied
//! - Replay records in file order on startup
//! - Skip and count malformed lines instead of aborting
//! - Cut off a torn final line left behind by an interrupted append
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────┐
//! │ user42:alice\n              │  upsert     user42  → alice
//! │ url:http://x.io\n           │  upsert     url     → http://x.io
//! │ user42\n                    │  tombstone  user42
//! └─────────────────────────────┘
//! ```
//! See [`crate::codec`] for the exact line grammar.

mod writer;
mod reader;
mod recovery;

pub use writer::WalWriter;
#[cfg(test)]
pub(crate) use writer::InjectedFaults;
pub use reader::WalReader;
pub use recovery::{WalRecovery, RecoveryResult};
