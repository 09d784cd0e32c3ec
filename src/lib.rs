//! # LazyKV
//!
//! A single-node, in-memory key-value store with:
//! - Write-Ahead Logging (WAL) for durability
//! - An LRU recency cache in front of the map
//! - Periodic full-state snapshots for faster cold start
//! - Single-writer/multi-reader concurrency model
//! - A small JSON-over-HTTP front end
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP (axum)                            │
//! │              /get   /set   /delete   /health                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                │
//! │            (Single Writer / Multi Reader)                   │
//! └──────┬──────────────────┬──────────────────────┬────────────┘
//!        │                  │                      │
//!        ▼                  ▼                      ▼
//!   ┌─────────┐      ┌─────────────┐        ┌─────────────┐
//!   │   WAL   │      │  Map        │        │ Recency     │
//!   │(Append) │      │  (RwLock)   │        │ Cache (LRU) │
//!   └─────────┘      └──────┬──────┘        └─────────────┘
//!                           │ periodic copy
//!                           ▼
//!                    ┌─────────────┐
//!                    │  Snapshot   │
//!                    │ (tmp+rename)│
//!                    └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod wal;
pub mod cache;
pub mod snapshot;
pub mod engine;
pub mod http;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, WalSyncStrategy};
pub use engine::{Engine, Entry, RecoveryReport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LazyKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
