//! Recency Cache Module
//!
//! Bounded read accelerator in front of the authoritative map.
//!
//! ## Responsibilities
//! - O(1) lookup, promotion, and least-recently-used eviction
//! - Its own lock, independent of the map's RwLock
//! - Hit/miss/eviction counters
//!
//! The cache knows nothing about the map. It stays consistent only because
//! the engine calls `put`/`remove` alongside every map mutation.

mod lru;

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use lru::LruList;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits.saturating_add(self.misses);
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64)
    }
}

/// Fixed-capacity LRU cache, safe to share between threads
///
/// A capacity of zero disables caching.
pub struct RecencyCache {
    inner: Mutex<LruList>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl std::fmt::Debug for RecencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecencyCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl RecencyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruList::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached value and promote it to most recently used
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self.inner.lock().get(key).map(str::to_owned);
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Insert or update, evicting the least recently used entry when full
    pub fn put(&self, key: String, value: String) {
        let evicted = self.inner.lock().put(key, value);
        if let Some((evicted_key, _)) = evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %evicted_key, "cache eviction");
        }
    }

    pub fn remove(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Membership test that does not promote the entry
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    /// Cached keys, most recently used first
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.inner.lock().keys_by_recency()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn stats(&self) -> CacheStats {
        let (len, capacity) = {
            let inner = self.inner.lock();
            (inner.len(), inner.capacity())
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }
}
