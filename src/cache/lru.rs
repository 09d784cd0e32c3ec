//! Arena-backed LRU list
//!
//! Nodes live in a `Vec` and link to each other by index, so promotion and
//! eviction are O(1) pointer swaps with no per-node allocation. Freed slots
//! are recycled through a free list.

use std::collections::HashMap;
use std::mem;

/// Sentinel index meaning "no node"
const NIL: usize = usize::MAX;

struct Node {
    key: String,
    value: String,
    prev: usize,
    next: usize,
}

/// Single-threaded LRU map; the caller provides locking
pub(crate) struct LruList {
    capacity: usize,
    index: HashMap<String, usize>,
    nodes: Vec<Node>,
    free: Vec<usize>,
    /// Most recently used
    head: usize,
    /// Least recently used
    tail: usize,
}

impl LruList {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            // Grown on demand; capacity is only an upper bound
            index: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Membership test that leaves recency untouched
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a key and mark it most recently used
    pub(crate) fn get(&mut self, key: &str) -> Option<&str> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        Some(&self.nodes[idx].value)
    }

    /// Insert or update; returns the entry evicted to make room, if any
    pub(crate) fn put(&mut self, key: String, value: String) -> Option<(String, String)> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(&idx) = self.index.get(&key) {
            self.nodes[idx].value = value;
            self.promote(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_front(idx);

        evicted
    }

    /// Drop a key; returns its value if it was present
    pub(crate) fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        let node = &mut self.nodes[idx];
        node.key.clear();
        let value = mem::take(&mut node.value);
        self.free.push(idx);
        Some(value)
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Keys from most to least recently used
    pub(crate) fn keys_by_recency(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while cursor != NIL {
            keys.push(self.nodes[cursor].key.clone());
            cursor = self.nodes[cursor].next;
        }
        keys
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn pop_lru(&mut self) -> Option<(String, String)> {
        let idx = self.tail;
        if idx == NIL {
            return None;
        }
        self.unlink(idx);
        let node = &mut self.nodes[idx];
        let key = mem::take(&mut node.key);
        let value = mem::take(&mut node.value);
        self.index.remove(&key);
        self.free.push(idx);
        Some((key, value))
    }

    fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);

        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }

        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;

        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;

        if self.tail == NIL {
            self.tail = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(lru: &mut LruList, key: &str, value: &str) -> Option<(String, String)> {
        lru.put(key.to_string(), value.to_string())
    }

    #[test]
    fn test_recency_order_follows_access() {
        let mut lru = LruList::new(3);
        put(&mut lru, "a", "1");
        put(&mut lru, "b", "2");
        put(&mut lru, "c", "3");
        assert_eq!(lru.keys_by_recency(), vec!["c", "b", "a"]);

        assert_eq!(lru.get("a"), Some("1"));
        assert_eq!(lru.keys_by_recency(), vec!["a", "c", "b"]);

        // Promoting the tail must fix the tail pointer
        assert_eq!(lru.get("b"), Some("2"));
        assert_eq!(lru.keys_by_recency(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_evicted_slot_is_reused() {
        let mut lru = LruList::new(2);
        put(&mut lru, "a", "1");
        put(&mut lru, "b", "2");

        let evicted = put(&mut lru, "c", "3");
        assert_eq!(evicted, Some(("a".to_string(), "1".to_string())));
        assert_eq!(lru.nodes.len(), 2);
        assert!(lru.free.is_empty());
    }

    #[test]
    fn test_removed_slot_is_reused() {
        let mut lru = LruList::new(4);
        put(&mut lru, "a", "1");
        put(&mut lru, "b", "2");
        assert_eq!(lru.remove("a"), Some("1".to_string()));
        assert_eq!(lru.free, vec![0]);

        put(&mut lru, "c", "3");
        assert!(lru.free.is_empty());
        assert_eq!(lru.nodes.len(), 2);
        assert_eq!(lru.keys_by_recency(), vec!["c", "b"]);
    }

    #[test]
    fn test_remove_only_entry_resets_links() {
        let mut lru = LruList::new(1);
        put(&mut lru, "a", "1");
        lru.remove("a");

        assert_eq!(lru.head, NIL);
        assert_eq!(lru.tail, NIL);
        assert!(lru.keys_by_recency().is_empty());

        put(&mut lru, "b", "2");
        assert_eq!(lru.keys_by_recency(), vec!["b"]);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut lru = LruList::new(usize::MAX);
        assert_eq!(lru.nodes.capacity(), 0);

        put(&mut lru, "a", "1");
        assert_eq!(lru.capacity(), usize::MAX);
        assert_eq!(lru.get("a"), Some("1"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut lru = LruList::new(0);
        assert_eq!(put(&mut lru, "a", "1"), None);
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.get("a"), None);
    }
}
