//! Least Recently Used (LRU) eviction order.
//!
//! Blocks are kept in a recency list: the front is the most recently used,
//! the rear the least recently used. A hit moves the block to the front and
//! the victim is always the rear.
//!
//! The list is threaded through an arena of nodes addressed by index, with an
//! address → handle index for O(1) lookup. Freed slots are recycled, so the
//! arena never grows past the configured capacity.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `insert()`: O(1)
//!   - `touch()`: O(1)
//!   - `remove()`: O(1)
//!   - `rear()`: O(1)
//! - **Space Complexity:** O(C) where C is the capacity
//! - **Best Case:** Workloads with good temporal locality
//! - **Worst Case:** Scanning patterns larger than the capacity (thrashing)

use std::collections::HashMap;

use crate::common::Addr;

/// Sentinel for "no link".
const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct LruNode {
    key: Addr,
    prev: usize,
    next: usize,
}

/// Arena-backed doubly-linked recency list.
#[derive(Debug, Clone)]
pub struct LruList {
    nodes: Vec<LruNode>,
    free: Vec<usize>,
    index: HashMap<Addr, usize>,
    front: usize,
    rear: usize,
    capacity: usize,
}

impl LruList {
    /// Creates an empty list that tracks at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            front: NIL,
            rear: NIL,
            capacity,
        }
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is tracked.
    pub fn contains(&self, key: Addr) -> bool {
        self.index.contains_key(&key)
    }

    /// Links `key` at the front.
    ///
    /// If the list is already at capacity the rear node is unlinked first and
    /// its slot reused; the displaced key is returned.
    pub fn insert(&mut self, key: Addr) -> Option<Addr> {
        debug_assert!(!self.contains(key), "{key:#x} already in recency list");
        let mut displaced = None;
        if self.len() >= self.capacity && self.rear != NIL {
            let rear = self.rear;
            let old = self.nodes[rear].key;
            self.unlink(rear);
            let _ = self.index.remove(&old);
            self.free.push(rear);
            displaced = Some(old);
        }

        let node = LruNode {
            key,
            prev: NIL,
            next: NIL,
        };
        let handle = if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        };
        self.link_front(handle);
        let _ = self.index.insert(key, handle);
        displaced
    }

    /// Moves `key` to the front. Returns `false` if it is not tracked.
    pub fn touch(&mut self, key: Addr) -> bool {
        let Some(&handle) = self.index.get(&key) else {
            return false;
        };
        if handle != self.front {
            self.unlink(handle);
            self.link_front(handle);
        }
        true
    }

    /// Unlinks `key` wherever it sits. Returns `false` if it is not tracked.
    pub fn remove(&mut self, key: Addr) -> bool {
        let Some(handle) = self.index.remove(&key) else {
            return false;
        };
        self.unlink(handle);
        self.free.push(handle);
        true
    }

    /// Returns the least recently used key without removing it.
    pub fn rear(&self) -> Option<Addr> {
        (self.rear != NIL).then(|| self.nodes[self.rear].key)
    }

    /// Returns the most recently used key.
    pub fn front(&self) -> Option<Addr> {
        (self.front != NIL).then(|| self.nodes[self.front].key)
    }

    /// Returns the keys from most to least recently used.
    pub fn keys(&self) -> Vec<Addr> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cur = self.front;
        while cur != NIL {
            keys.push(self.nodes[cur].key);
            cur = self.nodes[cur].next;
        }
        keys
    }

    fn link_front(&mut self, handle: usize) {
        self.nodes[handle].prev = NIL;
        self.nodes[handle].next = self.front;
        if self.front == NIL {
            self.rear = handle;
        } else {
            self.nodes[self.front].prev = handle;
        }
        self.front = handle;
    }

    fn unlink(&mut self, handle: usize) {
        let LruNode { prev, next, .. } = self.nodes[handle];
        if prev == NIL {
            self.front = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.rear = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[handle].prev = NIL;
        self.nodes[handle].next = NIL;
    }
}
