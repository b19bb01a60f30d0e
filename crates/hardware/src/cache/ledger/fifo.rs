//! First-In, First-Out (FIFO) eviction order.
//!
//! This ledger evicts the oldest resident block, regardless of how recently it
//! was accessed. New blocks are prepended at the head; the victim is always
//! the tail.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `insert()`: O(1)
//!   - `victim()`: O(1)
//!   - `remove()`: O(1) for the tail, O(N) for any other entry
//! - **Space Complexity:** O(N) where N is the number of resident blocks
//! - **Best Case:** Streaming accesses where all blocks have equal importance
//! - **Worst Case:** Workloads with strong temporal locality (may evict hot blocks)

use std::collections::VecDeque;

use crate::common::Addr;

/// Insertion-ordered queue. Front is the head (newest), back is the tail (oldest).
#[derive(Debug, Default, Clone)]
pub struct FifoQueue {
    entries: VecDeque<Addr>,
}

impl FifoQueue {
    /// Creates an empty queue sized for `capacity` blocks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Records a newly inserted block at the head.
    pub fn insert(&mut self, addr: Addr) {
        debug_assert!(!self.entries.contains(&addr), "{addr:#x} queued twice");
        self.entries.push_front(addr);
    }

    /// Returns the oldest block without removing it.
    pub fn victim(&self) -> Option<Addr> {
        self.entries.back().copied()
    }

    /// Removes `addr` from the queue. Returns `false` if it was not queued.
    pub fn remove(&mut self, addr: Addr) -> bool {
        if self.entries.back() == Some(&addr) {
            return self.entries.pop_back().is_some();
        }
        match self.entries.iter().position(|&a| a == addr) {
            Some(pos) => self.entries.remove(pos).is_some(),
            None => false,
        }
    }

    /// Returns the number of queued blocks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = Addr> + '_ {
        self.entries.iter().copied()
    }
}
