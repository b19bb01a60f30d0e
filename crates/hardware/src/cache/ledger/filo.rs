//! First-In, Last-Out (FILO) eviction order.
//!
//! The most recently inserted block that is still resident is evicted first.
//! Useful as a pathological baseline: a looping working set slightly larger
//! than the cache keeps its oldest blocks forever.

use crate::common::Addr;

/// Insertion-ordered stack. The head (newest) is the last element.
#[derive(Debug, Default, Clone)]
pub struct FiloStack {
    entries: Vec<Addr>,
}

impl FiloStack {
    /// Creates an empty stack sized for `capacity` blocks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Pushes a newly inserted block onto the head.
    pub fn insert(&mut self, addr: Addr) {
        debug_assert!(!self.entries.contains(&addr), "{addr:#x} stacked twice");
        self.entries.push(addr);
    }

    /// Returns the newest block without removing it.
    pub fn victim(&self) -> Option<Addr> {
        self.entries.last().copied()
    }

    /// Removes `addr` from the stack. Returns `false` if it was not stacked.
    pub fn remove(&mut self, addr: Addr) -> bool {
        if self.entries.last() == Some(&addr) {
            return self.entries.pop().is_some();
        }
        match self.entries.iter().rposition(|&a| a == addr) {
            Some(pos) => {
                let _ = self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns the number of stacked blocks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stacked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = Addr> + '_ {
        self.entries.iter().rev().copied()
    }
}
