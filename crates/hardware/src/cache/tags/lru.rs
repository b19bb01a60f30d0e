//! Least Recently Used (LRU) way replacement.
//!
//! Identical to FIFO-by-way except that a hit also promotes the way to the
//! head of its set.

use super::{ReplacementPolicy, WayOrder};

/// LRU-by-way state.
#[derive(Debug, Clone)]
pub struct LruWayPolicy {
    order: WayOrder,
}

impl LruWayPolicy {
    /// Creates the policy for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            order: WayOrder::new(sets, ways),
        }
    }

    /// Returns the ways of `set`, most recently used first.
    pub fn order(&self, set: usize) -> &[usize] {
        self.order.ways(set)
    }
}

impl ReplacementPolicy for LruWayPolicy {
    fn on_access(&mut self, set: usize, way: usize) {
        self.order.move_to_head(set, way);
    }

    fn on_insert(&mut self, set: usize, way: usize) {
        self.order.move_to_head(set, way);
    }

    fn on_invalidate(&mut self, set: usize, way: usize) {
        self.order.move_to_tail(set, way);
    }

    fn find_victim(&self, set: usize, alloc_assoc: usize) -> Option<usize> {
        self.order.oldest_allocatable(set, alloc_assoc)
    }
}
