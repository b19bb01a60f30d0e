//! First-In, First-Out (FIFO) way replacement.
//!
//! Fills move a way to the head of its set; hits leave the order alone. The
//! victim is the oldest allocatable way.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `on_access()`: O(1)
//!   - `on_insert()` / `on_invalidate()`: O(W) where W is the associativity
//!   - `find_victim()`: O(W)
//! - **Space Complexity:** O(S × W) where S is the number of sets

use super::{ReplacementPolicy, WayOrder};

/// FIFO-by-way state.
#[derive(Debug, Clone)]
pub struct FifoWayPolicy {
    order: WayOrder,
}

impl FifoWayPolicy {
    /// Creates the policy for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            order: WayOrder::new(sets, ways),
        }
    }

    /// Returns the ways of `set`, newest first.
    pub fn order(&self, set: usize) -> &[usize] {
        self.order.ways(set)
    }
}

impl ReplacementPolicy for FifoWayPolicy {
    fn on_access(&mut self, _set: usize, _way: usize) {}

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
