//! Set-Associative Tags.
//!
//! A fixed-associativity tag store: blocks map to a set by address and may
//! occupy any of its ways. Which way is replaced is decided by a pluggable
//! per-way policy.
//!
//! # Policies
//!
//! - `FifoWayPolicy`: access never reorders, the oldest fill is replaced.
//! - `LruWayPolicy`: access promotes, the least recently used way is replaced.
//!
//! Both keep, per set, the ways ordered from newest (head) to oldest (tail).
//! Invalidated ways are demoted to the tail so they are refilled before any
//! valid way is displaced.

/// FIFO-by-way replacement.
pub mod fifo;

/// LRU-by-way replacement.
pub mod lru;

pub use fifo::FifoWayPolicy;
pub use lru::LruWayPolicy;

use crate::common::{Addr, block_align};

/// Trait for per-way replacement policies.
pub trait ReplacementPolicy: Send + Sync {
    /// Updates the policy state when a resident way is accessed.
    ///
    /// # Arguments
    ///
    /// * `set` - The set index.
    /// * `way` - The way that hit.
    fn on_access(&mut self, set: usize, way: usize);

    /// Updates the policy state when a way is filled.
    fn on_insert(&mut self, set: usize, way: usize);

    /// Updates the policy state when a way is invalidated.
    fn on_invalidate(&mut self, set: usize, way: usize);

    /// Selects the way to replace in `set`.
    ///
    /// Only ways with an index below `alloc_assoc` are candidates.
    ///
    /// # Returns
    ///
    /// The way to replace, or `None` if no way is allocatable.
    fn find_victim(&self, set: usize, alloc_assoc: usize) -> Option<usize>;
}

/// Per-set way order, newest first.
#[derive(Debug, Clone)]
pub struct WayOrder {
    sets: Vec<Vec<usize>>,
}

impl WayOrder {
    /// Creates the initial order: way 0 newest, the last way oldest.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            sets: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }

    /// Moves `way` to the head of `set`.
    pub fn move_to_head(&mut self, set: usize, way: usize) {
        let order = &mut self.sets[set];
        if let Some(pos) = order.iter().position(|&w| w == way) {
            let _ = order.remove(pos);
        }
        order.insert(0, way);
    }

    /// Moves `way` to the tail of `set`.
    pub fn move_to_tail(&mut self, set: usize, way: usize) {
        let order = &mut self.sets[set];
        if let Some(pos) = order.iter().position(|&w| w == way) {
            let _ = order.remove(pos);
        }
        order.push(way);
    }

    /// Returns the ways of `set`, newest first.
    pub fn ways(&self, set: usize) -> &[usize] {
        &self.sets[set]
    }

    /// Scans `set` from oldest to newest and returns the first way below
    /// `alloc_assoc`.
    pub fn oldest_allocatable(&self, set: usize, alloc_assoc: usize) -> Option<usize> {
        self.sets[set].iter().rev().copied().find(|&w| w < alloc_assoc)
    }
}

/// A way chosen for replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Victim {
    /// Set index.
    pub set: usize,
    /// Way index.
    pub way: usize,
    /// Block currently held in the way, if valid.
    pub resident: Option<Addr>,
}

/// Set-associative tag array.
pub struct SetAssocTags<P> {
    num_sets: usize,
    assoc: usize,
    alloc_assoc: usize,
    block_size: usize,
    tags: Vec<Option<Addr>>,
    policy: P,
}

impl<P> std::fmt::Debug for SetAssocTags<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetAssocTags")
            .field("num_sets", &self.num_sets)
            .field("assoc", &self.assoc)
            .field("alloc_assoc", &self.alloc_assoc)
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

impl<P: ReplacementPolicy> SetAssocTags<P> {
    /// Creates an all-invalid tag array.
    ///
    /// # Arguments
    ///
    /// * `num_sets` - Number of sets.
    /// * `assoc` - Ways per set.
    /// * `block_size` - Bytes per block; a power of two.
    /// * `policy` - Replacement policy sized for the same geometry.
    pub fn new(num_sets: usize, assoc: usize, block_size: usize, policy: P) -> Self {
        Self {
            num_sets,
            assoc,
            alloc_assoc: assoc,
            block_size,
            tags: vec![None; num_sets * assoc],
            policy,
        }
    }

    /// Restricts allocation to ways `0..alloc_assoc`.
    pub fn set_alloc_assoc(&mut self, alloc_assoc: usize) {
        self.alloc_assoc = alloc_assoc.min(self.assoc);
    }

    /// Returns the number of ways allocation may use.
    pub const fn alloc_assoc(&self) -> usize {
        self.alloc_assoc
    }

    /// Returns the set `addr` maps to.
    pub fn extract_set(&self, addr: Addr) -> usize {
        ((addr / self.block_size as u64) % self.num_sets as u64) as usize
    }

    /// Returns the block held in `way` of `set`.
    pub fn block_at(&self, set: usize, way: usize) -> Option<Addr> {
        self.tags[set * self.assoc + way]
    }

    /// Returns the policy.
    pub const fn policy(&self) -> &P {
        &self.policy
    }

    /// Looks up the block holding `addr` and notifies the policy on a hit.
    ///
    /// # Returns
    ///
    /// The way holding the block, or `None` on a miss.
    pub fn access_block(&mut self, addr: Addr) -> Option<usize> {
        let set = self.extract_set(addr);
        let block = block_align(addr, self.block_size);
        let way = (0..self.assoc).find(|&w| self.block_at(set, w) == Some(block))?;
        self.policy.on_access(set, way);
        Some(way)
    }

    /// Chooses the way a fill of `addr` would replace.
    pub fn find_victim(&self, addr: Addr) -> Option<Victim> {
        let set = self.extract_set(addr);
        let way = self.policy.find_victim(set, self.alloc_assoc)?;
        let resident = self.block_at(set, way);
        if let Some(block) = resident {
            tracing::debug!(target: "insert", "set {set:x}: selecting blk {block:#x} for replacement");
        }
        Some(Victim { set, way, resident })
    }

    /// Fills `way` of the set `addr` maps to.
    pub fn insert_block(&mut self, addr: Addr, way: usize) {
        let set = self.extract_set(addr);
        self.tags[set * self.assoc + way] = Some(block_align(addr, self.block_size));
        self.policy.on_insert(set, way);
    }

    /// Clears `way` of `set`.
    pub fn invalidate(&mut self, set: usize, way: usize) {
        self.tags[set * self.assoc + way] = None;
        self.policy.on_invalidate(set, way);
    }
}
