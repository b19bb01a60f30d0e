//! Eviction Ledgers.
//!
//! Bookkeeping that decides which resident block to evict when the store is
//! full. Exactly one ledger is active per cache, selected by
//! [`EvictionPolicy`].
//!
//! # Policies
//!
//! - `Fifo`: evicts the oldest resident block.
//! - `Filo`: evicts the newest resident block.
//! - `Lru`: evicts the least recently used block.
//! - `Random`: samples a random non-empty store bucket.
//! - `Sequential`: takes the first block of the first non-empty store bucket.

/// Random and sequential bucket sampling.
pub mod bucket;

/// First-In, First-Out queue.
pub mod fifo;

/// First-In, Last-Out stack.
pub mod filo;

/// Least Recently Used recency list.
pub mod lru;

pub use bucket::RandomBucket;
pub use fifo::FifoQueue;
pub use filo::FiloStack;
pub use lru::LruList;

use crate::cache::store::BlockStore;
use crate::common::{Addr, Invariant};
use crate::config::EvictionPolicy;

/// The active eviction policy together with the state it needs.
///
/// List-based policies mirror the store's key set one entry per block. The
/// bucket policies carry no per-block state and sample the store directly.
#[derive(Debug, Clone)]
pub enum EvictionLedger {
    /// Insertion-ordered queue.
    Fifo(FifoQueue),
    /// Insertion-ordered stack.
    Filo(FiloStack),
    /// Recency list plus index.
    Lru(LruList),
    /// Random bucket sampler.
    Random(RandomBucket),
    /// First non-empty bucket.
    Sequential,
}

impl EvictionLedger {
    /// Creates the ledger for `policy`.
    ///
    /// # Arguments
    ///
    /// * `policy` - The eviction policy.
    /// * `capacity` - Number of blocks the cache holds.
    /// * `seed` - Seed for the random policy; ignored by the others.
    pub fn new(policy: EvictionPolicy, capacity: usize, seed: u64) -> Self {
        match policy {
            EvictionPolicy::Fifo => Self::Fifo(FifoQueue::with_capacity(capacity)),
            EvictionPolicy::Filo => Self::Filo(FiloStack::with_capacity(capacity)),
            EvictionPolicy::Lru => Self::Lru(LruList::new(capacity)),
            EvictionPolicy::Random => Self::Random(RandomBucket::new(seed)),
            EvictionPolicy::Sequential => Self::Sequential,
        }
    }

    /// Returns the policy this ledger implements.
    pub const fn policy(&self) -> EvictionPolicy {
        match self {
            Self::Fifo(_) => EvictionPolicy::Fifo,
            Self::Filo(_) => EvictionPolicy::Filo,
            Self::Lru(_) => EvictionPolicy::Lru,
            Self::Random(_) => EvictionPolicy::Random,
            Self::Sequential => EvictionPolicy::Sequential,
        }
    }

    /// Records a block that was just inserted into the store.
    ///
    /// Returns the key the ledger had to drop to make room, which only the
    /// LRU list does when it is already tracking `capacity` blocks.
    pub fn record_insertion(&mut self, addr: Addr) -> Option<Addr> {
        match self {
            Self::Fifo(queue) => {
                queue.insert(addr);
                None
            }
            Self::Filo(stack) => {
                stack.insert(addr);
                None
            }
            Self::Lru(list) => list.insert(addr),
            Self::Random(_) | Self::Sequential => None,
        }
    }

    /// Chooses the block to evict without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`Invariant::EmptyVictimSelection`] if nothing is resident.
    pub fn select_victim(&mut self, store: &BlockStore) -> Result<Addr, Invariant> {
        let victim = match self {
            Self::Fifo(queue) => queue.victim(),
            Self::Filo(stack) => stack.victim(),
            Self::Lru(list) => list.rear(),
            Self::Random(sampler) => sampler.pick(store),
            Self::Sequential => bucket::first_in_bucket_order(store),
        };
        victim.ok_or(Invariant::EmptyVictimSelection)
    }

    /// Records a hit on a resident block. Only the LRU list reorders.
    ///
    /// Returns `false` if the LRU list was not tracking `addr`.
    pub fn record_access(&mut self, addr: Addr) -> bool {
        match self {
            Self::Lru(list) => list.touch(addr),
            _ => true,
        }
    }

    /// Forgets a block that was removed from the store.
    ///
    /// Returns `false` if a list-based ledger was not tracking `addr`.
    pub fn record_removal(&mut self, addr: Addr) -> bool {
        match self {
            Self::Fifo(queue) => queue.remove(addr),
            Self::Filo(stack) => stack.remove(addr),
            Self::Lru(list) => list.remove(addr),
            Self::Random(_) | Self::Sequential => true,
        }
    }

    /// Returns the number of tracked blocks, or `None` for the bucket policies.
    pub fn tracked(&self) -> Option<usize> {
        match self {
            Self::Fifo(queue) => Some(queue.len()),
            Self::Filo(stack) => Some(stack.len()),
            Self::Lru(list) => Some(list.len()),
            Self::Random(_) | Self::Sequential => None,
        }
    }

    /// Returns the tracked blocks in eviction order (next victim first), or
    /// `None` for the bucket policies.
    pub fn eviction_order(&self) -> Option<Vec<Addr>> {
        match self {
            Self::Fifo(queue) => {
                let mut order: Vec<Addr> = queue.iter().collect();
                order.reverse();
                Some(order)
            }
            Self::Filo(stack) => Some(stack.iter().collect()),
            Self::Lru(list) => {
                let mut order = list.keys();
                order.reverse();
                Some(order)
            }
            Self::Random(_) | Self::Sequential => None,
        }
    }
}
