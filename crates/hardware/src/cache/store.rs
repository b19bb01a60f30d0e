//! Block Store.
//!
//! Maps block-aligned addresses to whole-block byte buffers. This is the
//! ground truth of cached data: a block is either fully resident or absent.
//!
//! The store is a chained hash table with a fixed number of buckets (the
//! smallest prime not below the capacity). Buckets are exposed read-only so
//! that the random and sequential eviction policies can sample them directly.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `get()` / `contains()` / `remove()`: O(1) expected, O(bucket length) worst case
//!   - `insert()`: O(1) expected
//! - **Space Complexity:** O(C × B) where C is the capacity and B the block size

use crate::common::{Addr, Invariant, is_block_aligned};

/// One resident block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Block-aligned address.
    pub addr: Addr,
    /// Exactly `block_size` bytes.
    pub data: Box<[u8]>,
}

/// Bounded map from block address to block data.
#[derive(Debug)]
pub struct BlockStore {
    buckets: Vec<Vec<Block>>,
    len: usize,
    block_size: usize,
    capacity: usize,
}

impl BlockStore {
    /// Creates an empty store for `capacity` blocks of `block_size` bytes.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Bytes per block; must be a power of two.
    /// * `capacity` - Maximum number of resident blocks; must be non-zero.
    pub fn new(block_size: usize, capacity: usize) -> Self {
        debug_assert!(block_size.is_power_of_two());
        debug_assert!(capacity > 0);
        let bucket_count = next_prime(capacity);
        Self {
            buckets: vec![Vec::new(); bucket_count],
            len: 0,
            block_size,
            capacity,
        }
    }

    /// Returns the number of resident blocks.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no block is resident.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum number of resident blocks.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if an insert would need an eviction first.
    pub const fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Returns the block size in bytes.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the number of hash buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the entries chained in bucket `index`.
    pub fn bucket(&self, index: usize) -> &[Block] {
        &self.buckets[index]
    }

    /// Returns the number of entries chained in bucket `index`.
    pub fn bucket_len(&self, index: usize) -> usize {
        self.buckets[index].len()
    }

    /// Returns the bucket an address hashes to.
    pub fn bucket_of(&self, addr: Addr) -> usize {
        ((addr / self.block_size as u64) % self.buckets.len() as u64) as usize
    }

    /// Returns `true` if the block at `addr` is resident.
    pub fn contains(&self, addr: Addr) -> bool {
        self.get(addr).is_some()
    }

    /// Returns the data of the block at `addr`.
    pub fn get(&self, addr: Addr) -> Option<&[u8]> {
        self.buckets[self.bucket_of(addr)]
            .iter()
            .find(|b| b.addr == addr)
            .map(|b| &*b.data)
    }

    /// Returns the data of the block at `addr` mutably.
    pub fn get_mut(&mut self, addr: Addr) -> Option<&mut [u8]> {
        let index = self.bucket_of(addr);
        self.buckets[index]
            .iter_mut()
            .find(|b| b.addr == addr)
            .map(|b| &mut *b.data)
    }

    /// Inserts a block.
    ///
    /// # Errors
    ///
    /// Fails without modifying the store if `addr` is unaligned, already
    /// resident, `data` is not exactly one block, or the store is full.
    pub fn insert(&mut self, addr: Addr, data: Box<[u8]>) -> Result<(), Invariant> {
        if !is_block_aligned(addr, self.block_size) {
            return Err(Invariant::UnalignedInsert(addr));
        }
        if data.len() != self.block_size {
            return Err(Invariant::BlockSizeMismatch {
                addr,
                len: data.len(),
                block_size: self.block_size,
            });
        }
        if self.contains(addr) {
            return Err(Invariant::DuplicateInsert(addr));
        }
        if self.is_full() {
            return Err(Invariant::StoreFull(self.len));
        }
        let index = self.bucket_of(addr);
        self.buckets[index].push(Block { addr, data });
        self.len += 1;
        Ok(())
    }

    /// Removes the block at `addr` and returns its data.
    pub fn remove(&mut self, addr: Addr) -> Option<Box<[u8]>> {
        let index = self.bucket_of(addr);
        let bucket = &mut self.buckets[index];
        let pos = bucket.iter().position(|b| b.addr == addr)?;
        self.len -= 1;
        Some(bucket.remove(pos).data)
    }

    /// Iterates over resident blocks in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.buckets.iter().flatten()
    }

    /// Returns the resident block addresses, sorted.
    pub fn addrs(&self) -> Vec<Addr> {
        let mut addrs: Vec<Addr> = self.iter().map(|b| b.addr).collect();
        addrs.sort_unstable();
        addrs
    }
}

/// Smallest prime `>= n` (and at least 2).
fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
