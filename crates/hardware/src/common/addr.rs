//! Address, tick, and address-range types.
//!
//! This module defines the scalar vocabulary shared by the cache, the memory
//! model, and the event queue. It provides the following:
//! 1. **Scalars:** `Addr`, `Tick`, and `Cycles` aliases.
//! 2. **Block Alignment:** Helpers for rounding addresses down to a block boundary.
//! 3. **Ranges:** `AddrRange`, the unit of address-range queries and range-change notices.

/// A physical byte address.
pub type Addr = u64;

/// Absolute simulated time, in ticks.
pub type Tick = u64;

/// A duration measured in clock cycles of some clock domain.
pub type Cycles = u64;

/// Rounds `addr` down to the nearest multiple of `block_size`.
///
/// `block_size` must be a power of two; configuration validation enforces this
/// for every cache built from a [`Config`](crate::config::Config).
///
/// # Arguments
///
/// * `addr` - The byte address to align.
/// * `block_size` - Block size in bytes.
///
/// # Returns
///
/// The block-aligned address containing `addr`.
#[inline(always)]
pub const fn block_align(addr: Addr, block_size: usize) -> Addr {
    addr & !(block_size as u64 - 1)
}

/// Returns the byte offset of `addr` within its block.
#[inline(always)]
pub const fn block_offset(addr: Addr, block_size: usize) -> usize {
    (addr & (block_size as u64 - 1)) as usize
}

/// Returns `true` if `addr` sits exactly on a block boundary.
#[inline(always)]
pub const fn is_block_aligned(addr: Addr, block_size: usize) -> bool {
    block_offset(addr, block_size) == 0
}

/// A contiguous, half-open range of physical addresses `[start, start + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddrRange {
    /// First address covered by the range.
    pub start: Addr,
    /// Number of bytes covered.
    pub size: u64,
}

impl AddrRange {
    /// Creates a range starting at `start` that covers `size` bytes.
    pub const fn new(start: Addr, size: u64) -> Self {
        Self { start, size }
    }

    /// Returns the first address past the end of the range.
    pub const fn end(&self) -> Addr {
        self.start.saturating_add(self.size)
    }

    /// Returns `true` if `addr` falls inside the range.
    pub const fn contains(&self, addr: Addr) -> bool {
        addr >= self.start && addr < self.end()
    }

    /// Returns `true` if the whole access `[addr, addr + len)` falls inside the range.
    pub const fn covers(&self, addr: Addr, len: usize) -> bool {
        addr >= self.start && addr.saturating_add(len as u64) <= self.end()
    }
}

impl std::fmt::Display for AddrRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:#x}:{:#x})", self.start, self.end())
    }
}
