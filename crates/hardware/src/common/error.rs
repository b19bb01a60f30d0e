//! Error definitions.
//!
//! This module defines the failure modes of the cache and its configuration. It provides:
//! 1. **Cache Faults:** `CacheError`, every condition that must stop a simulation.
//! 2. **Invariants:** `Invariant`, the internal consistency checks behind `CacheError::InvariantViolation`.
//! 3. **Configuration:** `ConfigError`, raised while loading or validating a `Config`.
//!
//! A refused request (the cache is busy) is not an error: the port hands the
//! packet back and the requestor waits for a retry.

use std::path::PathBuf;

use thiserror::Error;

use super::addr::Addr;
use super::packet::MemCmd;

/// Fatal cache faults.
///
/// None of these are recoverable. They either mean the surrounding system broke
/// the cache's usage contract or that the cache itself is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// An access covers bytes in two different blocks.
    #[error(
        "access [{addr:#x}, +{size}) spans multiple cache lines (block size {block_size})"
    )]
    UnsupportedSpan {
        /// First byte of the access.
        addr: Addr,
        /// Access size in bytes.
        size: usize,
        /// Cache block size in bytes.
        block_size: usize,
    },

    /// A packet that is neither a read nor a write reached the access path.
    #[error("unknown packet type {cmd} for address {addr:#x}")]
    UnknownRequestKind {
        /// Offending command.
        cmd: MemCmd,
        /// Packet address.
        addr: Addr,
    },

    /// An internal consistency check failed.
    #[error("cache invariant violated: {0}")]
    InvariantViolation(Invariant),
}

/// Internal consistency checks of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invariant {
    /// Insert of a block that is already resident.
    #[error("block {0:#x} is already resident")]
    DuplicateInsert(Addr),
    /// Insert of an address that is not block aligned.
    #[error("insert address {0:#x} is not block aligned")]
    UnalignedInsert(Addr),
    /// Insert of a buffer whose length differs from the block size.
    #[error("block {addr:#x} has {len} bytes, expected {block_size}")]
    BlockSizeMismatch {
        /// Block address.
        addr: Addr,
        /// Supplied buffer length.
        len: usize,
        /// Configured block size.
        block_size: usize,
    },
    /// Insert into a full store without evicting first.
    #[error("store is full ({0} blocks); a victim must be evicted before inserting")]
    StoreFull(usize),
    /// Insert of a packet that is not a response.
    #[error("inserted packet for {0:#x} is not a response")]
    NotAResponse(Addr),
    /// A stashed request missed right after its block was inserted.
    #[error("stashed request for {0:#x} missed after its block was inserted")]
    StashMissed(Addr),
    /// A victim was requested while nothing is resident.
    #[error("victim selection on an empty store")]
    EmptyVictimSelection,
    /// The eviction ledger and the block store disagree about residency.
    #[error("eviction ledger and block store disagree about block {0:#x}")]
    LedgerDesync(Addr),
    /// A downstream response arrived while no miss was outstanding.
    #[error("unexpected downstream response for {0:#x}")]
    UnexpectedResponse(Addr),
    /// A missed request expects no response, so it cannot be forwarded.
    #[error("missed {cmd} for {addr:#x} expects no response")]
    MissWithoutResponse {
        /// Offending command.
        cmd: MemCmd,
        /// Packet address.
        addr: Addr,
    },
    /// An access event fired while no request was pending.
    #[error("access event for {0:#x} fired with no pending request")]
    UnexpectedAccess(Addr),
    /// A retry arrived for a port that holds no refused packet.
    #[error("retry received on {0} with no blocked packet")]
    SpuriousRetry(String),
    /// A port was asked to send while it still holds a refused packet.
    #[error("{0} already holds a blocked packet")]
    PortOccupied(String),
}

impl From<Invariant> for CacheError {
    fn from(inv: Invariant) -> Self {
        Self::InvariantViolation(inv)
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration text is not valid JSON for `Config`.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The line size is zero or not a power of two.
    #[error("cache line size {0} must be a non-zero power of two")]
    BadLineSize(usize),
    /// The clock period is zero.
    #[error("clock period must be at least one tick")]
    ZeroClockPeriod,
    /// The cache cannot hold a single block.
    #[error("cache size {size_bytes} B cannot hold one {line_size} B block")]
    CapacityTooSmall {
        /// Configured cache size.
        size_bytes: usize,
        /// Configured block size.
        line_size: usize,
    },
    /// The cache has no CPU-side ports.
    #[error("cache needs at least one cpu-side port")]
    NoCpuPorts,
    /// Zero or several eviction policies were selected.
    #[error("exactly one eviction policy must be selected, got {0}")]
    PolicyCount(usize),
    /// A policy name is not recognized.
    #[error("unknown eviction policy {0:?} (expected FIFO, FILO, LRU, RANDOM or SEQUENTIAL)")]
    UnknownPolicy(String),
    /// The memory request queue has no room at all.
    #[error("memory queue depth must be at least one")]
    ZeroQueueDepth,
}
