//! Common utilities and types used throughout the cache simulator.
//!
//! This module provides the building blocks shared by every component. It includes:
//! 1. **Address Types:** Addresses, ticks, cycles, block alignment, and address ranges.
//! 2. **Packets:** The request/response message type and its commands.
//! 3. **Error Handling:** Cache faults, invariant checks, and configuration errors.

/// Address, tick, and address-range definitions.
pub mod addr;

/// Error types for cache faults and configuration.
pub mod error;

/// Memory request/response packets.
pub mod packet;

pub use addr::{Addr, AddrRange, Cycles, Tick, block_align, block_offset, is_block_aligned};
pub use error::{CacheError, ConfigError, Invariant};
pub use packet::{FETCH_REQ_ID_BASE, INTERNAL_REQ_ID, MemCmd, Packet};
