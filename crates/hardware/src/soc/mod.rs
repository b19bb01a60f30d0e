//! System-on-Chip (SoC) Components.
//!
//! Components that sit below the cache. Currently this is main memory with
//! its latency controllers.

/// Main memory and its controllers.
pub mod memory;

pub use memory::SimpleMemory;
