//! Blocking block cache simulator library.
//!
//! This crate implements an event-driven, single-outstanding-request memory
//! block cache with the following:
//! 1. **Cache:** Blocking controller, sub-block upsizing, block store, and five
//!    eviction policies (FIFO, FILO, LRU, Random, Sequential).
//! 2. **Tags:** A set-associative tag store with FIFO-by-way and LRU-by-way replacement.
//! 3. **Memory:** Sparse main memory with simple or DRAM row-buffer latency and a bounded queue.
//! 4. **Simulation:** Event queue, clock domains, trace-driven sources, and the `System` harness.
//! 5. **Support:** Configuration, packets, errors, and statistics.

/// Blocking cache: controller, engine, store, eviction ledgers, ports, and tags.
pub mod cache;
/// Common types (addresses, ticks, packets, errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Event queue, trace sources, and the end-to-end system.
pub mod sim;
/// Main memory and its latency controllers.
pub mod soc;
/// Cache statistics collection and reporting.
pub mod stats;

/// The blocking cache; construct with `SimpleCache::new`.
pub use crate::cache::SimpleCache;
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Top-level system (sources, cache, memory); construct with `System::new`.
pub use crate::sim::System;
