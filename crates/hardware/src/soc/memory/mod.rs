//! Main Memory.
//!
//! This module implements the downstream memory below the cache. It provides:
//! 1. **Buffer:** Sparse backing storage (`SparseBuffer`) for memory contents.
//! 2. **Memory:** `SimpleMemory`, which performs accesses, answers after a
//!    controller-defined latency, and refuses requests once its queue is full.
//! 3. **Controller:** Latency modeling (simple or DRAM row-buffer).
//!
//! Accesses take effect when accepted; only the response is delayed.

/// Sparse backing storage.
pub mod buffer;

/// Memory controller implementations for access latency modeling.
pub mod controller;

use self::buffer::SparseBuffer;
use self::controller::MemoryController;
use crate::common::{AddrRange, Packet, Tick};
use crate::config::MemoryConfig;
use crate::sim::event::ClockDomain;

/// Fixed-range main memory with a bounded request queue.
#[derive(Debug)]
pub struct SimpleMemory {
    range: AddrRange,
    buffer: SparseBuffer,
    controller: Box<dyn MemoryController>,
    clock: ClockDomain,
    queue_depth: usize,
    in_flight: usize,
    need_retry: bool,
}

impl SimpleMemory {
    /// Creates a memory from its configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Range, timing model, and queue depth.
    /// * `clock_period` - Ticks per memory cycle.
    pub fn new(config: &MemoryConfig, clock_period: Tick) -> Self {
        Self::with_controller(
            AddrRange::new(config.base, config.size_bytes),
            controller::from_config(config),
            clock_period,
            config.queue_depth,
        )
    }

    /// Creates a memory with an explicit controller.
    pub fn with_controller(
        range: AddrRange,
        controller: Box<dyn MemoryController>,
        clock_period: Tick,
        queue_depth: usize,
    ) -> Self {
        Self {
            range,
            buffer: SparseBuffer::new(),
            controller,
            clock: ClockDomain::new(clock_period),
            queue_depth,
            in_flight: 0,
            need_retry: false,
        }
    }

    /// Returns the served address range.
    pub const fn range(&self) -> AddrRange {
        self.range
    }

    /// Returns the number of responses not yet delivered.
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Returns `true` if a refused requestor is waiting for a retry.
    pub const fn needs_retry(&self) -> bool {
        self.need_retry
    }

    /// Accepts a timing request arriving at `now`.
    ///
    /// # Returns
    ///
    /// `Ok(Some((when, response)))` for requests that need a response,
    /// `Ok(None)` for those that do not, or `Err(pkt)` if the queue is full.
    pub fn recv_timing_req(&mut self, mut pkt: Packet, now: Tick) -> Result<Option<(Tick, Packet)>, Packet> {
        if self.in_flight >= self.queue_depth {
            tracing::debug!(target: "memory", "queue full, refusing {pkt}");
            self.need_retry = true;
            return Err(pkt);
        }
        let latency = self.controller.access_latency(pkt.addr());
        self.access(&mut pkt);
        if !pkt.needs_response() {
            return Ok(None);
        }
        pkt.make_response();
        self.in_flight += 1;
        let when = self.clock.clock_edge(now, latency);
        tracing::trace!(target: "memory", "{pkt} ready at {when}");
        Ok(Some((when, pkt)))
    }

    /// Records that a response was delivered.
    ///
    /// Returns `true` if a refused requestor should now be sent a retry.
    pub fn response_delivered(&mut self) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.need_retry && self.in_flight < self.queue_depth {
            self.need_retry = false;
            return true;
        }
        false
    }

    /// Performs `pkt` immediately.
    pub fn recv_functional(&mut self, pkt: &mut Packet) {
        self.access(pkt);
    }

    fn access(&mut self, pkt: &mut Packet) {
        if !self.range.covers(pkt.addr(), pkt.size()) {
            tracing::warn!(target: "memory", "{pkt} outside {}", self.range);
        }
        let offset = pkt.addr().wrapping_sub(self.range.start);
        if pkt.is_write() {
            self.buffer.write_slice(offset, pkt.data());
        } else if pkt.is_read() {
            self.buffer.read_slice(offset, pkt.data_mut());
        }
    }
}
