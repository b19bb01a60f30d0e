//! Ports and the environment the cache talks to.
//!
//! The cache never calls its neighbours directly. Every outward interaction
//! goes through the [`CacheEnv`] handed to each entry point:
//! 1. **Scheduler:** current time and delayed self-events.
//! 2. **CPU-side peer:** the request sources above the cache.
//! 3. **Memory-side peer:** the memory below the cache.
//!
//! Each side keeps a small port record holding at most one packet its peer
//! refused, which is resent when the peer signals a retry.

use crate::common::{AddrRange, Invariant, Packet, Tick};

/// Index of a CPU-side port.
pub type PortId = usize;

/// Events the cache schedules for itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEvent {
    /// The timed access for the request being serviced.
    Access(Packet),
}

/// Source of time and delivery of delayed cache events.
///
/// Every scheduled event must be handed back exactly once through
/// [`SimpleCache::process`](crate::cache::SimpleCache::process).
pub trait Scheduler {
    /// Returns the current tick.
    fn cur_tick(&self) -> Tick;

    /// Schedules `event` to fire `delay` ticks from now.
    fn schedule_after(&mut self, delay: Tick, event: CacheEvent);
}

/// The request sources connected to the CPU-side ports.
pub trait CpuSidePeer {
    /// Delivers a response on `port`. Returns the packet back if refused.
    fn recv_timing_resp(&mut self, port: PortId, pkt: Packet) -> Result<(), Packet>;

    /// Tells the source on `port` that a refused request may be resent.
    fn recv_req_retry(&mut self, port: PortId);

    /// Tells the source on `port` that the reachable address ranges changed.
    fn recv_range_change(&mut self, port: PortId);
}

/// The memory connected to the memory-side port.
pub trait MemSidePeer {
    /// Sends a timing request. Returns the packet back if refused.
    fn recv_timing_req(&mut self, pkt: Packet) -> Result<(), Packet>;

    /// Performs `pkt` immediately, without timing.
    fn recv_functional(&mut self, pkt: &mut Packet);

    /// Returns the address ranges the memory serves.
    fn addr_ranges(&self) -> Vec<AddrRange>;
}

/// Everything the cache needs from its surroundings.
pub trait CacheEnv: Scheduler + CpuSidePeer + MemSidePeer {}

impl<T: Scheduler + CpuSidePeer + MemSidePeer + ?Sized> CacheEnv for T {}

/// Upstream-facing port state.
#[derive(Debug, Clone)]
pub struct CpuSidePort {
    id: PortId,
    name: String,
    blocked_packet: Option<Packet>,
    need_retry: bool,
}

impl CpuSidePort {
    /// Creates port `id` of the cache called `owner`.
    pub fn new(owner: &str, id: PortId) -> Self {
        Self {
            id,
            name: format!("{owner}.cpu_side[{id}]"),
            blocked_packet: None,
            need_retry: false,
        }
    }

    /// Returns the port index.
    pub const fn id(&self) -> PortId {
        self.id
    }

    /// Returns the hierarchical port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the response the source refused, if any.
    pub const fn blocked_packet(&self) -> Option<&Packet> {
        self.blocked_packet.as_ref()
    }

    /// Returns `true` if a retry is owed to the source.
    pub const fn needs_retry(&self) -> bool {
        self.need_retry
    }

    /// Returns `true` if a new request can be taken on this port.
    pub const fn can_accept(&self) -> bool {
        self.blocked_packet.is_none() && !self.need_retry
    }

    /// Records that a request on this port was refused.
    pub fn refuse(&mut self) {
        self.need_retry = true;
    }

    /// Sends a response; keeps it if the source refuses.
    ///
    /// # Errors
    ///
    /// Fails if a refused response is still held.
    pub fn send_packet<P>(&mut self, pkt: Packet, peer: &mut P) -> Result<(), Invariant>
    where
        P: CpuSidePeer + ?Sized,
    {
        if self.blocked_packet.is_some() {
            return Err(Invariant::PortOccupied(self.name.clone()));
        }
        if let Err(pkt) = peer.recv_timing_resp(self.id, pkt) {
            tracing::debug!(target: "simple_cache", "{} response refused", self.name);
            self.blocked_packet = Some(pkt);
        }
        Ok(())
    }

    /// Offers the source a retry if one is owed and no response is held.
    pub fn try_send_retry<P>(&mut self, peer: &mut P)
    where
        P: CpuSidePeer + ?Sized,
    {
        if self.need_retry && self.blocked_packet.is_none() {
            self.need_retry = false;
            tracing::debug!(target: "simple_cache", "{} sending retry", self.name);
            peer.recv_req_retry(self.id);
        }
    }

    /// Resends the held response after the source asked for it.
    ///
    /// # Errors
    ///
    /// Fails with [`Invariant::SpuriousRetry`] if nothing is held.
    pub fn recv_resp_retry<P>(&mut self, peer: &mut P) -> Result<(), Invariant>
    where
        P: CpuSidePeer + ?Sized,
    {
        let pkt = self
            .blocked_packet
            .take()
            .ok_or_else(|| Invariant::SpuriousRetry(self.name.clone()))?;
        self.send_packet(pkt, peer)
    }
}

/// Downstream-facing port state.
#[derive(Debug, Clone)]
pub struct MemSidePort {
    name: String,
    blocked_packet: Option<Packet>,
}

impl MemSidePort {
    /// Creates the memory-side port of the cache called `owner`.
    pub fn new(owner: &str) -> Self {
        Self {
            name: format!("{owner}.mem_side"),
            blocked_packet: None,
        }
    }

    /// Returns the hierarchical port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the request memory refused, if any.
    pub const fn blocked_packet(&self) -> Option<&Packet> {
        self.blocked_packet.as_ref()
    }

    /// Returns `true` if a refused request is held.
    pub const fn is_blocked(&self) -> bool {
        self.blocked_packet.is_some()
    }

    /// Sends a request downstream; keeps it if memory refuses.
    ///
    /// # Errors
    ///
    /// Fails if a refused request is still held.
    pub fn send_packet<P>(&mut self, pkt: Packet, peer: &mut P) -> Result<(), Invariant>
    where
        P: MemSidePeer + ?Sized,
    {
        if self.blocked_packet.is_some() {
            return Err(Invariant::PortOccupied(self.name.clone()));
        }
        if let Err(pkt) = peer.recv_timing_req(pkt) {
            tracing::debug!(target: "simple_cache", "{} request refused", self.name);
            self.blocked_packet = Some(pkt);
        }
        Ok(())
    }

    /// Resends the held request after memory signalled a retry.
    ///
    /// # Errors
    ///
    /// Fails with [`Invariant::SpuriousRetry`] if nothing is held.
    pub fn recv_req_retry<P>(&mut self, peer: &mut P) -> Result<(), Invariant>
    where
        P: MemSidePeer + ?Sized,
    {
        let pkt = self
            .blocked_packet
            .take()
            .ok_or_else(|| Invariant::SpuriousRetry(self.name.clone()))?;
        self.send_packet(pkt, peer)
    }
}
