//! Blocking block cache.
//!
//! This module implements a cache that services one request at a time. It
//! provides:
//! 1. **Controller:** `SimpleCache`, the blocked/unblocked state machine that
//!    accepts requests, schedules the timed access, forwards misses, and
//!    drives the retry handshake with its neighbours.
//! 2. **Engine:** Hit/miss classification, sub-block upsizing, and fill with
//!    eviction (`engine`).
//! 3. **Storage:** The block store and the five eviction ledgers (`store`,
//!    `ledger`).
//! 4. **Ports:** Neighbour traits and per-port retry state (`port`).
//! 5. **Tags:** A set-associative tag store with per-way replacement (`tags`).
//!
//! While a request is in service every new request is refused. Refused
//! sources are offered a retry, in port order, as soon as the cache is idle
//! again.

/// Hit/miss classification, upsizing, and fill.
pub mod engine;

/// Eviction ledgers.
pub mod ledger;

/// Port state and the traits of the cache's neighbours.
pub mod port;

/// Address-to-block storage.
pub mod store;

/// Set-associative tags with per-way replacement.
pub mod tags;

use crate::cache::engine::{AccessEngine, Forward};
use crate::cache::port::{CacheEnv, CacheEvent, CpuSidePort, MemSidePort, PortId};
use crate::common::{Addr, AddrRange, CacheError, Cycles, Invariant, Packet, Tick};
use crate::config::{CacheParams, EvictionPolicy};
use crate::sim::event::ClockDomain;
use crate::stats::CacheStats;

/// What a blocked cache is waiting for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessPhase {
    /// The timed access event is scheduled but has not fired.
    AccessPending,
    /// A miss was forwarded and its reply has not arrived.
    AwaitingDownstream {
        /// Original request of an upsized miss.
        stash: Option<Packet>,
        /// Tick at which the miss was detected.
        miss_tick: Tick,
    },
}

/// Controller state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// Ready to accept a request.
    #[default]
    Idle,
    /// Servicing the request that arrived on `waiting_port`.
    Blocked {
        /// Port the response goes back to.
        waiting_port: PortId,
        /// Progress of the request.
        phase: AccessPhase,
    },
}

/// A blocking cache with a single outstanding request.
#[derive(Debug)]
pub struct SimpleCache {
    name: String,
    latency: Cycles,
    clock: ClockDomain,
    engine: AccessEngine,
    cpu_ports: Vec<CpuSidePort>,
    mem_port: MemSidePort,
    state: ControllerState,
    stats: CacheStats,
}

impl SimpleCache {
    /// Builds an empty, idle cache.
    pub fn new(params: &CacheParams) -> Self {
        let cpu_ports = (0..params.cpu_ports)
            .map(|id| CpuSidePort::new(&params.name, id))
            .collect();
        tracing::debug!(
            target: "simple_cache",
            "{}: {} blocks of {} B, {} eviction",
            params.name,
            params.capacity,
            params.block_size,
            params.policy
        );
        Self {
            name: params.name.clone(),
            latency: params.latency,
            clock: ClockDomain::new(params.clock_period),
            engine: AccessEngine::new(
                params.block_size,
                params.capacity,
                params.policy,
                params.seed,
            ),
            cpu_ports,
            mem_port: MemSidePort::new(&params.name),
            state: ControllerState::Idle,
            stats: CacheStats::new(params.name.clone()),
        }
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collected statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Returns the controller state.
    pub const fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Returns `true` while a request is in service.
    pub const fn is_blocked(&self) -> bool {
        matches!(self.state, ControllerState::Blocked { .. })
    }

    /// Returns the block size in bytes.
    pub const fn block_size(&self) -> usize {
        self.engine.block_size()
    }

    /// Returns the active eviction policy.
    pub const fn policy(&self) -> EvictionPolicy {
        self.engine.policy()
    }

    /// Returns the access engine.
    pub const fn engine(&self) -> &AccessEngine {
        &self.engine
    }

    /// Returns `true` if the block holding `addr` is resident.
    pub fn contains(&self, addr: Addr) -> bool {
        self.engine
            .store()
            .contains(crate::common::block_align(addr, self.block_size()))
    }

    /// Returns the resident block addresses, sorted.
    pub fn resident_blocks(&self) -> Vec<Addr> {
        self.engine.store().addrs()
    }

    /// Returns CPU-side port `id`.
    pub fn cpu_port(&self, id: PortId) -> Option<&CpuSidePort> {
        self.cpu_ports.get(id)
    }

    /// Returns the number of CPU-side ports.
    pub fn cpu_port_count(&self) -> usize {
        self.cpu_ports.len()
    }

    /// Returns the memory-side port.
    pub const fn mem_port(&self) -> &MemSidePort {
        &self.mem_port
    }

    /// Offers a timing request on CPU-side port `port`.
    ///
    /// Returns the packet back if the cache is busy; the source is then
    /// owed a retry.
    pub fn recv_timing_req<E>(&mut self, port: PortId, pkt: Packet, env: &mut E) -> Result<(), Packet>
    where
        E: CacheEnv + ?Sized,
    {
        let busy = self.is_blocked() || self.mem_port.is_blocked();
        let Some(cpu) = self.cpu_ports.get_mut(port) else {
            tracing::warn!(target: "simple_cache", "{}: request on unknown port {port}", self.name);
            return Err(pkt);
        };
        if busy || !cpu.can_accept() {
            tracing::debug!(target: "simple_cache", "{}: busy, refusing {pkt}", cpu.name());
            cpu.refuse();
            return Err(pkt);
        }

        tracing::debug!(target: "simple_cache", "{}: got request {pkt}", cpu.name());
        self.state = ControllerState::Blocked {
            waiting_port: port,
            phase: AccessPhase::AccessPending,
        };
        let now = env.cur_tick();
        let delay = self.clock.clock_edge(now, self.latency) - now;
        env.schedule_after(delay, CacheEvent::Access(pkt));
        Ok(())
    }

    /// Handles an event previously scheduled through the environment.
    ///
    /// # Errors
    ///
    /// Returns any fatal fault raised while servicing the request.
    pub fn process<E>(&mut self, event: CacheEvent, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        match event {
            CacheEvent::Access(pkt) => self.access_timing(pkt, env),
        }
    }

    fn access_timing<E>(&mut self, mut pkt: Packet, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        let ControllerState::Blocked {
            waiting_port,
            phase: AccessPhase::AccessPending,
        } = self.state
        else {
            return Err(Invariant::UnexpectedAccess(pkt.addr()).into());
        };

        if self.engine.try_access(&mut pkt)? {
            self.stats.record_hit();
            let block_addr = pkt.block_addr(self.block_size());
            self.engine.touch(block_addr)?;
            tracing::debug!(target: "simple_cache", "{}: hit {pkt}", self.name);
            tracing::trace!(target: "simple_cache", "{:02x?}", pkt.data());
            if pkt.needs_response() {
                pkt.make_response();
                return self.send_response(waiting_port, pkt, env);
            }
            self.state = ControllerState::Idle;
            self.offer_retries(env);
            return Ok(());
        }

        self.stats.record_miss();
        tracing::debug!(target: "simple_cache", "{}: miss {pkt}", self.name);
        let miss_tick = env.cur_tick();
        let (fetch, stash) = self.engine.prepare_forward(pkt).map(Forward::into_parts)?;
        self.state = ControllerState::Blocked {
            waiting_port,
            phase: AccessPhase::AwaitingDownstream { stash, miss_tick },
        };
        self.mem_port.send_packet(fetch, env)?;
        Ok(())
    }

    /// Accepts a response from memory.
    ///
    /// # Errors
    ///
    /// Fails if no miss is outstanding, if the fill breaks a store invariant,
    /// or if an upsized request misses after its block arrived.
    pub fn recv_timing_resp<E>(&mut self, pkt: Packet, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        let (waiting_port, stash, miss_tick) = match std::mem::take(&mut self.state) {
            ControllerState::Blocked {
                waiting_port,
                phase: AccessPhase::AwaitingDownstream { stash, miss_tick },
            } => (waiting_port, stash, miss_tick),
            other => {
                self.state = other;
                return Err(Invariant::UnexpectedResponse(pkt.addr()).into());
            }
        };
        tracing::debug!(target: "simple_cache", "{}: got response {pkt}", self.name);

        if let Some(writeback) = self.engine.insert(&pkt)? {
            tracing::debug!(target: "simple_cache", "{}: writing back {writeback}", self.name);
            self.mem_port.send_packet(writeback, env)?;
        }
        self.stats
            .record_miss_latency(env.cur_tick().saturating_sub(miss_tick));

        let response = match stash {
            Some(mut original) => {
                if !self.engine.try_access(&mut original)? {
                    return Err(Invariant::StashMissed(original.addr()).into());
                }
                original.make_response();
                original
            }
            None => pkt,
        };
        self.send_response(waiting_port, response, env)
    }

    /// Unblocks, replies on `port`, then offers retries.
    fn send_response<E>(&mut self, port: PortId, pkt: Packet, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        self.state = ControllerState::Idle;
        tracing::debug!(target: "simple_cache", "{}: sending response {pkt}", self.name);
        if let Some(cpu) = self.cpu_ports.get_mut(port) {
            cpu.send_packet(pkt, env)?;
        }
        self.offer_retries(env);
        Ok(())
    }

    /// Offers a retry on every CPU-side port that owes one, in port order,
    /// provided a new request could be taken right now.
    fn offer_retries<E>(&mut self, env: &mut E)
    where
        E: CacheEnv + ?Sized,
    {
        if self.is_blocked() || self.mem_port.is_blocked() {
            return;
        }
        for cpu in &mut self.cpu_ports {
            cpu.try_send_retry(env);
        }
    }

    /// Resends the response held on `port` after its source asked for it.
    ///
    /// # Errors
    ///
    /// Fails if the port holds no refused response.
    pub fn recv_resp_retry<E>(&mut self, port: PortId, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        let cpu = self
            .cpu_ports
            .get_mut(port)
            .ok_or_else(|| Invariant::SpuriousRetry(format!("{}.cpu_side[{port}]", self.name)))?;
        cpu.recv_resp_retry(env)?;
        self.offer_retries(env);
        Ok(())
    }

    /// Resends the request memory refused earlier.
    ///
    /// # Errors
    ///
    /// Fails if the memory-side port holds no refused request.
    pub fn recv_req_retry<E>(&mut self, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        self.mem_port.recv_req_retry(env)?;
        self.offer_retries(env);
        Ok(())
    }

    /// Performs `pkt` immediately without timing or statistics.
    ///
    /// A hit is answered from the store; a miss is passed to memory.
    ///
    /// # Errors
    ///
    /// Fails if the packet is neither a read nor a write or spans two blocks.
    pub fn recv_functional<E>(&mut self, pkt: &mut Packet, env: &mut E) -> Result<(), CacheError>
    where
        E: CacheEnv + ?Sized,
    {
        if !self.engine.try_access(pkt)? {
            env.recv_functional(pkt);
        }
        Ok(())
    }

    /// Returns the address ranges served below the cache.
    pub fn addr_ranges<E>(&self, env: &E) -> Vec<AddrRange>
    where
        E: CacheEnv + ?Sized,
    {
        env.addr_ranges()
    }

    /// Forwards a range-change notice to every CPU-side port.
    pub fn recv_range_change<E>(&mut self, env: &mut E)
    where
        E: CacheEnv + ?Sized,
    {
        for cpu in &self.cpu_ports {
            env.recv_range_change(cpu.id());
        }
    }
}
