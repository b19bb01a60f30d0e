//! End-to-end system: trace sources, the cache, and main memory.
//!
//! `System` owns the cache and a `SystemEnv` holding everything around it.
//! The environment implements the cache's neighbour traits, turning every
//! interaction that cannot complete synchronously into an event on the queue.
//! Events are then dispatched one at a time until the queue drains.

use serde::Serialize;
use thiserror::Error;

use crate::cache::SimpleCache;
use crate::cache::port::{CacheEvent, CpuSidePeer, MemSidePeer, PortId, Scheduler};
use crate::common::{Addr, AddrRange, CacheError, ConfigError, Packet, Tick};
use crate::config::Config;
use crate::sim::event::{EventQueue, Priority};
use crate::sim::traffic::{Completion, TraceError, TraceOp, TrafficGen};
use crate::soc::memory::SimpleMemory;
use crate::stats::CacheStats;

/// Failures that stop a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// The cache hit a fatal fault.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The trace could not be loaded.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// A trace line names a port the cache does not have.
    #[error("trace line {line}: port {port} does not exist ({ports} cpu-side ports)")]
    UnknownPort {
        /// One-based trace line.
        line: usize,
        /// Requested port.
        port: PortId,
        /// Configured port count.
        ports: usize,
    },
    /// A trace line accesses bytes outside main memory.
    #[error("trace line {line}: access [{addr:#x}, +{size}) is outside memory {range}")]
    OutOfRange {
        /// One-based trace line.
        line: usize,
        /// First byte accessed.
        addr: Addr,
        /// Access size.
        size: usize,
        /// Memory range.
        range: AddrRange,
    },
}

/// Refused sources retry before new issues at the same tick.
const RETRY_PRIORITY: Priority = -1;

/// Events of the system queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// An event the cache scheduled for itself.
    Cache(CacheEvent),
    /// A source may issue its next request.
    CpuIssue(PortId),
    /// The cache offered a retry to a source.
    CpuRetry(PortId),
    /// Memory's response is ready.
    MemResponse(Packet),
    /// Memory has room for a refused request.
    MemRetry,
}

/// Everything the cache is connected to.
#[derive(Debug)]
pub struct SystemEnv {
    queue: EventQueue<Event>,
    memory: SimpleMemory,
    gens: Vec<TrafficGen>,
    range_changes: u64,
}

impl SystemEnv {
    fn schedule_next_issue(&mut self, port: PortId) {
        let now = self.queue.cur_tick();
        if let Some(tick) = self.gens.get(port).and_then(TrafficGen::next_issue_tick) {
            self.queue.schedule(tick.max(now), Event::CpuIssue(port));
        }
    }
}

impl Scheduler for SystemEnv {
    fn cur_tick(&self) -> Tick {
        self.queue.cur_tick()
    }

    fn schedule_after(&mut self, delay: Tick, event: CacheEvent) {
        self.queue.schedule_after(delay, Event::Cache(event));
    }
}

impl CpuSidePeer for SystemEnv {
    fn recv_timing_resp(&mut self, port: PortId, pkt: Packet) -> Result<(), Packet> {
        let now = self.queue.cur_tick();
        match self.gens.get_mut(port) {
            Some(tgen) => {
                if !tgen.complete(pkt, now) {
                    tracing::warn!(target: "system", "port {port}: unmatched response dropped");
                }
            }
            None => tracing::warn!(target: "system", "response {pkt} for unknown port {port}"),
        }
        self.schedule_next_issue(port);
        Ok(())
    }

    fn recv_req_retry(&mut self, port: PortId) {
        let now = self.queue.cur_tick();
        self.queue
            .schedule_with_priority(now, RETRY_PRIORITY, Event::CpuRetry(port));
    }

    fn recv_range_change(&mut self, port: PortId) {
        tracing::debug!(target: "system", "port {port}: address ranges changed");
        self.range_changes += 1;
    }
}

impl MemSidePeer for SystemEnv {
    fn recv_timing_req(&mut self, pkt: Packet) -> Result<(), Packet> {
        let now = self.queue.cur_tick();
        if let Some((when, resp)) = self.memory.recv_timing_req(pkt, now)? {
            self.queue.schedule(when, Event::MemResponse(resp));
        }
        Ok(())
    }

    fn recv_functional(&mut self, pkt: &mut Packet) {
        self.memory.recv_functional(pkt);
    }

    fn addr_ranges(&self) -> Vec<AddrRange> {
        vec![self.memory.range()]
    }
}

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimReport {
    /// Tick of the last delivered event.
    pub final_tick: Tick,
    /// `true` if every trace request completed.
    pub finished: bool,
    /// Cache statistics.
    pub stats: CacheStats,
    /// Resident block addresses at the end, sorted.
    pub resident_blocks: Vec<Addr>,
    /// Times the cache refused a request.
    pub refusals: u64,
    /// Finished requests, ordered by completion tick.
    pub completions: Vec<Completion>,
}

/// Trace sources, cache, and memory wired together.
#[derive(Debug)]
pub struct System {
    cache: SimpleCache,
    env: SystemEnv,
}

impl System {
    /// Builds a system from a validated configuration and a parsed trace.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or a trace line names an unknown
    /// port or an address outside memory.
    pub fn new(config: &Config, trace: Vec<TraceOp>) -> Result<Self, SimError> {
        config.validate()?;
        let params = config.cache_params()?;
        let cache = SimpleCache::new(&params);
        let memory = SimpleMemory::new(&config.memory, config.system.clock_period);
        Self::with_parts(cache, memory, trace)
    }

    /// Builds a system from an already constructed cache and memory.
    ///
    /// # Errors
    ///
    /// Fails if a trace line names an unknown port or an address outside
    /// memory.
    pub fn with_parts(cache: SimpleCache, memory: SimpleMemory, trace: Vec<TraceOp>) -> Result<Self, SimError> {
        let ports = cache.cpu_port_count();
        let range = memory.range();
        let mut per_port: Vec<Vec<TraceOp>> = vec![Vec::new(); ports];
        for op in trace {
            if op.port >= ports {
                return Err(SimError::UnknownPort {
                    line: op.line,
                    port: op.port,
                    ports,
                });
            }
            if !range.covers(op.addr, op.size()) {
                return Err(SimError::OutOfRange {
                    line: op.line,
                    addr: op.addr,
                    size: op.size(),
                    range,
                });
            }
            per_port[op.port].push(op);
        }

        let gens = per_port
            .into_iter()
            .enumerate()
            .map(|(port, ops)| TrafficGen::new(port, ops))
            .collect();
        let mut env = SystemEnv {
            queue: EventQueue::new(),
            memory,
            gens,
            range_changes: 0,
        };
        for port in 0..ports {
            env.schedule_next_issue(port);
        }
        Ok(Self { cache, env })
    }

    /// Returns the cache.
    pub const fn cache(&self) -> &SimpleCache {
        &self.cache
    }

    /// Returns main memory.
    pub const fn memory(&self) -> &SimpleMemory {
        &self.env.memory
    }

    /// Returns the request sources, indexed by port.
    pub fn traffic(&self) -> &[TrafficGen] {
        &self.env.gens
    }

    /// Returns the current tick.
    pub const fn now(&self) -> Tick {
        self.env.queue.cur_tick()
    }

    /// Returns how many range-change notices reached the sources.
    pub const fn range_changes(&self) -> u64 {
        self.env.range_changes
    }

    /// Returns the address ranges visible through the cache.
    pub fn addr_ranges(&self) -> Vec<AddrRange> {
        self.cache.addr_ranges(&self.env)
    }

    /// Announces an address-range change through the cache.
    pub fn announce_range_change(&mut self) {
        self.cache.recv_range_change(&mut self.env);
    }

    /// Delivers the next event.
    ///
    /// Returns `false` if the queue was empty.
    ///
    /// # Errors
    ///
    /// Returns any fatal cache fault.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let Some((now, event)) = self.env.queue.pop() else {
            return Ok(false);
        };
        tracing::trace!(target: "system", "{now}: {event:?}");
        match event {
            Event::Cache(event) => self.cache.process(event, &mut self.env)?,
            Event::CpuIssue(port) => {
                let ready = self.env.gens[port]
                    .next_issue_tick()
                    .is_some_and(|tick| tick <= now);
                if ready {
                    self.issue(port, now);
                }
            }
            Event::CpuRetry(port) => {
                if self.env.gens[port].has_refused() {
                    self.issue(port, now);
                }
            }
            Event::MemResponse(pkt) => {
                if self.env.memory.response_delivered() {
                    self.env.queue.schedule(now, Event::MemRetry);
                }
                self.cache.recv_timing_resp(pkt, &mut self.env)?;
            }
            Event::MemRetry => self.cache.recv_req_retry(&mut self.env)?,
        }
        Ok(true)
    }

    fn issue(&mut self, port: PortId, now: Tick) {
        let Some(pkt) = self.env.gens[port].take_request(now) else {
            return;
        };
        if let Err(pkt) = self.cache.recv_timing_req(port, pkt, &mut self.env) {
            self.env.gens[port].refused(pkt);
        }
    }

    /// Runs until the queue drains or the next event lies past `max_tick`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal cache fault; the simulation stops there.
    pub fn run(&mut self, max_tick: Option<Tick>) -> Result<SimReport, SimError> {
        loop {
            if let (Some(limit), Some(next)) = (max_tick, self.env.queue.peek_tick()) {
                if next > limit {
                    tracing::info!(target: "system", "stopping at tick {limit}");
                    break;
                }
            }
            if !self.step()? {
                break;
            }
        }
        Ok(self.report())
    }

    /// Summarizes the run so far.
    pub fn report(&self) -> SimReport {
        let mut completions: Vec<Completion> = self
            .env
            .gens
            .iter()
            .flat_map(|tgen| tgen.completions().iter().cloned())
            .collect();
        completions.sort_by_key(|c| (c.completed, c.port));
        SimReport {
            final_tick: self.now(),
            finished: self.env.gens.iter().all(TrafficGen::is_done),
            stats: self.cache.stats().clone(),
            resident_blocks: self.cache.resident_blocks(),
            refusals: self.env.gens.iter().map(TrafficGen::refusals).sum(),
            completions,
        }
    }

    /// Reads `size` bytes at `addr` through the cache without timing.
    ///
    /// # Errors
    ///
    /// Fails if the access spans two blocks.
    pub fn functional_read(&mut self, addr: Addr, size: usize) -> Result<Vec<u8>, SimError> {
        let mut pkt = Packet::read(0, addr, size);
        self.cache.recv_functional(&mut pkt, &mut self.env)?;
        Ok(pkt.into_data())
    }

    /// Writes `data` at `addr` through the cache without timing.
    ///
    /// # Errors
    ///
    /// Fails if the access spans two blocks.
    pub fn functional_write(&mut self, addr: Addr, data: Vec<u8>) -> Result<(), SimError> {
        let mut pkt = Packet::write(0, addr, data);
        self.cache.recv_functional(&mut pkt, &mut self.env)?;
        Ok(())
    }
}
