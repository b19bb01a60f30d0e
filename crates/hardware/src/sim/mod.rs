//! Simulation harness.
//!
//! Provides the discrete-event machinery and the pieces needed to run the
//! cache end to end: an event queue with clock domains, trace-driven request
//! sources, and a `System` wiring sources, cache, and memory together.

/// Event queue and clock domains.
pub mod event;

/// End-to-end system and its event dispatch.
pub mod system;

/// Trace parsing and per-port request sources.
pub mod traffic;

pub use event::{ClockDomain, DEFAULT_PRIORITY, EventQueue, Priority};
pub use system::{Event, SimError, SimReport, System};
pub use traffic::{TraceError, TraceOp, TrafficGen, load_trace, parse_trace};
