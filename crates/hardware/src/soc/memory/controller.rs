//! Memory controller implementations for latency modeling.
//!
//! This module provides:
//! 1. **SimpleController:** Fixed latency per access (no row-buffer modeling).
//! 2. **DramController:** Row-buffer-aware latency (CAS, RAS, precharge) for DRAM-style timing.

use crate::common::{Addr, Cycles};
use crate::config::{MemoryConfig, MemoryController as ControllerKind};

/// Row size of the DRAM model, in bytes.
const DRAM_ROW_BYTES: u64 = 2048;

/// Trait for memory controller implementations that report access latency in cycles.
pub trait MemoryController: Send + Sync + std::fmt::Debug {
    /// Returns the number of cycles required for an access to the given address.
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical address being accessed (may be used for row-buffer modeling).
    ///
    /// # Returns
    ///
    /// Latency in memory clock cycles.
    fn access_latency(&mut self, addr: Addr) -> Cycles;
}

/// Builds the controller selected by `config`.
pub fn from_config(config: &MemoryConfig) -> Box<dyn MemoryController> {
    match config.controller {
        ControllerKind::Simple => Box::new(SimpleController::new(config.latency)),
        ControllerKind::Dram => Box::new(DramController::new(config.t_cas, config.t_ras, config.t_pre)),
    }
}

/// Fixed-latency memory controller; every access takes the same number of cycles.
#[derive(Debug, Clone)]
pub struct SimpleController {
    latency: Cycles,
}

impl SimpleController {
    /// Creates a simple controller with the given fixed latency in cycles.
    pub const fn new(latency: Cycles) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: Addr) -> Cycles {
        self.latency
    }
}

/// DRAM-style controller with one open row; models CAS, RAS, and precharge latencies.
#[derive(Debug, Clone)]
pub struct DramController {
    open_row: Option<u64>,
    t_cas: Cycles,
    t_ras: Cycles,
    t_pre: Cycles,
}

impl DramController {
    /// Creates a DRAM controller with the given timing parameters (in cycles)
    /// and no row open.
    ///
    /// # Arguments
    ///
    /// * `t_cas` - Column access strobe latency.
    /// * `t_ras` - Row access strobe latency.
    /// * `t_pre` - Precharge latency.
    pub const fn new(t_cas: Cycles, t_ras: Cycles, t_pre: Cycles) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
        }
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: Addr) -> Cycles {
        let row = addr / DRAM_ROW_BYTES;
        match self.open_row.replace(row) {
            Some(open) if open == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }
}
