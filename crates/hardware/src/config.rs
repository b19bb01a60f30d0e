//! Configuration system for the cache simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline constants (clock, line size, cache size, memory timing).
//! 2. **Structures:** Hierarchical config for the system, the cache, and main memory.
//! 3. **Enums:** Eviction policy and memory controller types.
//! 4. **Validation:** `CacheParams`, the checked and flattened view a cache is built from.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or taken from `Config::default()`.

use std::path::Path;

use serde::Deserialize;

use crate::common::{ConfigError, Cycles, Tick};

/// Default configuration constants for the simulator.
mod defaults {
    /// Ticks per clock cycle (1000 ps = 1 GHz).
    pub const CLOCK_PERIOD: u64 = 1000;

    /// System cache line size in bytes. Every cache inherits its block size from this.
    pub const CACHE_LINE: usize = 64;

    /// Default cache size in bytes (4 KiB).
    pub const CACHE_SIZE: usize = 4096;

    /// Default cache access latency in cycles.
    pub const CACHE_LATENCY: u64 = 1;

    /// Default number of CPU-side ports.
    pub const CPU_PORTS: usize = 1;

    /// Default seed of the random eviction generator.
    pub const RANDOM_SEED: u64 = 123456789;

    /// Base physical address of main memory.
    pub const MEM_BASE: u64 = 0;

    /// Size of main memory (512 MiB).
    pub const MEM_SIZE: u64 = 512 * 1024 * 1024;

    /// Fixed latency of the simple memory controller, in cycles.
    pub const MEM_LATENCY: u64 = 30;

    /// CAS latency in memory cycles.
    pub const T_CAS: u64 = 14;

    /// RAS latency in memory cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in memory cycles.
    pub const T_PRE: u64 = 14;

    /// Requests the memory accepts before it starts refusing.
    pub const MEM_QUEUE_DEPTH: usize = 16;
}

/// Block eviction policies of the cache.
///
/// Exactly one policy is active per cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvictionPolicy {
    /// Least Recently Used: evicts the block untouched for the longest time.
    #[default]
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
    /// First In First Out: evicts the oldest resident block.
    #[serde(alias = "Fifo", alias = "fifo")]
    Fifo,
    /// First In Last Out: evicts the newest resident block.
    #[serde(alias = "Filo", alias = "filo")]
    Filo,
    /// Random: samples a random non-empty store bucket, then a random entry in it.
    #[serde(alias = "Random", alias = "random")]
    Random,
    /// Sequential: evicts the first entry of the first non-empty store bucket.
    #[serde(alias = "Sequential", alias = "sequential")]
    Sequential,
}

impl std::fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lru => "LRU",
            Self::Fifo => "FIFO",
            Self::Filo => "FILO",
            Self::Random => "RANDOM",
            Self::Sequential => "SEQUENTIAL",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for EvictionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LRU" => Ok(Self::Lru),
            "FIFO" => Ok(Self::Fifo),
            "FILO" => Ok(Self::Filo),
            "RANDOM" => Ok(Self::Random),
            "SEQUENTIAL" => Ok(Self::Sequential),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

/// The policy field as written in a config file.
///
/// Either a single policy name or a list of names. A list must name exactly
/// one policy; anything else is rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PolicySelection {
    /// A single policy, e.g. `"policy": "FIFO"`.
    One(EvictionPolicy),
    /// A list of policies, e.g. `"policy": ["FIFO"]`.
    Many(Vec<EvictionPolicy>),
}

impl Default for PolicySelection {
    fn default() -> Self {
        Self::One(EvictionPolicy::default())
    }
}

impl From<EvictionPolicy> for PolicySelection {
    fn from(policy: EvictionPolicy) -> Self {
        Self::One(policy)
    }
}

impl PolicySelection {
    /// Returns the single selected policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PolicyCount`] if a list names zero or several policies.
    pub fn resolve(&self) -> Result<EvictionPolicy, ConfigError> {
        match self {
            Self::One(policy) => Ok(*policy),
            Self::Many(list) if list.len() == 1 => Ok(list[0]),
            Self::Many(list) => Err(ConfigError::PolicyCount(list.len())),
        }
    }
}

/// Main memory timing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryController {
    /// Every access takes `memory.latency` cycles.
    #[default]
    Simple,
    /// Row-buffer model using CAS, RAS, and precharge latencies.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use simcache_core::config::{Config, EvictionPolicy};
///
/// let json = r#"{
///     "system": { "clock_period": 500, "cache_line_size": 32 },
///     "cache": { "latency": 2, "size_bytes": 1024, "policy": "FIFO", "cpu_ports": 2 },
///     "memory": { "controller": "Dram", "size_bytes": 1048576 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// let params = config.cache_params().unwrap();
/// assert_eq!(params.block_size, 32);
/// assert_eq!(params.capacity, 32);
/// assert_eq!(params.policy, EvictionPolicy::Fifo);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Clock and system-wide geometry.
    #[serde(default)]
    pub system: SystemConfig,
    /// The cache under test.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Downstream main memory.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// System-wide settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Ticks per clock cycle.
    #[serde(default = "SystemConfig::default_clock_period")]
    pub clock_period: Tick,
    /// Cache line size in bytes; the cache's block size.
    #[serde(default = "SystemConfig::default_cache_line_size")]
    pub cache_line_size: usize,
}

impl SystemConfig {
    const fn default_clock_period() -> Tick {
        defaults::CLOCK_PERIOD
    }

    const fn default_cache_line_size() -> usize {
        defaults::CACHE_LINE
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            clock_period: defaults::CLOCK_PERIOD,
            cache_line_size: defaults::CACHE_LINE,
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Access latency in cycles.
    #[serde(default = "CacheConfig::default_latency")]
    pub latency: Cycles,
    /// Total data capacity in bytes.
    #[serde(default = "CacheConfig::default_size_bytes")]
    pub size_bytes: usize,
    /// Eviction policy selection.
    #[serde(default)]
    pub policy: PolicySelection,
    /// Number of CPU-side (upstream) ports.
    #[serde(default = "CacheConfig::default_cpu_ports")]
    pub cpu_ports: usize,
    /// Seed of the random eviction generator.
    #[serde(default = "CacheConfig::default_seed")]
    pub seed: u64,
}

impl CacheConfig {
    const fn default_latency() -> Cycles {
        defaults::CACHE_LATENCY
    }

    const fn default_size_bytes() -> usize {
        defaults::CACHE_SIZE
    }

    const fn default_cpu_ports() -> usize {
        defaults::CPU_PORTS
    }

    const fn default_seed() -> u64 {
        defaults::RANDOM_SEED
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            latency: defaults::CACHE_LATENCY,
            size_bytes: defaults::CACHE_SIZE,
            policy: PolicySelection::default(),
            cpu_ports: defaults::CPU_PORTS,
            seed: defaults::RANDOM_SEED,
        }
    }
}

/// Main memory settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Timing model.
    #[serde(default)]
    pub controller: MemoryController,
    /// Fixed latency for the simple controller, in cycles.
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: Cycles,
    /// CAS latency for the DRAM controller, in cycles.
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: Cycles,
    /// RAS latency for the DRAM controller, in cycles.
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: Cycles,
    /// Precharge latency for the DRAM controller, in cycles.
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: Cycles,
    /// Base physical address.
    #[serde(default = "MemoryConfig::default_base")]
    pub base: u64,
    /// Size in bytes.
    #[serde(default = "MemoryConfig::default_size_bytes")]
    pub size_bytes: u64,
    /// Timing requests in flight before the memory refuses new ones.
    #[serde(default = "MemoryConfig::default_queue_depth")]
    pub queue_depth: usize,
}

impl MemoryConfig {
    const fn default_latency() -> Cycles {
        defaults::MEM_LATENCY
    }

    const fn default_t_cas() -> Cycles {
        defaults::T_CAS
    }

    const fn default_t_ras() -> Cycles {
        defaults::T_RAS
    }

    const fn default_t_pre() -> Cycles {
        defaults::T_PRE
    }

    const fn default_base() -> u64 {
        defaults::MEM_BASE
    }

    const fn default_size_bytes() -> u64 {
        defaults::MEM_SIZE
    }

    const fn default_queue_depth() -> usize {
        defaults::MEM_QUEUE_DEPTH
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            controller: MemoryController::default(),
            latency: defaults::MEM_LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            base: defaults::MEM_BASE,
            size_bytes: defaults::MEM_SIZE,
            queue_depth: defaults::MEM_QUEUE_DEPTH,
        }
    }
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation error
    /// reported by [`Config::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Checks every cross-field constraint.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.cache_params()?;
        if self.memory.queue_depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        Ok(())
    }

    /// Builds the validated parameter set for the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the line size, clock, capacity, port count, or
    /// policy selection is invalid.
    pub fn cache_params(&self) -> Result<CacheParams, ConfigError> {
        let line = self.system.cache_line_size;
        if line == 0 || !line.is_power_of_two() {
            return Err(ConfigError::BadLineSize(line));
        }
        if self.system.clock_period == 0 {
            return Err(ConfigError::ZeroClockPeriod);
        }
        let capacity = self.cache.size_bytes / line;
        if capacity == 0 {
            return Err(ConfigError::CapacityTooSmall {
                size_bytes: self.cache.size_bytes,
                line_size: line,
            });
        }
        if self.cache.cpu_ports == 0 {
            return Err(ConfigError::NoCpuPorts);
        }
        Ok(CacheParams {
            name: String::from("system.cache"),
            latency: self.cache.latency,
            block_size: line,
            capacity,
            policy: self.cache.policy.resolve()?,
            cpu_ports: self.cache.cpu_ports,
            seed: self.cache.seed,
            clock_period: self.system.clock_period,
        })
    }
}

/// Validated parameters of one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheParams {
    /// Instance name, used as the stats prefix and in port names.
    pub name: String,
    /// Access latency in cycles.
    pub latency: Cycles,
    /// Block size in bytes (a power of two).
    pub block_size: usize,
    /// Maximum number of resident blocks (at least one).
    pub capacity: usize,
    /// Active eviction policy.
    pub policy: EvictionPolicy,
    /// Number of CPU-side ports (at least one).
    pub cpu_ports: usize,
    /// Random eviction seed.
    pub seed: u64,
    /// Ticks per cycle of the cache's clock.
    pub clock_period: Tick,
}

impl CacheParams {
    /// Returns parameters for a cache holding `capacity` blocks of
    /// `block_size` bytes, with defaults for everything else.
    pub fn new(block_size: usize, capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            name: String::from("system.cache"),
            latency: defaults::CACHE_LATENCY,
            block_size,
            capacity,
            policy,
            cpu_ports: defaults::CPU_PORTS,
            seed: defaults::RANDOM_SEED,
            clock_period: defaults::CLOCK_PERIOD,
        }
    }
}
