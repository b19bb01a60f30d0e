//! Cache statistics collection and reporting.
//!
//! This module tracks the performance counters of a cache. It provides:
//! 1. **Counters:** Hits and misses, from which the hit ratio is derived.
//! 2. **Miss latency:** A histogram of ticks from a miss to its fill.
//! 3. **Reporting:** A `name value # description` text dump and a JSON form.

use std::fmt;

use serde::Serialize;

use crate::common::Tick;

/// Fixed-width histogram whose bucket width doubles whenever a sample
/// falls past the last bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Histogram {
    buckets: Vec<u64>,
    bucket_size: u64,
    samples: u64,
    sum: u64,
    min: Option<u64>,
    max: Option<u64>,
}

impl Histogram {
    /// Number of buckets.
    pub const BUCKETS: usize = 16;

    /// Creates an empty histogram with unit-width buckets.
    pub fn new() -> Self {
        Self {
            buckets: vec![0; Self::BUCKETS],
            bucket_size: 1,
            samples: 0,
            sum: 0,
            min: None,
            max: None,
        }
    }

    /// Adds one sample.
    pub fn sample(&mut self, value: u64) {
        // Once the span no longer fits in a u64 the last bucket reaches u64::MAX.
        while self
            .bucket_size
            .checked_mul(Self::BUCKETS as u64)
            .is_some_and(|span| value >= span)
        {
            self.grow();
        }
        let index = (value / self.bucket_size) as usize;
        self.buckets[index] += 1;
        self.samples += 1;
        self.sum = self.sum.saturating_add(value);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Doubles the bucket width, folding adjacent buckets together.
    fn grow(&mut self) {
        for i in 0..Self::BUCKETS / 2 {
            self.buckets[i] = self.buckets[2 * i] + self.buckets[2 * i + 1];
        }
        for bucket in &mut self.buckets[Self::BUCKETS / 2..] {
            *bucket = 0;
        }
        self.bucket_size *= 2;
    }

    /// Returns the per-bucket counts.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Returns the current bucket width.
    pub const fn bucket_size(&self) -> u64 {
        self.bucket_size
    }

    /// Returns the number of samples.
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Returns the sum of all samples.
    pub const fn sum(&self) -> u64 {
        self.sum
    }

    /// Returns the smallest sample.
    pub const fn min(&self) -> Option<u64> {
        self.min
    }

    /// Returns the largest sample.
    pub const fn max(&self) -> Option<u64> {
        self.max
    }

    /// Returns the mean sample, or 0 with no samples.
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.sum as f64 / self.samples as f64
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters of one cache.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheStats {
    /// Hierarchical name used as the stat prefix.
    pub name: String,
    /// Number of hits.
    pub hits: u64,
    /// Number of misses.
    pub misses: u64,
    /// Ticks from a miss to its fill.
    pub miss_latency: Histogram,
}

impl CacheStats {
    /// Creates zeroed stats for the cache called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: 0,
            misses: 0,
            miss_latency: Histogram::new(),
        }
    }

    /// Records a hit.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a miss.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records the latency of a completed miss.
    pub fn record_miss_latency(&mut self, ticks: Tick) {
        self.miss_latency.sample(ticks);
    }

    /// Returns hits / (hits + misses), or 0 before any access.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        let lat = &self.miss_latency;
        writeln!(f, "{:<40} {:>12} # Number of hits", format!("{name}.hits"), self.hits)?;
        writeln!(f, "{:<40} {:>12} # Number of misses", format!("{name}.misses"), self.misses)?;
        writeln!(
            f,
            "{:<40} {:>12} # Number of miss latency samples",
            format!("{name}.missLatency::samples"),
            lat.samples()
        )?;
        writeln!(
            f,
            "{:<40} {:>12.2} # Mean ticks from miss to fill",
            format!("{name}.missLatency::mean"),
            lat.mean()
        )?;
        for (i, count) in lat.buckets().iter().enumerate() {
            let lo = i as u64 * lat.bucket_size();
            let hi = lo + lat.bucket_size() - 1;
            writeln!(
                f,
                "{:<40} {:>12} # Ticks from miss to fill",
                format!("{name}.missLatency::{lo}-{hi}"),
                count
            )?;
        }
        if let (Some(min), Some(max)) = (lat.min(), lat.max()) {
            writeln!(f, "{:<40} {:>12} # Smallest miss latency", format!("{name}.missLatency::min_value"), min)?;
            writeln!(f, "{:<40} {:>12} # Largest miss latency", format!("{name}.missLatency::max_value"), max)?;
        }
        writeln!(
            f,
            "{:<40} {:>12.6} # The ratio of hits to the total accesses to the cache",
            format!("{name}.hitRatio"),
            self.hit_ratio()
        )
    }
}
