/* src/metrics.rs */
//! Lightweight metrics that emit structured `tracing` events.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

/// A monotonically increasing counter metric.
#[derive(Debug)]
pub struct Counter {
    /// Name of the counter metric.
    name: &'static str,
    /// Atomic value of the counter.
    value: AtomicU64,
}

impl Counter {
    /// Creates a new `Counter` with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self { name, value: AtomicU64::new(0) }
    }

    /// Increments the counter by a given delta.
    pub fn increment(&self, delta: u64) {
        let new_value = self.value.fetch_add(delta, Ordering::Relaxed) + delta;
        trace!(
            metric_type = "counter",
            metric_name = self.name,
            value = new_value,
            delta,
            "Counter incremented"
        );
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Metric name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A gauge metric; the last value set is kept for reads.
#[derive(Debug)]
pub struct Gauge {
    /// Name of the gauge metric.
    name: &'static str,
    /// Last value, stored as `f64` bits.
    bits: AtomicU64,
}

impl Gauge {
    /// Creates a new `Gauge` with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self { name, bits: AtomicU64::new(0) }
    }

    /// Sets the gauge to a new value.
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        debug!(
            metric_type = "gauge",
            metric_name = self.name,
            value,
            "Gauge updated"
        );
    }

    /// Last value set (zero before the first `set`).
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
