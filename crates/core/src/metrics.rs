// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics surface (spec §6): "counter/histogram surface for spawns,
//! completions, failures, timeouts, messages, checkpoints, heartbeat
//! interval, agent duration." Out of scope are the concrete exporters
//! (Prometheus, StatsD, ...); this crate only defines the trait the
//! supervisor calls into.

use std::sync::Arc;

/// Named counter/histogram sink. Implementations forward to whatever
/// telemetry backend the deployment wires up; the supervisor only ever
/// depends on this trait.
pub trait Metrics: Send + Sync {
    fn counter(&self, name: &str, value: u64);
    fn histogram(&self, name: &str, value: f64);
}

/// Discards every observation. Used when no telemetry sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn counter(&self, _name: &str, _value: u64) {}
    fn histogram(&self, _name: &str, _value: f64) {}
}

pub type SharedMetrics = Arc<dyn Metrics>;

pub fn noop_metrics() -> SharedMetrics {
    Arc::new(NoopMetrics)
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::Metrics;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Records every observation in memory for assertions in tests.
    #[derive(Debug, Default)]
    pub struct RecordingMetrics {
        counters: Mutex<HashMap<String, u64>>,
        histograms: Mutex<HashMap<String, Vec<f64>>>,
    }

    impl RecordingMetrics {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn counter_value(&self, name: &str) -> u64 {
            *self.counters.lock().get(name).unwrap_or(&0)
        }

        pub fn histogram_values(&self, name: &str) -> Vec<f64> {
            self.histograms.lock().get(name).cloned().unwrap_or_default()
        }
    }

    impl Metrics for RecordingMetrics {
        fn counter(&self, name: &str, value: u64) {
            *self.counters.lock().entry(name.to_string()).or_insert(0) += value;
        }

        fn histogram(&self, name: &str, value: f64) {
            self.histograms.lock().entry(name.to_string()).or_default().push(value);
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
