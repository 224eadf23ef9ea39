//! Per-stage wall-clock instrumentation.
//!
//! A small collector the orchestrator threads through its stages. Disabled
//! collectors record nothing, so instrumentation can be switched off with
//! zero behavioral difference.

use std::collections::BTreeMap;
use std::time::Instant;

/// Collects stage durations in milliseconds, 4 decimal places.
#[derive(Debug)]
pub struct Profiler {
    enabled: bool,
    stages: BTreeMap<String, f64>,
}

impl Profiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stages: BTreeMap::new(),
        }
    }

    /// Record the elapsed time since `started` under a stage label.
    pub fn record(&mut self, stage: &str, started: Instant) {
        if !self.enabled {
            return;
        }
        let ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stages.insert(stage.to_string(), (ms * 10_000.0).round() / 10_000.0);
    }

    /// The collected stages, or None when profiling was disabled or nothing
    /// was recorded.
    pub fn into_stages(self) -> Option<BTreeMap<String, f64>> {
        (self.enabled && !self.stages.is_empty()).then_some(self.stages)
    }
}
