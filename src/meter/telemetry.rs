//! Counters describing what the estimators did with their input.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::estimator::FrameVerdict;

#[derive(Debug, Default)]
struct TelemetryState {
    verdicts: HashMap<&'static str, u64>,
    seeks: u64,
    ticks: u64,
    samples: u64,
    unsupported_ticks: u64,
}

/// Snapshot of telemetry suitable for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub verdicts: Vec<(String, u64)>,
    pub seeks: u64,
    pub ticks: u64,
    pub samples: u64,
    pub unsupported_ticks: u64,
}

impl TelemetrySnapshot {
    pub fn verdict_count(&self, verdict: FrameVerdict) -> u64 {
        self.verdicts
            .iter()
            .find(|(name, _)| name == verdict.as_str())
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn frames_seen(&self) -> u64 {
        self.verdicts.iter().map(|(_, count)| count).sum()
    }
}

/// Shared sink capturing estimator events.
#[derive(Clone, Default)]
pub struct TelemetrySink {
    state: Arc<Mutex<TelemetryState>>,
}

impl TelemetrySink {
    pub fn record_frame(&self, verdict: FrameVerdict) {
        let mut state = self.state.lock().expect("telemetry mutex poisoned");
        *state.verdicts.entry(verdict.as_str()).or_insert(0) += 1;
    }

    pub fn record_seek(&self) {
        let mut state = self.state.lock().expect("telemetry mutex poisoned");
        state.seeks += 1;
    }

    /// Records a tick and whether it produced a sample.
    pub fn record_tick(&self, sampled: bool, decode_supported: bool) {
        let mut state = self.state.lock().expect("telemetry mutex poisoned");
        state.ticks += 1;
        if sampled {
            state.samples += 1;
        }
        if !decode_supported {
            state.unsupported_ticks += 1;
        }
    }

    /// Exposes a snapshot for diagnostics and testing.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let state = self.state.lock().expect("telemetry mutex poisoned");
        let mut verdicts: Vec<(String, u64)> = state
            .verdicts
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        verdicts.sort();
        TelemetrySnapshot {
            verdicts,
            seeks: state.seeks,
            ticks: state.ticks,
            samples: state.samples,
            unsupported_ticks: state.unsupported_ticks,
        }
    }
}
