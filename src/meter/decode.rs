//! Decode-rate estimator over cumulative decoded/dropped frame counters.

use tokio::time::Instant;
use tracing::warn;

use crate::DecodeSnapshot;

/// Cumulative counters exposed by the bound video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeCounters {
    pub decoded: u64,
    pub dropped: u64,
    pub video_width: u32,
    pub video_height: u32,
}

/// Per-tick outcome of the decode counter.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeReading {
    /// The platform does not expose decode counters.
    Unsupported,
    Snapshot(DecodeSnapshot),
}

impl DecodeReading {
    pub fn snapshot(&self) -> Option<&DecodeSnapshot> {
        match self {
            DecodeReading::Unsupported => None,
            DecodeReading::Snapshot(snapshot) => Some(snapshot),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, DecodeReading::Snapshot(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    started_at: Instant,
    initial: DecodeCounters,
    last_tick_at: Instant,
    last_tick: DecodeCounters,
}

/// Finite-difference estimator across ticks.
///
/// Baselines are taken at session start, or at the first tick that sees
/// counters when they were unavailable at start.
#[derive(Debug, Clone, Default)]
pub struct DecodeCounter {
    baseline: Option<Baseline>,
    dropped_last_tick: u64,
}

impl DecodeCounter {
    pub fn start(counters: Option<DecodeCounters>, now: Instant) -> Self {
        Self {
            baseline: counters.map(|counters| Baseline {
                started_at: now,
                initial: counters,
                last_tick_at: now,
                last_tick: counters,
            }),
            dropped_last_tick: 0,
        }
    }

    pub fn tick(&mut self, counters: Option<DecodeCounters>, now: Instant) -> DecodeReading {
        let Some(current) = counters else {
            return DecodeReading::Unsupported;
        };
        let baseline = match self.baseline.as_mut() {
            Some(baseline) => baseline,
            None => {
                *self = Self::start(Some(current), now);
                return DecodeReading::Snapshot(empty_snapshot(current));
            }
        };

        if current.decoded < baseline.last_tick.decoded
            || current.dropped < baseline.last_tick.dropped
        {
            warn!(
                target = "decode",
                previous_decoded = baseline.last_tick.decoded,
                current_decoded = current.decoded,
                previous_dropped = baseline.last_tick.dropped,
                current_dropped = current.dropped,
                "cumulative frame counter went backwards"
            );
        }

        let delta_seconds = now.duration_since(baseline.last_tick_at).as_secs_f64();
        let total_seconds = now.duration_since(baseline.started_at).as_secs_f64();

        let session_decoded = current.decoded.saturating_sub(baseline.initial.decoded);
        let session_dropped = current.dropped.saturating_sub(baseline.initial.dropped);
        let tick_decoded = current.decoded.saturating_sub(baseline.last_tick.decoded);
        let tick_dropped = current.dropped.saturating_sub(baseline.last_tick.dropped);

        let snapshot = DecodeSnapshot {
            effective_fps_avg: rate(session_decoded.saturating_sub(session_dropped), total_seconds),
            decoded_frames: session_decoded,
            decoded_fps_avg: rate(session_decoded, total_seconds),
            current_decoded_fps: rate(tick_decoded, delta_seconds),
            dropped_frames: session_dropped,
            dropped_fps_avg: rate(session_dropped, total_seconds),
            current_dropped_fps: rate(tick_dropped, delta_seconds),
            video_width: current.video_width,
            video_height: current.video_height,
            total_decoded_frames: current.decoded,
            total_dropped_frames: current.dropped,
        };

        baseline.last_tick_at = now;
        baseline.last_tick = current;
        self.dropped_last_tick = tick_dropped;
        DecodeReading::Snapshot(snapshot)
    }

    /// Frames dropped between the two most recent ticks.
    pub fn dropped_last_tick(&self) -> u64 {
        self.dropped_last_tick
    }
}

fn empty_snapshot(counters: DecodeCounters) -> DecodeSnapshot {
    DecodeSnapshot {
        video_width: counters.video_width,
        video_height: counters.video_height,
        total_decoded_frames: counters.decoded,
        total_dropped_frames: counters.dropped,
        ..DecodeSnapshot::default()
    }
}

fn rate(frames: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        frames as f64 / seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn counters(decoded: u64, dropped: u64) -> Option<DecodeCounters> {
        Some(DecodeCounters {
            decoded,
            dropped,
            video_width: 1920,
            video_height: 1080,
        })
    }

    #[test]
    fn one_second_of_thirty_frames() {
        let start = Instant::now();
        let mut counter = DecodeCounter::start(counters(100, 4), start);
        let reading = counter.tick(counters(130, 4), start + Duration::from_secs(1));
        let snapshot = reading.snapshot().expect("supported");
        assert!((snapshot.current_decoded_fps - 30.0).abs() < 1e-9);
        assert!((snapshot.decoded_fps_avg - 30.0).abs() < 1e-9);
        assert_eq!(snapshot.decoded_frames, 30);
        assert_eq!(snapshot.total_decoded_frames, 130);
        assert_eq!(snapshot.current_dropped_fps, 0.0);
    }

    #[test]
    fn instantaneous_rate_uses_last_tick() {
        let start = Instant::now();
        let mut counter = DecodeCounter::start(counters(0, 0), start);
        counter.tick(counters(60, 0), start + Duration::from_secs(1));
        let reading = counter.tick(counters(90, 6), start + Duration::from_secs(2));
        let snapshot = reading.snapshot().expect("supported");
        assert!((snapshot.current_decoded_fps - 30.0).abs() < 1e-9);
        assert!((snapshot.decoded_fps_avg - 45.0).abs() < 1e-9);
        assert!((snapshot.current_dropped_fps - 6.0).abs() < 1e-9);
        assert!((snapshot.effective_fps_avg - 42.0).abs() < 1e-9);
        assert_eq!(counter.dropped_last_tick(), 6);
    }

    #[test]
    fn missing_counters_report_unsupported() {
        let start = Instant::now();
        let mut counter = DecodeCounter::start(None, start);
        assert_eq!(
            counter.tick(None, start + Duration::from_secs(1)),
            DecodeReading::Unsupported
        );
    }

    #[test]
    fn late_counters_take_baseline_on_first_tick() {
        let start = Instant::now();
        let mut counter = DecodeCounter::start(None, start);
        let first = counter.tick(counters(500, 2), start + Duration::from_secs(1));
        assert_eq!(first.snapshot().map(|s| s.decoded_frames), Some(0));
        let second = counter.tick(counters(530, 2), start + Duration::from_secs(2));
        let snapshot = second.snapshot().expect("supported");
        assert!((snapshot.current_decoded_fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn decreasing_counters_clamp_to_zero() {
        let start = Instant::now();
        let mut counter = DecodeCounter::start(counters(100, 10), start);
        let reading = counter.tick(counters(90, 5), start + Duration::from_secs(1));
        let snapshot = reading.snapshot().expect("supported");
        assert_eq!(snapshot.current_decoded_fps, 0.0);
        assert_eq!(snapshot.decoded_fps_avg, 0.0);
        assert_eq!(snapshot.dropped_frames, 0);
    }

    #[test]
    fn zero_elapsed_time_yields_zero_rates() {
        let start = Instant::now();
        let mut counter = DecodeCounter::start(counters(10, 0), start);
        let reading = counter.tick(counters(20, 0), start);
        let snapshot = reading.snapshot().expect("supported");
        assert_eq!(snapshot.current_decoded_fps, 0.0);
        assert_eq!(snapshot.decoded_fps_avg, 0.0);
    }
}
