//! Frame-interval rate estimator fed by per-frame presentation callbacks.

use crate::{FrameMeasurement, round2};

/// Reading produced once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateReading {
    pub fps: u32,
    pub latency_ms: f64,
}

/// Outcome of feeding a single frame into the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameVerdict {
    Accepted,
    /// Interval was zero, non-finite, or above the configured bound.
    InvalidInterval,
    /// First frame after a seek.
    PostSeek,
    /// Playback rate differs from 1x.
    OffSpeed,
    BufferFull,
}

impl FrameVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameVerdict::Accepted => "accepted",
            FrameVerdict::InvalidInterval => "invalid_interval",
            FrameVerdict::PostSeek => "post_seek",
            FrameVerdict::OffSpeed => "off_speed",
            FrameVerdict::BufferFull => "buffer_full",
        }
    }
}

/// Tunables for [`RateEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorSettings {
    pub interval_capacity: usize,
    pub max_frame_interval_secs: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            interval_capacity: 50,
            max_frame_interval_secs: 1.0,
        }
    }
}

/// Accumulates frame intervals and display latencies between ticks.
///
/// Intervals are derived from consecutive frame callbacks as media time
/// advanced per presented frame. The estimator keeps the last published
/// fps when a tick arrives with no usable intervals.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    settings: EstimatorSettings,
    intervals: Vec<f64>,
    latencies: Vec<f64>,
    previous: FrameMeasurement,
    post_seek: bool,
    reading: RateReading,
}

impl RateEstimator {
    pub fn new(settings: EstimatorSettings) -> Self {
        Self {
            intervals: Vec::with_capacity(settings.interval_capacity),
            latencies: Vec::new(),
            previous: FrameMeasurement::default(),
            post_seek: false,
            reading: RateReading::default(),
            settings,
        }
    }

    /// Feeds one presented frame.
    pub fn on_frame(&mut self, frame: &FrameMeasurement, playback_rate: f64) -> FrameVerdict {
        let media_time_diff = (frame.media_time - self.previous.media_time).abs();
        let frame_count_diff = frame
            .presented_frame_count
            .abs_diff(self.previous.presented_frame_count);
        let diff = media_time_diff / frame_count_diff as f64;

        let verdict = if self.post_seek {
            FrameVerdict::PostSeek
        } else if !diff.is_finite()
            || diff <= 0.0
            || diff >= self.settings.max_frame_interval_secs
        {
            FrameVerdict::InvalidInterval
        } else if self.intervals.len() >= self.settings.interval_capacity {
            FrameVerdict::BufferFull
        } else if playback_rate != 1.0 {
            FrameVerdict::OffSpeed
        } else {
            self.intervals.push(diff);
            FrameVerdict::Accepted
        };

        self.post_seek = false;
        self.previous = *frame;
        self.latencies.push(frame.latency_ms());
        verdict
    }

    /// Drops the most recent interval and excludes the next frame's interval.
    pub fn on_seek(&mut self) {
        self.intervals.pop();
        self.post_seek = true;
    }

    /// Publishes the reading for the elapsed tick and clears both buffers.
    pub fn on_tick(&mut self) -> RateReading {
        if let Some(mean) = mean(&self.intervals) {
            self.reading.fps = (1.0 / mean).round() as u32;
        }
        self.reading.latency_ms = round2(mean(&self.latencies).unwrap_or(0.0));
        self.intervals.clear();
        self.latencies.clear();
        self.reading
    }

    /// Last published reading.
    pub fn reading(&self) -> RateReading {
        self.reading
    }

    pub fn buffered_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn buffered_latencies(&self) -> usize {
        self.latencies.len()
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(EstimatorSettings::default())
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f64 = 0.0333;

    fn frame(index: u64) -> FrameMeasurement {
        FrameMeasurement {
            media_time: index as f64 * STEP,
            presented_frame_count: index,
            expected_display_time: 1000.0 + index as f64 * 33.3 + 16.0,
            presentation_time: 1000.0 + index as f64 * 33.3,
        }
    }

    #[test]
    fn thirty_even_frames_yield_thirty_fps() {
        let mut estimator = RateEstimator::default();
        for index in 1..=30 {
            assert_eq!(estimator.on_frame(&frame(index), 1.0), FrameVerdict::Accepted);
        }
        let reading = estimator.on_tick();
        assert_eq!(reading.fps, 30);
        assert!((reading.latency_ms - 16.0).abs() < 1e-9);
    }

    #[test]
    fn seek_pops_last_interval_and_excludes_next() {
        let mut estimator = RateEstimator::default();
        for index in 1..=15 {
            estimator.on_frame(&frame(index), 1.0);
        }
        estimator.on_seek();
        assert_eq!(estimator.buffered_intervals(), 14);
        assert_eq!(estimator.on_frame(&frame(16), 1.0), FrameVerdict::PostSeek);
        for index in 17..=30 {
            estimator.on_frame(&frame(index), 1.0);
        }
        assert_eq!(estimator.buffered_intervals(), 28);
        assert_eq!(estimator.on_tick().fps, 30);
    }

    #[test]
    fn seek_on_empty_buffer_still_excludes_next_frame() {
        let mut estimator = RateEstimator::default();
        estimator.on_seek();
        assert_eq!(estimator.buffered_intervals(), 0);
        assert_eq!(estimator.on_frame(&frame(1), 1.0), FrameVerdict::PostSeek);
        assert_eq!(estimator.buffered_intervals(), 0);
        assert_eq!(estimator.on_frame(&frame(2), 1.0), FrameVerdict::Accepted);
        assert_eq!(estimator.buffered_intervals(), 1);
    }

    #[test]
    fn repeated_frame_count_is_rejected() {
        let mut estimator = RateEstimator::default();
        estimator.on_frame(&frame(1), 1.0);
        let mut repeat = frame(1);
        repeat.media_time += STEP;
        assert_eq!(estimator.on_frame(&repeat, 1.0), FrameVerdict::InvalidInterval);
        assert_eq!(estimator.buffered_intervals(), 1);
        assert_eq!(estimator.buffered_latencies(), 2);
    }

    #[test]
    fn off_speed_playback_is_rejected() {
        let mut estimator = RateEstimator::default();
        assert_eq!(estimator.on_frame(&frame(1), 2.0), FrameVerdict::OffSpeed);
        assert_eq!(estimator.buffered_intervals(), 0);
    }

    #[test]
    fn buffer_is_bounded() {
        let mut estimator = RateEstimator::new(EstimatorSettings {
            interval_capacity: 3,
            ..EstimatorSettings::default()
        });
        for index in 1..=3 {
            estimator.on_frame(&frame(index), 1.0);
        }
        assert_eq!(estimator.on_frame(&frame(4), 1.0), FrameVerdict::BufferFull);
    }

    #[test]
    fn empty_tick_keeps_previous_fps_and_clears_buffers() {
        let mut estimator = RateEstimator::default();
        assert_eq!(estimator.on_tick().fps, 0);
        for index in 1..=10 {
            estimator.on_frame(&frame(index), 1.0);
        }
        assert_eq!(estimator.on_tick().fps, 30);
        let stale = estimator.on_tick();
        assert_eq!(stale.fps, 30);
        assert_eq!(stale.latency_ms, 0.0);
        assert_eq!(estimator.buffered_intervals(), 0);
        assert_eq!(estimator.buffered_latencies(), 0);
    }
}
