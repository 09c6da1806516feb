//! Idle/Recording state machine accumulating one sample per tick.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    DecodeSnapshot, RateSample, SCHEMA_VERSION, SessionRecording,
    meter::{decode::DecodeReading, estimator::RateReading},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording { started_at: Instant },
}

/// Collects [`RateSample`]s for the duration of a session.
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    state: RecorderState,
    samples: Vec<RateSample>,
    last_second: Option<u64>,
    elapsed_time: String,
    last_decode: Option<DecodeSnapshot>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            samples: Vec::new(),
            last_second: None,
            elapsed_time: format_elapsed(0),
            last_decode: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Enters `Recording`, discarding samples from any previous session.
    pub fn start(&mut self, now: Instant) {
        self.samples.clear();
        self.last_second = None;
        self.last_decode = None;
        self.elapsed_time = format_elapsed(0);
        self.state = RecorderState::Recording { started_at: now };
        info!(target = "recorder", "recording started");
    }

    /// Appends the sample for one tick. Returns `None` while idle or when
    /// the tick rounds to a second that already has a sample.
    pub fn record_tick(
        &mut self,
        now: Instant,
        reading: RateReading,
        decode: &DecodeReading,
        dropped_last_tick: u64,
    ) -> Option<&RateSample> {
        let RecorderState::Recording { started_at } = self.state else {
            return None;
        };
        let second = whole_seconds(now.duration_since(started_at));
        self.elapsed_time = format_elapsed(second);

        let snapshot = decode.snapshot();
        self.last_decode = snapshot.cloned();
        if self.last_second.is_some_and(|last| second <= last) {
            debug!(target = "recorder", second, "tick collapsed onto previous second");
            return None;
        }
        self.last_second = Some(second);

        self.samples.push(RateSample {
            fps: reading.fps,
            time: second.to_string(),
            latency_ms: reading.latency_ms,
            decoded_fps: snapshot.map(|s| s.current_decoded_fps).unwrap_or(0.0),
            dropped_frame_count: if snapshot.is_some() { dropped_last_tick } else { 0 },
            effective_fps_avg: snapshot.map(|s| s.effective_fps_avg).unwrap_or(0.0),
        });
        self.samples.last()
    }

    /// Returns to `Idle`. Yields the recording unless no samples were taken.
    pub fn stop(&mut self, now: Instant, refresh_rate_hz: u32) -> Option<SessionRecording> {
        let RecorderState::Recording { started_at } = self.state else {
            return None;
        };
        self.state = RecorderState::Idle;
        self.elapsed_time = format_elapsed(whole_seconds(now.duration_since(started_at)));

        let samples = std::mem::take(&mut self.samples);
        info!(
            target = "recorder",
            samples = samples.len(),
            elapsed = %self.elapsed_time,
            "recording stopped"
        );
        if samples.is_empty() {
            return None;
        }
        Some(SessionRecording {
            schema_version: SCHEMA_VERSION,
            elapsed_time: self.elapsed_time.clone(),
            refresh_rate_hz,
            samples,
            decode_stats: self.last_decode.take(),
        })
    }

    /// Single user action: starts when idle, stops when recording.
    pub fn toggle(&mut self, now: Instant, refresh_rate_hz: u32) -> Option<SessionRecording> {
        if self.is_recording() {
            self.stop(now, refresh_rate_hz)
        } else {
            self.start(now);
            None
        }
    }

    /// Elapsed time shown while recording, `HH:MM:SS`.
    pub fn elapsed_time(&self) -> &str {
        &self.elapsed_time
    }

    pub fn samples(&self) -> &[RateSample] {
        &self.samples
    }
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Elapsed wall-clock time rounded to the nearest second.
pub fn whole_seconds(elapsed: Duration) -> u64 {
    (elapsed.as_millis() as u64 + 500) / 1000
}

pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(fps: u32) -> RateReading {
        RateReading {
            fps,
            latency_ms: 12.5,
        }
    }

    fn snapshot() -> DecodeReading {
        DecodeReading::Snapshot(DecodeSnapshot {
            current_decoded_fps: 29.0,
            effective_fps_avg: 28.0,
            ..DecodeSnapshot::default()
        })
    }

    #[test]
    fn formats_elapsed_time() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(61), "00:01:01");
        assert_eq!(format_elapsed(3 * 3600 + 25 * 60 + 7), "03:25:07");
    }

    #[test]
    fn rounds_to_nearest_second() {
        assert_eq!(whole_seconds(Duration::from_millis(1499)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
    }

    #[test]
    fn samples_are_appended_in_order() {
        let start = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start(start);
        for second in 1..=3 {
            let now = start + Duration::from_secs(second);
            assert!(recorder.record_tick(now, reading(30), &snapshot(), 2).is_some());
        }
        let times: Vec<&str> = recorder.samples().iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, ["1", "2", "3"]);
        assert_eq!(recorder.elapsed_time(), "00:00:03");

        let recording = recorder
            .stop(start + Duration::from_millis(3200), 60)
            .expect("recording");
        assert_eq!(recording.samples.len(), 3);
        assert_eq!(recording.samples[0].decoded_fps, 29.0);
        assert_eq!(recording.samples[0].dropped_frame_count, 2);
        assert_eq!(recording.refresh_rate_hz, 60);
        assert_eq!(recording.decode_stats.map(|s| s.effective_fps_avg), Some(28.0));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn decode_counters_lost_mid_session_clear_stats() {
        let start = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start(start);
        recorder.record_tick(start + Duration::from_secs(1), reading(30), &snapshot(), 0);
        recorder.record_tick(
            start + Duration::from_secs(2),
            reading(30),
            &DecodeReading::Unsupported,
            3,
        );

        let recording = recorder
            .stop(start + Duration::from_secs(2), 60)
            .expect("recording");
        assert_eq!(recording.samples.len(), 2);
        assert_eq!(recording.samples[1].decoded_fps, 0.0);
        assert_eq!(recording.samples[1].dropped_frame_count, 0);
        assert_eq!(recording.decode_stats, None);
    }

    #[test]
    fn collapsed_ticks_are_dropped() {
        let start = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start(start);
        let unsupported = DecodeReading::Unsupported;
        assert!(
            recorder
                .record_tick(start + Duration::from_millis(1400), reading(30), &unsupported, 0)
                .is_some()
        );
        assert!(
            recorder
                .record_tick(start + Duration::from_millis(1450), reading(30), &unsupported, 0)
                .is_none()
        );
        assert_eq!(recorder.samples().len(), 1);
    }

    #[test]
    fn stopping_without_samples_yields_nothing() {
        let start = Instant::now();
        let mut recorder = SessionRecorder::new();
        assert!(recorder.toggle(start, 60).is_none());
        assert!(recorder.is_recording());
        assert!(recorder.toggle(start + Duration::from_millis(300), 60).is_none());
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn idle_recorder_ignores_ticks() {
        let mut recorder = SessionRecorder::new();
        let now = Instant::now();
        assert!(recorder.record_tick(now, reading(30), &snapshot(), 0).is_none());
        assert!(recorder.stop(now, 60).is_none());
    }

    #[test]
    fn restart_clears_previous_samples() {
        let start = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start(start);
        recorder.record_tick(start + Duration::from_secs(1), reading(24), &snapshot(), 0);
        recorder.stop(start + Duration::from_secs(1), 60);
        recorder.start(start + Duration::from_secs(5));
        assert!(recorder.samples().is_empty());
        assert_eq!(recorder.elapsed_time(), "00:00:00");
    }
}
