//! Timer-driven stand-ins for a playing video element and its display.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    sync::mpsc,
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tracing::debug;

use crate::{FrameEvent, FrameMeasurement, meter::decode::DecodeCounters};

use super::{AnimationFrameSource, DecodeCounterSource, FrameSource, SessionSources};

/// Media time skipped by a synthetic seek.
const SEEK_JUMP_SECS: f64 = 10.0;

/// Shape of the simulated playback.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyntheticVideoConfig {
    pub frame_rate: f64,
    pub refresh_rate_hz: u32,
    pub playback_rate: f64,
    /// Display latency reported for every frame.
    pub latency_ms: f64,
    /// Session offsets at which a seek happens.
    pub seek_at_secs: Vec<f64>,
    /// Every n-th decoded frame is counted as dropped; 0 disables drops.
    pub drop_every: u64,
    pub decode_counters: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticVideoConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            refresh_rate_hz: 60,
            playback_rate: 1.0,
            latency_ms: 16.0,
            seek_at_secs: Vec::new(),
            drop_every: 0,
            decode_counters: true,
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Default)]
struct SharedCounters {
    decoded: AtomicU64,
    dropped: AtomicU64,
}

/// Simulated video element producing frames on a fixed cadence.
pub struct SyntheticVideo {
    config: SyntheticVideoConfig,
}

impl SyntheticVideo {
    pub fn new(config: SyntheticVideoConfig) -> Self {
        Self { config }
    }

    /// Starts the frame generator and returns the sources bound to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> SessionSources {
        let (tx, rx) = mpsc::channel(256);
        let counters = Arc::new(SharedCounters::default());
        tokio::spawn(generate_frames(self.config.clone(), counters.clone(), tx));

        let frames = SyntheticFrames {
            events: Some(rx),
            playback_rate: self.config.playback_rate,
        };
        let decode = SyntheticCounters {
            counters,
            supported: self.config.decode_counters,
            width: self.config.width,
            height: self.config.height,
        };
        SessionSources::new(frames, Arc::new(decode))
            .with_display(SyntheticDisplay::new(self.config.refresh_rate_hz))
    }
}

async fn generate_frames(
    config: SyntheticVideoConfig,
    counters: Arc<SharedCounters>,
    tx: mpsc::Sender<FrameEvent>,
) {
    let period = Duration::from_secs_f64(1.0 / config.frame_rate.max(1.0));
    let started = Instant::now();
    let mut ticker = time::interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut pending_seeks = config.seek_at_secs.clone();
    pending_seeks.sort_by(f64::total_cmp);
    pending_seeks.reverse();

    let mut presented = 0u64;
    let mut media_offset = 0.0;
    loop {
        let now = ticker.tick().await;
        let elapsed = now.duration_since(started).as_secs_f64();

        if pending_seeks.last().is_some_and(|at| *at <= elapsed) {
            pending_seeks.pop();
            media_offset += SEEK_JUMP_SECS;
            if tx.send(FrameEvent::Seeked).await.is_err() {
                break;
            }
        }

        let decoded = counters.decoded.fetch_add(1, Ordering::Relaxed) + 1;
        if config.drop_every > 0 && decoded % config.drop_every == 0 {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        presented += 1;
        let presentation_time = elapsed * 1000.0;
        let measurement = FrameMeasurement {
            media_time: media_offset + presented as f64 / config.frame_rate,
            presented_frame_count: presented,
            expected_display_time: presentation_time + config.latency_ms,
            presentation_time,
        };
        if tx.send(FrameEvent::Presented(measurement)).await.is_err() {
            break;
        }
    }
    debug!(target = "synthetic", presented, "frame generator stopped");
}

/// Frame source backed by the generator channel.
pub struct SyntheticFrames {
    events: Option<mpsc::Receiver<FrameEvent>>,
    playback_rate: f64,
}

#[async_trait]
impl FrameSource for SyntheticFrames {
    async fn next_event(&mut self) -> Option<FrameEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    fn unsubscribe(&mut self) {
        self.events = None;
    }
}

struct SyntheticCounters {
    counters: Arc<SharedCounters>,
    supported: bool,
    width: u32,
    height: u32,
}

impl DecodeCounterSource for SyntheticCounters {
    fn counters(&self) -> Option<DecodeCounters> {
        self.supported.then(|| DecodeCounters {
            decoded: self.counters.decoded.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            video_width: self.width,
            video_height: self.height,
        })
    }
}

/// Animation frames at a fixed refresh rate.
pub struct SyntheticDisplay {
    ticker: Interval,
}

impl SyntheticDisplay {
    pub fn new(refresh_rate_hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(refresh_rate_hz.max(1)));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { ticker }
    }
}

#[async_trait]
impl AnimationFrameSource for SyntheticDisplay {
    async fn next_frame(&mut self) -> Option<Instant> {
        Some(self.ticker.tick().await)
    }
}
