//! Session driver wiring frame events, animation frames and the sample clock.

use tokio::{
    sync::oneshot,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument};

use crate::{
    FrameEvent, SessionRecording, SessionResult,
    config::MeterSettings,
    meter::{
        decode::DecodeCounter,
        estimator::{RateEstimator, RateReading},
        refresh::RefreshRateCounter,
        telemetry::TelemetrySink,
    },
    source::{AnimationFrameSource, SessionSources},
};

pub mod export;
pub mod recorder;

use export::Exporter;
use recorder::SessionRecorder;

/// Why a recording session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user stopped recording.
    Stopped,
    /// The stop handle was dropped (component teardown).
    Teardown,
    /// The frame source closed (navigation or unload).
    SourceClosed,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Stopped => "stopped",
            ExitReason::Teardown => "teardown",
            ExitReason::SourceClosed => "source_closed",
        }
    }
}

/// Result of one recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// `None` when no tick produced a sample.
    pub recording: Option<SessionRecording>,
    pub exit: ExitReason,
    /// Last displayed fps/latency, frozen at stop.
    pub final_reading: RateReading,
}

/// Records until `stop` fires, its sender is dropped, or the frame source
/// closes.
///
/// Everything runs on the calling task: frame events and ticks never
/// interleave, so the estimator buffers need no locking. The frame
/// subscription is re-armed after every event and released on every exit
/// path.
#[instrument(skip_all, fields(tick_ms = settings.tick_interval_ms))]
pub async fn record_session(
    sources: SessionSources,
    settings: &MeterSettings,
    mut stop: oneshot::Receiver<()>,
    telemetry: &TelemetrySink,
) -> SessionOutcome {
    let SessionSources {
        mut frames,
        decode,
        mut display,
    } = sources;

    let started_at = Instant::now();
    let mut recorder = SessionRecorder::new();
    recorder.start(started_at);
    let mut estimator = RateEstimator::new(settings.estimator());
    let mut decode_counter = DecodeCounter::start(decode.counters(), started_at);
    let mut refresh = RefreshRateCounter::new(started_at);

    let period = settings.tick_interval();
    let mut ticker = time::interval_at(started_at + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let exit = loop {
        tokio::select! {
            biased;
            requested = &mut stop => {
                break if requested.is_ok() { ExitReason::Stopped } else { ExitReason::Teardown };
            }
            now = ticker.tick() => {
                let reading = estimator.on_tick();
                let decode_reading = decode_counter.tick(decode.counters(), now);
                let sampled = recorder
                    .record_tick(now, reading, &decode_reading, decode_counter.dropped_last_tick())
                    .is_some();
                telemetry.record_tick(sampled, decode_reading.is_supported());
                debug!(
                    target = "session",
                    fps = reading.fps,
                    latency_ms = reading.latency_ms,
                    elapsed = recorder.elapsed_time(),
                    "tick"
                );
            }
            event = frames.next_event() => match event {
                Some(FrameEvent::Presented(measurement)) => {
                    let verdict = estimator.on_frame(&measurement, frames.playback_rate());
                    telemetry.record_frame(verdict);
                }
                Some(FrameEvent::Seeked) => {
                    estimator.on_seek();
                    telemetry.record_seek();
                }
                None => break ExitReason::SourceClosed,
            },
            frame = next_animation_frame(&mut display) => match frame {
                Some(at) => {
                    refresh.on_frame(at);
                }
                None => display = None,
            },
        }
    };

    frames.unsubscribe();
    drop(ticker);

    let final_reading = estimator.reading();
    let recording = recorder.stop(Instant::now(), refresh.rate_hz());
    info!(
        target = "session",
        exit = exit.as_str(),
        fps = final_reading.fps,
        latency_ms = final_reading.latency_ms,
        refresh_hz = refresh.rate_hz(),
        "session ended"
    );
    SessionOutcome {
        recording,
        exit,
        final_reading,
    }
}

/// Records a session and hands the result to `exporter`.
#[instrument(skip_all)]
pub async fn record_and_export(
    sources: SessionSources,
    settings: &MeterSettings,
    stop: oneshot::Receiver<()>,
    exporter: &Exporter,
) -> SessionResult {
    let telemetry = TelemetrySink::default();
    let outcome = record_session(sources, settings, stop, &telemetry).await;

    let snapshot = telemetry.snapshot();
    info!(
        target = "session",
        frames = snapshot.frames_seen(),
        seeks = snapshot.seeks,
        ticks = snapshot.ticks,
        samples = snapshot.samples,
        "session telemetry"
    );

    if let Some(recording) = outcome.recording.as_ref() {
        exporter.export(recording).await?;
    }
    Ok(outcome.recording)
}

async fn next_animation_frame(
    display: &mut Option<Box<dyn AnimationFrameSource>>,
) -> Option<Instant> {
    match display {
        Some(display) => display.next_frame().await,
        None => std::future::pending().await,
    }
}
