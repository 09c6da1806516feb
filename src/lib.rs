//! Core library for framepace.
//!
//! The crate measures video playback frame rate and display latency from two
//! instrumentation sources, records one sample per aggregation tick while a
//! session is active, and exports the samples as a structured text artifact.
//! Browser-side collaborators (frame callbacks, decode counters, extension
//! plumbing) are modelled as traits so the measurement core can run anywhere.

pub mod background;
pub mod config;
pub mod labels;
pub mod meter;
pub mod session;
pub mod source;

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument};

/// Artifact schema written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata delivered once per presented video frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeasurement {
    /// Media timestamp of the presented frame, in seconds.
    pub media_time: f64,
    /// Cumulative number of frames presented for composition.
    pub presented_frame_count: u64,
    /// Time at which the frame was expected to be visible, in milliseconds.
    pub expected_display_time: f64,
    /// Time at which the frame was submitted for composition, in milliseconds.
    pub presentation_time: f64,
}

impl FrameMeasurement {
    /// Display latency for this frame, rounded to two decimals.
    pub fn latency_ms(&self) -> f64 {
        round2(self.expected_display_time - self.presentation_time)
    }
}

/// Event emitted by a [`source::FrameSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameEvent {
    Presented(FrameMeasurement),
    Seeked,
}

/// One sample appended per tick while a session is recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    pub fps: u32,
    /// Whole seconds since the session started.
    pub time: String,
    #[serde(rename = "latency")]
    pub latency_ms: f64,
    /// Instantaneous decode rate reported by the decode counters.
    #[serde(rename = "webKitFPS", deserialize_with = "number_or_string")]
    pub decoded_fps: f64,
    /// Frames dropped during the tick.
    #[serde(rename = "droppedFrames", deserialize_with = "legacy_dropped_count")]
    pub dropped_frame_count: u64,
    #[serde(rename = "effectiveFPSAvg", default, deserialize_with = "number_or_string")]
    pub effective_fps_avg: f64,
}

/// Cumulative and session-relative decode statistics for one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecodeSnapshot {
    #[serde(rename = "effectiveFPSAvg", deserialize_with = "number_or_string")]
    pub effective_fps_avg: f64,
    #[serde(rename = "decodedFrames", deserialize_with = "number_or_string")]
    pub decoded_frames: u64,
    #[serde(rename = "decodedFPSAvg", deserialize_with = "number_or_string")]
    pub decoded_fps_avg: f64,
    #[serde(rename = "currentDecodedFPS", deserialize_with = "number_or_string")]
    pub current_decoded_fps: f64,
    #[serde(rename = "droppedFrames", deserialize_with = "number_or_string")]
    pub dropped_frames: u64,
    #[serde(rename = "droppedFPSAvg", deserialize_with = "number_or_string")]
    pub dropped_fps_avg: f64,
    #[serde(rename = "currentDroppedFPS", deserialize_with = "number_or_string")]
    pub current_dropped_fps: f64,
    #[serde(rename = "videoWidth", default)]
    pub video_width: u32,
    #[serde(rename = "videoHeight", default)]
    pub video_height: u32,
    #[serde(rename = "totalDecodedFrames", default, deserialize_with = "number_or_string")]
    pub total_decoded_frames: u64,
    #[serde(rename = "totalDroppedFrames", default, deserialize_with = "number_or_string")]
    pub total_dropped_frames: u64,
}

/// Finished recording handed to export once a session stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecording {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    /// Wall-clock session length formatted as `HH:MM:SS`.
    pub elapsed_time: String,
    /// Display refresh rate in Hz observed during the session.
    #[serde(rename = "refreshRate")]
    pub refresh_rate_hz: u32,
    #[serde(rename = "fpsData")]
    pub samples: Vec<RateSample>,
    /// `None` when the platform does not expose decode counters.
    #[serde(rename = "statsData")]
    pub decode_stats: Option<DecodeSnapshot>,
}

impl SessionRecording {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Display for SessionRecording {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SessionRecording(elapsed={}, refresh={}Hz, samples={}, decode_stats={})",
            self.elapsed_time,
            self.refresh_rate_hz,
            self.samples.len(),
            self.decode_stats.is_some()
        )
    }
}

/// Errors returned by the measurement core and its collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeterError {
    #[error("I/O failure: {0}")]
    Io(String),
    #[error("malformed artifact: {0}")]
    Import(String),
    #[error("export failure: {0}")]
    Export(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("extension host failure: {0}")]
    Host(String),
    #[error("task join failure: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for MeterError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

/// Result alias for session level operations.
pub type SessionResult = Result<Option<SessionRecording>, MeterError>;

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn legacy_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Accepts a JSON number or a numeric string (older artifacts stored
/// `toFixed` output).
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Older artifacts stored a per-tick drop rate that could be fractional or
/// negative; those values import as a whole non-negative count.
fn legacy_dropped_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = number_or_string(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "droppedFrames must be finite, got {value}"
        )));
    }
    Ok(value.max(0.0).round() as u64)
}

/// Runs a synthetic session end-to-end: records for the configured duration,
/// exports the artifact and routes `DATA_READY` through the background
/// coordinator.
#[instrument(skip_all)]
pub async fn run(config: config::AppConfig) -> SessionResult {
    let simulation = config.simulation.clone();
    let (transport_tx, transport_rx) = mpsc::channel(config.export.channel_capacity);
    let coordinator = background::coordinator::BackgroundCoordinator::new(
        background::host::LoggingHost,
    );
    let router = tokio::spawn(background::route_messages(coordinator, transport_rx));

    let sources = source::synthetic::SyntheticVideo::new(simulation.video.clone()).spawn();
    let (stop_tx, stop_rx) = oneshot::channel();
    let duration = simulation.duration();
    let stopper = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = tokio::signal::ctrl_c() => info!("interrupted, stopping session"),
        }
        let _ = stop_tx.send(());
    });

    let exporter = session::export::Exporter::new(config.export.clone(), transport_tx);
    let recording =
        session::record_and_export(sources, &config.meter, stop_rx, &exporter).await?;
    drop(exporter);

    stopper.await.map_err(MeterError::from)?;
    let coordinator = router.await.map_err(MeterError::from)?;
    info!(
        stored = coordinator.latest_recording().is_some(),
        "background coordinator drained"
    );
    Ok(recording)
}
