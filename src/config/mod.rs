//! Configuration loading and validation utilities.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::fs;
use tracing::instrument;

use crate::{
    MeterError, meter::estimator::EstimatorSettings, source::synthetic::SyntheticVideoConfig,
};

/// Command-line arguments used to bootstrap the runtime.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Video frame-rate and display-latency meter")]
pub struct CliArgs {
    /// Location of an optional settings document.
    #[arg(long, value_name = "PATH", env = "FRAMEPACE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory receiving exported artifacts.
    #[arg(long, value_name = "DIR", env = "FRAMEPACE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    /// Sample clock period override.
    #[arg(long, value_name = "MS", env = "FRAMEPACE_TICK_MS")]
    pub tick_ms: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Record a session against a synthetic video and export it.
    Simulate {
        /// Session length.
        #[arg(long, value_name = "SECONDS", env = "FRAMEPACE_SECONDS")]
        seconds: Option<u64>,
        /// Frame rate of the simulated video.
        #[arg(long, value_name = "FPS")]
        frame_rate: Option<f64>,
        /// Playback rate of the simulated video.
        #[arg(long, value_name = "RATE")]
        playback_rate: Option<f64>,
        /// Session offsets at which to seek; repeatable.
        #[arg(long = "seek-at", value_name = "SECONDS")]
        seek_at: Vec<f64>,
        /// Simulate a platform without decode counters.
        #[arg(long)]
        no_decode_counters: bool,
    },
    /// Import an exported artifact and print a summary.
    Inspect {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

/// Samples are stamped in whole seconds, so a faster clock would collapse ticks.
const MIN_TICK_INTERVAL_MS: u64 = 1000;

/// Sample clock and estimator tunables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeterSettings {
    pub tick_interval_ms: u64,
    pub interval_capacity: usize,
    pub max_frame_interval_secs: f64,
}

impl Default for MeterSettings {
    fn default() -> Self {
        let estimator = EstimatorSettings::default();
        Self {
            tick_interval_ms: 1000,
            interval_capacity: estimator.interval_capacity,
            max_frame_interval_secs: estimator.max_frame_interval_secs,
        }
    }
}

impl MeterSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn estimator(&self) -> EstimatorSettings {
        EstimatorSettings {
            interval_capacity: self.interval_capacity,
            max_frame_interval_secs: self.max_frame_interval_secs,
        }
    }

    pub fn validate(&self) -> Result<(), MeterError> {
        if self.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(MeterError::Config(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {}",
                self.tick_interval_ms
            )));
        }
        if self.interval_capacity == 0 {
            return Err(MeterError::Config(
                "interval_capacity must be positive".to_string(),
            ));
        }
        if !(self.max_frame_interval_secs.is_finite() && self.max_frame_interval_secs > 0.0) {
            return Err(MeterError::Config(format!(
                "max_frame_interval_secs must be a positive number, got {}",
                self.max_frame_interval_secs
            )));
        }
        Ok(())
    }
}

/// Where and how recordings are exported.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub artifact_name: String,
    /// Capacity of the cross-context message channel.
    pub channel_capacity: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            artifact_name: "data.txt".to_string(),
            channel_capacity: 16,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<(), MeterError> {
        if self.artifact_name.is_empty()
            || self.artifact_name.contains(['/', '\\'])
            || self.artifact_name == ".."
        {
            return Err(MeterError::Config(format!(
                "artifact_name '{}' must be a plain file name",
                self.artifact_name
            )));
        }
        Ok(())
    }
}

/// Synthetic session used by the `simulate` command.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    pub seconds: u64,
    pub video: SyntheticVideoConfig,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seconds: 5,
            video: SyntheticVideoConfig::default(),
        }
    }
}

impl SimulationSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }

    pub fn validate(&self) -> Result<(), MeterError> {
        if self.seconds == 0 {
            return Err(MeterError::Config(
                "simulation seconds must be positive".to_string(),
            ));
        }
        if !(self.video.frame_rate.is_finite() && self.video.frame_rate > 0.0) {
            return Err(MeterError::Config(format!(
                "frame_rate must be positive, got {}",
                self.video.frame_rate
            )));
        }
        if !(self.video.playback_rate.is_finite() && self.video.playback_rate > 0.0) {
            return Err(MeterError::Config(format!(
                "playback_rate must be positive, got {}",
                self.video.playback_rate
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
struct SettingsDocument {
    meter: MeterSettings,
    export: ExportSettings,
    simulation: SimulationSettings,
}

/// Fully merged configuration set.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cli: CliArgs,
    pub meter: MeterSettings,
    pub export: ExportSettings,
    pub simulation: SimulationSettings,
}

impl AppConfig {
    /// Merges the optional settings document with command-line overrides.
    #[instrument(skip_all)]
    pub async fn load(cli: CliArgs) -> Result<Self, MeterError> {
        let document = match &cli.config {
            Some(path) => {
                let raw = fs::read_to_string(path).await.map_err(|err| {
                    MeterError::Config(format!("failed to read {}: {err}", path.display()))
                })?;
                toml::from_str::<SettingsDocument>(&raw).map_err(|err| {
                    MeterError::Config(format!("invalid settings document: {err}"))
                })?
            }
            None => SettingsDocument::default(),
        };

        let SettingsDocument {
            mut meter,
            mut export,
            mut simulation,
        } = document;

        if let Some(tick_ms) = cli.tick_ms {
            meter.tick_interval_ms = tick_ms;
        }
        if let Some(output_dir) = &cli.output_dir {
            export.output_dir = output_dir.clone();
        }
        export.channel_capacity = export.channel_capacity.max(1);

        if let Command::Simulate {
            seconds,
            frame_rate,
            playback_rate,
            seek_at,
            no_decode_counters,
        } = &cli.command
        {
            if let Some(seconds) = seconds {
                simulation.seconds = *seconds;
            }
            if let Some(frame_rate) = frame_rate {
                simulation.video.frame_rate = *frame_rate;
            }
            if let Some(playback_rate) = playback_rate {
                simulation.video.playback_rate = *playback_rate;
            }
            if !seek_at.is_empty() {
                simulation.video.seek_at_secs = seek_at.clone();
            }
            if *no_decode_counters {
                simulation.video.decode_counters = false;
            }
        }

        meter.validate()?;
        export.validate()?;
        simulation.validate()?;

        Ok(Self {
            cli,
            meter,
            export,
            simulation,
        })
    }
}
