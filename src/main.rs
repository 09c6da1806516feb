//! CLI entry point for framepace.

use clap::Parser;
use framepace::{
    SessionRecording,
    config::{AppConfig, CliArgs, Command},
    labels::humanize_label,
    session::export::import_recording,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = CliArgs::parse();
    let config = AppConfig::load(cli.clone()).await?;

    match &cli.command {
        Command::Simulate { .. } => match framepace::run(config).await {
            Ok(Some(recording)) => tracing::info!(%recording, "session recorded"),
            Ok(None) => tracing::warn!("session produced no samples"),
            Err(error) => {
                tracing::error!(error = %error, "session failed");
                return Err(error.into());
            }
        },
        Command::Inspect { path } => match import_recording(path).await {
            Ok(recording) => print_summary(&recording)?,
            Err(error) => {
                tracing::error!(error = %error, path = %path.display(), "import failed");
                return Err(error.into());
            }
        },
    }

    Ok(())
}

fn print_summary(recording: &SessionRecording) -> Result<(), Box<dyn std::error::Error>> {
    println!("Elapsed Time: {}", recording.elapsed_time);
    println!("Refresh Rate: {} Hz", recording.refresh_rate_hz);
    println!("Samples: {}", recording.samples.len());
    for sample in &recording.samples {
        println!(
            "  t={:>4}s  fps={:>3}  latency={:>7.2}ms  decoded={:>6.1}  dropped={}",
            sample.time, sample.fps, sample.latency_ms, sample.decoded_fps, sample.dropped_frame_count
        );
    }

    match &recording.decode_stats {
        Some(stats) => {
            let value = serde_json::to_value(stats)?;
            if let Some(fields) = value.as_object() {
                println!("Decode Statistics:");
                for (key, field) in fields {
                    println!("  {:<24} {}", humanize_label(key), field);
                }
            }
        }
        None => println!("Decode Statistics: unsupported on the recording platform"),
    }
    Ok(())
}
