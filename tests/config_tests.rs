use std::path::PathBuf;

use framepace::{
    MeterError,
    config::{AppConfig, CliArgs, Command},
};

fn simulate_cli(config: Option<PathBuf>) -> CliArgs {
    CliArgs {
        config,
        output_dir: None,
        tick_ms: None,
        command: Command::Simulate {
            seconds: None,
            frame_rate: None,
            playback_rate: None,
            seek_at: Vec::new(),
            no_decode_counters: false,
        },
    }
}

#[tokio::test]
async fn config_loads_defaults_successfully() {
    let config = AppConfig::load(simulate_cli(None))
        .await
        .expect("load defaults");
    assert_eq!(config.meter.tick_interval_ms, 1000);
    assert_eq!(config.meter.interval_capacity, 50);
    assert_eq!(config.export.artifact_name, "data.txt");
    assert_eq!(config.simulation.seconds, 5);
    assert_eq!(config.simulation.video.frame_rate, 30.0);
    assert!(config.simulation.video.decode_counters);
}

#[tokio::test]
async fn settings_document_is_merged_with_overrides() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("framepace.toml");
    std::fs::write(
        &path,
        r#"
[meter]
tick_interval_ms = 1500

[export]
artifact_name = "session.json"

[simulation]
seconds = 12

[simulation.video]
frame_rate = 24.0
seek_at_secs = [3.0]
"#,
    )
    .expect("write settings");

    let mut cli = simulate_cli(Some(path));
    cli.tick_ms = Some(2000);
    cli.output_dir = Some(dir.path().join("out"));
    cli.command = Command::Simulate {
        seconds: None,
        frame_rate: None,
        playback_rate: Some(1.5),
        seek_at: Vec::new(),
        no_decode_counters: true,
    };

    let config = AppConfig::load(cli).await.expect("load document");
    assert_eq!(config.meter.tick_interval_ms, 2000);
    assert_eq!(config.export.artifact_name, "session.json");
    assert_eq!(config.export.output_dir, dir.path().join("out"));
    assert_eq!(config.simulation.seconds, 12);
    assert_eq!(config.simulation.video.frame_rate, 24.0);
    assert_eq!(config.simulation.video.playback_rate, 1.5);
    assert_eq!(config.simulation.video.seek_at_secs, [3.0]);
    assert!(!config.simulation.video.decode_counters);
}

#[tokio::test]
async fn config_rejects_zero_tick_interval() {
    let mut cli = simulate_cli(None);
    cli.tick_ms = Some(0);
    let err = AppConfig::load(cli)
        .await
        .expect_err("zero tick should fail");
    assert!(matches!(err, MeterError::Config(_)));
    assert!(format!("{err}").contains("tick_interval_ms"));
}

#[tokio::test]
async fn config_rejects_nested_artifact_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("framepace.toml");
    std::fs::write(&path, "[export]\nartifact_name = \"../data.txt\"\n").expect("write settings");

    let err = AppConfig::load(simulate_cli(Some(path)))
        .await
        .expect_err("path traversal should fail");
    assert!(format!("{err}").contains("plain file name"));
}

#[tokio::test]
async fn config_reports_missing_document() {
    let err = AppConfig::load(simulate_cli(Some(PathBuf::from("/nonexistent/framepace.toml"))))
        .await
        .expect_err("missing file should fail");
    assert!(format!("{err}").contains("failed to read"));
}

#[tokio::test]
async fn config_rejects_sub_second_tick_interval() {
    let mut cli = simulate_cli(None);
    cli.tick_ms = Some(500);
    let err = AppConfig::load(cli)
        .await
        .expect_err("sub-second tick should fail");
    assert!(format!("{err}").contains("at least 1000"));

    let mut cli = simulate_cli(None);
    cli.tick_ms = Some(2000);
    let config = AppConfig::load(cli).await.expect("two second tick");
    assert_eq!(config.meter.tick_interval_ms, 2000);
}
