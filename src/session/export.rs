//! Artifact export/import and `DATA_READY` forwarding.

use std::path::{Path, PathBuf};

use tokio::{fs, sync::mpsc};
use tracing::{info, instrument};

use crate::{
    MeterError, SCHEMA_VERSION, SessionRecording, background::protocol::Message,
    config::ExportSettings,
};

/// Serializes a recording as pretty-printed JSON.
pub fn encode_recording(recording: &SessionRecording) -> Result<String, MeterError> {
    serde_json::to_string_pretty(recording)
        .map_err(|err| MeterError::Export(format!("failed to serialize recording: {err}")))
}

/// Parses artifact text. Fails as a whole; nothing is partially populated.
pub fn decode_recording(text: &str) -> Result<SessionRecording, MeterError> {
    let recording: SessionRecording =
        serde_json::from_str(text).map_err(|err| MeterError::Import(err.to_string()))?;
    if recording.schema_version > SCHEMA_VERSION {
        return Err(MeterError::Import(format!(
            "schema version {} is newer than supported version {}",
            recording.schema_version, SCHEMA_VERSION
        )));
    }
    Ok(recording)
}

/// Reads and parses an artifact from disk.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn import_recording(path: &Path) -> Result<SessionRecording, MeterError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|err| MeterError::Io(format!("{}: {err}", path.display())))?;
    decode_recording(&text)
}

/// Writes finished recordings to disk and announces them on the transport.
#[derive(Debug, Clone)]
pub struct Exporter {
    settings: ExportSettings,
    transport: mpsc::Sender<Message>,
}

impl Exporter {
    pub fn new(settings: ExportSettings, transport: mpsc::Sender<Message>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.settings.output_dir.join(&self.settings.artifact_name)
    }

    /// Exports a recording. Empty recordings produce no artifact and no
    /// message; the written path is returned otherwise.
    #[instrument(skip_all, fields(samples = recording.samples.len()))]
    pub async fn export(&self, recording: &SessionRecording) -> Result<Option<PathBuf>, MeterError> {
        if recording.is_empty() {
            info!(target = "export", "nothing recorded, skipping export");
            return Ok(None);
        }

        let text = encode_recording(recording)?;
        let path = self.artifact_path();
        fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|err| MeterError::Io(err.to_string()))?;
        fs::write(&path, text)
            .await
            .map_err(|err| MeterError::Io(format!("{}: {err}", path.display())))?;

        self.transport
            .send(Message::DataReady {
                data: recording.clone(),
            })
            .await
            .map_err(|err| MeterError::Transport(format!("DATA_READY not delivered: {err}")))?;

        info!(target = "export", path = %path.display(), "recording exported");
        Ok(Some(path))
    }
}
