//! Tagged messages exchanged between the content overlay, the background
//! coordinator and the options page.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{MeterError, SessionRecording};

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Cross-context message, tagged on `type`.
///
/// | kind                    | direction                        | contract          |
/// |-------------------------|----------------------------------|-------------------|
/// | `DATA_READY`            | content -> background -> options | publish           |
/// | `OPEN_OPTIONS`          | content -> background            | fire-and-forget   |
/// | `TOGGLE_CONTENT_SCRIPT` | background -> content            | fire-and-forget   |
/// | `REQUEST_DATA`          | options -> background            | replies `DATA_READY` when data is stored |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    DataReady { data: SessionRecording },
    OpenOptions,
    ToggleContentScript,
    RequestData,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::DataReady { .. } => "DATA_READY",
            Message::OpenOptions => "OPEN_OPTIONS",
            Message::ToggleContentScript => "TOGGLE_CONTENT_SCRIPT",
            Message::RequestData => "REQUEST_DATA",
        }
    }

    pub fn to_json(&self) -> Result<String, MeterError> {
        serde_json::to_string(self)
            .map_err(|err| MeterError::Transport(format!("failed to encode {}: {err}", self.kind())))
    }

    pub fn from_json(text: &str) -> Result<Self, MeterError> {
        serde_json::from_str(text)
            .map_err(|err| MeterError::Transport(format!("unrecognized message: {err}")))
    }
}
