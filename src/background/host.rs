//! Extension platform side effects invoked by the background coordinator.

use async_trait::async_trait;
use tracing::info;

use crate::MeterError;

use super::protocol::{Message, TabId};

/// Trait implemented by the browser bridge.
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Injects the overlay content script into `tab`.
    async fn inject_overlay(&self, tab: TabId) -> Result<(), MeterError>;
    async fn send_to_tab(&self, tab: TabId, message: &Message) -> Result<(), MeterError>;
    async fn set_badge(&self, tab: TabId, text: &str) -> Result<(), MeterError>;
    async fn open_options(&self) -> Result<(), MeterError>;
}

/// No-op host used for environments without an extension runtime.
pub struct NullHost;

impl Default for NullHost {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ExtensionHost for NullHost {
    async fn inject_overlay(&self, _tab: TabId) -> Result<(), MeterError> {
        Ok(())
    }

    async fn send_to_tab(&self, _tab: TabId, _message: &Message) -> Result<(), MeterError> {
        Ok(())
    }

    async fn set_badge(&self, _tab: TabId, _text: &str) -> Result<(), MeterError> {
        Ok(())
    }

    async fn open_options(&self) -> Result<(), MeterError> {
        Ok(())
    }
}

/// Host that only logs the side effects it would perform.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHost;

#[async_trait]
impl ExtensionHost for LoggingHost {
    async fn inject_overlay(&self, tab: TabId) -> Result<(), MeterError> {
        info!(target = "host", %tab, "inject overlay");
        Ok(())
    }

    async fn send_to_tab(&self, tab: TabId, message: &Message) -> Result<(), MeterError> {
        info!(target = "host", %tab, kind = message.kind(), "send to tab");
        Ok(())
    }

    async fn set_badge(&self, tab: TabId, text: &str) -> Result<(), MeterError> {
        info!(target = "host", %tab, text, "set badge");
        Ok(())
    }

    async fn open_options(&self) -> Result<(), MeterError> {
        info!(target = "host", "open options page");
        Ok(())
    }
}
