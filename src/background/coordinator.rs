//! Background coordinator owning per-tab overlay state and message routing.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::{MeterError, SessionRecording};

use super::{
    host::ExtensionHost,
    protocol::{Message, TabId},
};

const BADGE_ON: &str = "On";
const BADGE_OFF: &str = "Off";

/// Overlay state tracked for one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabState {
    pub injected: bool,
    pub visible: bool,
}

/// Load status reported by tab update events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Lives for the lifetime of the extension; tab entries are removed when
/// their tab closes.
pub struct BackgroundCoordinator<H> {
    host: H,
    tabs: HashMap<TabId, TabState>,
    latest: Option<SessionRecording>,
}

impl<H: ExtensionHost> BackgroundCoordinator<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            tabs: HashMap::new(),
            latest: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn tab_state(&self, tab: TabId) -> Option<TabState> {
        self.tabs.get(&tab).copied()
    }

    pub fn tracked_tabs(&self) -> usize {
        self.tabs.len()
    }

    pub fn latest_recording(&self) -> Option<&SessionRecording> {
        self.latest.as_ref()
    }

    /// Marks every open tab as off at extension start.
    pub async fn initialize(&mut self, open_tabs: &[TabId]) -> Result<(), MeterError> {
        for tab in open_tabs {
            self.host.set_badge(*tab, BADGE_OFF).await?;
        }
        Ok(())
    }

    /// Toolbar action: injects the overlay on first use, toggles it after.
    #[instrument(skip_all, fields(%tab))]
    pub async fn on_action_clicked(&mut self, tab: TabId) -> Result<TabState, MeterError> {
        let state = match self.tabs.get(&tab).copied() {
            None => {
                self.host.inject_overlay(tab).await?;
                TabState {
                    injected: true,
                    visible: true,
                }
            }
            Some(current) => {
                self.host
                    .send_to_tab(tab, &Message::ToggleContentScript)
                    .await?;
                TabState {
                    visible: !current.visible,
                    ..current
                }
            }
        };
        self.tabs.insert(tab, state);
        self.host
            .set_badge(tab, if state.visible { BADGE_ON } else { BADGE_OFF })
            .await?;
        debug!(target = "coordinator", visible = state.visible, "overlay toggled");
        Ok(state)
    }

    /// Re-injects the overlay after a reload of a tab where it was visible.
    pub async fn on_tab_updated(&mut self, tab: TabId, status: TabStatus) -> Result<bool, MeterError> {
        let visible = self.tabs.get(&tab).is_some_and(|state| state.visible);
        if status != TabStatus::Complete || !visible {
            return Ok(false);
        }
        self.host.inject_overlay(tab).await?;
        Ok(true)
    }

    pub fn on_tab_removed(&mut self, tab: TabId) -> Option<TabState> {
        self.tabs.remove(&tab)
    }

    /// Handles a message addressed to the background; returns the reply, if
    /// the message kind has one.
    #[instrument(skip_all, fields(kind = message.kind()))]
    pub async fn on_message(&mut self, message: Message) -> Result<Option<Message>, MeterError> {
        match message {
            Message::DataReady { data } => {
                info!(target = "coordinator", samples = data.samples.len(), "recording received");
                self.latest = Some(data);
                self.host.open_options().await?;
                Ok(None)
            }
            Message::OpenOptions => {
                self.host.open_options().await?;
                Ok(None)
            }
            Message::RequestData => Ok(self.on_options_connected()),
            Message::ToggleContentScript => {
                warn!(target = "coordinator", "toggle is addressed to content scripts, ignoring");
                Ok(None)
            }
        }
    }

    /// Payload pushed to a newly connected options page.
    pub fn on_options_connected(&self) -> Option<Message> {
        self.latest.clone().map(|data| Message::DataReady { data })
    }
}
