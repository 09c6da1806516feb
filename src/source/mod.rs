//! Collaborator interfaces the measurement core consumes.
//!
//! Frame callbacks, decode counters and animation frames come from the host
//! environment; each is a trait so a session can be driven by the browser
//! bridge, by the synthetic sources, or by test fakes.

pub mod locator;
pub mod synthetic;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{FrameEvent, meter::decode::DecodeCounters};

/// One-shot per-frame notification subscription bound to a video element.
#[async_trait]
pub trait FrameSource: Send {
    /// Arms the frame callback and waits for the next event. Returns `None`
    /// once the element is gone (navigation, unload, unsubscribe).
    ///
    /// Implementations must be cancel-safe: the session driver drops the
    /// pending future whenever a tick or stop signal wins the race.
    async fn next_event(&mut self) -> Option<FrameEvent>;

    /// Current playback rate of the bound element.
    fn playback_rate(&self) -> f64;

    /// Removes the seek listener and stops re-arming.
    fn unsubscribe(&mut self);
}

/// Polled cumulative decoded/dropped counters.
pub trait DecodeCounterSource: Send + Sync {
    /// `None` when the platform does not expose the counters.
    fn counters(&self) -> Option<DecodeCounters>;
}

/// Display animation-frame callbacks used to measure the refresh rate.
#[async_trait]
pub trait AnimationFrameSource: Send {
    async fn next_frame(&mut self) -> Option<Instant>;
}

/// Everything a recording session reads from.
pub struct SessionSources {
    pub frames: Box<dyn FrameSource>,
    pub decode: Arc<dyn DecodeCounterSource>,
    pub display: Option<Box<dyn AnimationFrameSource>>,
}

impl SessionSources {
    pub fn new<F>(frames: F, decode: Arc<dyn DecodeCounterSource>) -> Self
    where
        F: FrameSource + 'static,
    {
        Self {
            frames: Box::new(frames),
            decode,
            display: None,
        }
    }

    pub fn with_display<A>(mut self, display: A) -> Self
    where
        A: AnimationFrameSource + 'static,
    {
        self.display = Some(Box::new(display));
        self
    }
}

/// Decode source for platforms without decode counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDecodeCounters;

impl DecodeCounterSource for NoDecodeCounters {
    fn counters(&self) -> Option<DecodeCounters> {
        None
    }
}
