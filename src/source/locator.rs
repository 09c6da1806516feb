//! Video element discovery across a document and its embedded documents.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Raised when an embedded document refuses cross-document access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("access to embedded document denied: {0}")]
pub struct AccessDenied(pub String);

/// A document that can be searched for video elements.
pub trait DocumentNode: Sized {
    type Video: Clone;

    /// Video elements directly inside this document, in document order.
    fn videos(&self) -> Vec<Self::Video>;

    /// Embedded documents (frames), in document order.
    fn embedded_documents(&self) -> Vec<Result<Self, AccessDenied>>;
}

/// Notifies that the observed document tree changed.
#[async_trait]
pub trait ElementObserver: Send {
    /// Resolves on the next change; `false` once the observer is closed.
    async fn changed(&mut self) -> bool;

    fn disconnect(&mut self);
}

/// Returns the first video of `document`, searching embedded documents
/// depth-first after the document's own videos.
pub fn find_first_video<D: DocumentNode>(document: &D) -> Option<D::Video> {
    if let Some(video) = document.videos().into_iter().next() {
        return Some(video);
    }
    for embedded in document.embedded_documents() {
        match embedded {
            Ok(child) => {
                if let Some(video) = find_first_video(&child) {
                    debug!(target = "locator", "video found inside embedded document");
                    return Some(video);
                }
            }
            Err(err) => warn!(target = "locator", error = %err, "skipping embedded document"),
        }
    }
    None
}

/// Scans `document` now and after every change until a video appears.
///
/// The observer is disconnected as soon as a video is found.
pub async fn watch_for_video<D, O>(document: &D, observer: &mut O) -> Option<D::Video>
where
    D: DocumentNode,
    O: ElementObserver,
{
    loop {
        if let Some(video) = find_first_video(document) {
            info!(target = "locator", "video element located");
            observer.disconnect();
            return Some(video);
        }
        if !observer.changed().await {
            return None;
        }
    }
}

/// Observer fed by a channel of change notifications.
pub struct ChannelObserver {
    changes: Option<mpsc::Receiver<()>>,
}

impl ChannelObserver {
    pub fn new(changes: mpsc::Receiver<()>) -> Self {
        Self {
            changes: Some(changes),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.changes.is_some()
    }
}

#[async_trait]
impl ElementObserver for ChannelObserver {
    async fn changed(&mut self) -> bool {
        match self.changes.as_mut() {
            Some(changes) => changes.recv().await.is_some(),
            None => false,
        }
    }

    fn disconnect(&mut self) {
        self.changes = None;
    }
}
