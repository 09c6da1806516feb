//! Background coordinator, its host bridge and the cross-context protocol.

pub mod coordinator;
pub mod host;
pub mod protocol;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use coordinator::BackgroundCoordinator;
use host::ExtensionHost;
use protocol::Message;

/// Feeds transport messages to `coordinator` until every sender is dropped,
/// then hands the coordinator back.
///
/// Host failures are logged per message and do not stop the loop.
pub async fn route_messages<H: ExtensionHost>(
    mut coordinator: BackgroundCoordinator<H>,
    mut messages: mpsc::Receiver<Message>,
) -> BackgroundCoordinator<H> {
    while let Some(message) = messages.recv().await {
        let kind = message.kind();
        match coordinator.on_message(message).await {
            Ok(Some(reply)) => debug!(target = "background", kind, reply = reply.kind(), "replied"),
            Ok(None) => debug!(target = "background", kind, "handled"),
            Err(error) => warn!(target = "background", kind, error = %error, "message handling failed"),
        }
    }
    coordinator
}
