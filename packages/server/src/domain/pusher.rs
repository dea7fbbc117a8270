//! Message delivery interface required by the domain.
//!
//! The usecase layer depends on this trait; the infrastructure layer
//! provides the WebSocket implementation (dependency inversion, as with
//! the room registry).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::ClientId;

/// Channel used to push serialized messages to one connection.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Error)]
pub enum MessagePushError {
    #[error("client '{0}' is not connected")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Delivers serialized events to connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a freshly connected client and its outbound channel.
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel);

    /// Forget a disconnected client.
    async fn unregister_client(&self, client_id: &ClientId);

    /// Push to a single client. Fails if the client is unknown or its
    /// channel is closed.
    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError>;

    /// Push to every target. Individual send failures are tolerated and
    /// logged by the implementation.
    async fn broadcast(&self, targets: Vec<ClientId>, content: &str)
    -> Result<(), MessagePushError>;
}
