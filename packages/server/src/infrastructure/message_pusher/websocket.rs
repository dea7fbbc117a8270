//! WebSocket-backed `MessagePusher` implementation.
//!
//! Socket creation happens in the UI layer; this implementation only
//! holds each connection's `UnboundedSender` and uses it to deliver
//! serialized events. Keeping creation and delivery apart means the
//! usecase layer never touches a socket type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientId, MessagePushError, MessagePusher, PusherChannel};

/// Connection table: client id to the outbound channel of its socket
/// task.
pub struct WebSocketMessagePusher {
    clients: Arc<Mutex<HashMap<ClientId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ClientId) {
        let mut clients = self.clients.lock().await;
        clients.remove(client_id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
    }

    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        if let Some(sender) = clients.get(client_id) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(
                client_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        for target in targets {
            if let Some(sender) = clients.get(&target) {
                // tolerate individual send failures during a broadcast
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to push message to client '{}': {}", target, e);
                }
            } else {
                tracing::warn!("Client '{}' not found during broadcast, skipping", target);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn register(pusher: &WebSocketMessagePusher) -> (ClientId, mpsc::UnboundedReceiver<String>) {
        let id = ClientId::random();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_client(id.clone(), tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_push_to_delivers_to_the_right_client() {
        // given:
        let pusher = WebSocketMessagePusher::new();
        let (alice, mut alice_rx) = register(&pusher).await;
        let (_bob, mut bob_rx) = register(&pusher).await;

        // when:
        pusher.push_to(&alice, "hello").await.unwrap();

        // then:
        assert_eq!(alice_rx.recv().await.unwrap(), "hello");
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_push_to_unknown_client_fails() {
        // given:
        let pusher = WebSocketMessagePusher::new();

        // when:
        let result = pusher.push_to(&ClientId::random(), "hello").await;

        // then:
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_target() {
        // given:
        let pusher = WebSocketMessagePusher::new();
        let (alice, mut alice_rx) = register(&pusher).await;
        let (bob, mut bob_rx) = register(&pusher).await;

        // when:
        pusher
            .broadcast(vec![alice.clone(), bob.clone()], "update")
            .await
            .unwrap();

        // then:
        assert_eq!(alice_rx.recv().await.unwrap(), "update");
        assert_eq!(bob_rx.recv().await.unwrap(), "update");
    }

    #[tokio::test]
    async fn test_broadcast_tolerates_missing_targets() {
        // given: one registered client, one ghost
        let pusher = WebSocketMessagePusher::new();
        let (alice, mut alice_rx) = register(&pusher).await;

        // when:
        let result = pusher
            .broadcast(vec![alice.clone(), ClientId::random()], "update")
            .await;

        // then: the broadcast still succeeds for the live client
        assert!(result.is_ok());
        assert_eq!(alice_rx.recv().await.unwrap(), "update");
    }

    #[tokio::test]
    async fn test_unregistered_client_no_longer_receives() {
        // given:
        let pusher = WebSocketMessagePusher::new();
        let (alice, _alice_rx) = register(&pusher).await;

        // when:
        pusher.unregister_client(&alice).await;
        let result = pusher.push_to(&alice, "hello").await;

        // then:
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }
}
