//! UseCase: room creation, joining and disconnect cleanup.

use std::sync::Arc;

use crate::domain::{
    ActionError, ClientId, MessagePusher, Participant, RoomCode, RoomRegistry, RoundScheduler,
};

use super::{dispatch, resolve_room};

/// Default display name for a host that did not type one.
const DEFAULT_HOST_NAME: &str = "Anfitrión";
/// Default display name for a joining participant.
const DEFAULT_PLAYER_NAME: &str = "Jugador";

pub struct MembershipUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn MessagePusher>,
    scheduler: Arc<dyn RoundScheduler>,
}

impl MembershipUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        pusher: Arc<dyn MessagePusher>,
        scheduler: Arc<dyn RoundScheduler>,
    ) -> Self {
        Self {
            registry,
            pusher,
            scheduler,
        }
    }

    /// Create a room with the caller as host. The first connection to
    /// create a room *is* its host; there is no further authentication.
    pub async fn create_room(
        &self,
        client_id: ClientId,
        name: Option<String>,
        avatar: Option<serde_json::Value>,
    ) -> RoomCode {
        let display_name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST_NAME.to_string());
        let host = Participant::new(client_id, display_name, avatar);
        let (code, handle) = self.registry.create_room(host).await;
        let room = handle.lock().await;
        dispatch(self.pusher.as_ref(), &room, room.created_events()).await;
        tracing::info!("Room {} created", code);
        code
    }

    /// Join an existing room. `RoomNotFound` and `AvatarTaken` surface
    /// back to the gateway, which turns them into a `room_error` event.
    pub async fn join_room(
        &self,
        client_id: ClientId,
        code: &str,
        name: Option<String>,
        avatar: Option<serde_json::Value>,
    ) -> Result<RoomCode, ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let display_name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());
        let participant = Participant::new(client_id.clone(), display_name, avatar);
        let mut room = handle.lock().await;
        let events = room.join(participant)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        tracing::info!("Client '{}' joined room {}", client_id, code);
        Ok(code)
    }

    /// Handle a disconnect: prune the participant, destroy the room if
    /// it emptied (also dropping any live countdown), otherwise let the
    /// domain's host failover and updates go out.
    pub async fn disconnect(&self, client_id: &ClientId, code: &RoomCode) {
        let Some(handle) = self.registry.get(code).await else {
            return;
        };
        let destroyed = {
            let mut room = handle.lock().await;
            let outcome = room.leave(client_id);
            if !outcome.destroyed {
                dispatch(self.pusher.as_ref(), &room, outcome.events).await;
            }
            outcome.destroyed
        };
        if destroyed {
            self.registry.remove(code).await;
            self.scheduler.cancel(code).await;
            tracing::info!("Room {} destroyed (last participant left)", code);
        } else {
            tracing::info!("Client '{}' left room {}", client_id, code);
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::PusherChannel;
    use crate::infrastructure::{
        InMemoryRoomRegistry, TokioRoundScheduler, WebSocketMessagePusher,
    };

    struct Fixture {
        registry: Arc<InMemoryRoomRegistry>,
        pusher: Arc<WebSocketMessagePusher>,
        usecase: MembershipUseCase,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let scheduler = Arc::new(TokioRoundScheduler::new());
        let usecase = MembershipUseCase::new(registry.clone(), pusher.clone(), scheduler);
        Fixture {
            registry,
            pusher,
            usecase,
        }
    }

    async fn connect(
        pusher: &WebSocketMessagePusher,
    ) -> (ClientId, mpsc::UnboundedReceiver<String>) {
        let id = ClientId::random();
        let (tx, rx): (PusherChannel, _) = mpsc::unbounded_channel();
        pusher.register_client(id.clone(), tx).await;
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(serde_json::from_str(&msg).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_create_room_sends_the_host_its_initial_state() {
        // given:
        let f = fixture();
        let (host, mut host_rx) = connect(&f.pusher).await;

        // when:
        let code = f.usecase.create_room(host, None, None).await;

        // then: room_created / budget_update / market_state /
        // participants_update, and the blank name fell back
        let events = drain(&mut host_rx);
        let types: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            vec![
                "room_created",
                "budget_update",
                "market_state",
                "participants_update"
            ]
        );
        assert_eq!(events[0]["code"], code.as_str());
        assert_eq!(events[0]["participants"][0]["name"], "Anfitrión");
        assert_eq!(f.registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_join_room_with_an_unknown_code_fails() {
        // given:
        let f = fixture();
        let (player, _rx) = connect(&f.pusher).await;

        // when:
        let result = f
            .usecase
            .join_room(player, "ZZ9YX8", Some("Ana".to_string()), None)
            .await;

        // then:
        assert_eq!(result.unwrap_err(), ActionError::RoomNotFound);
    }

    #[tokio::test]
    async fn test_join_room_accepts_a_lowercase_code() {
        // given:
        let f = fixture();
        let (host, _host_rx) = connect(&f.pusher).await;
        let code = f.usecase.create_room(host, None, None).await;
        let (player, mut player_rx) = connect(&f.pusher).await;

        // when: the player types the code in lowercase
        let result = f
            .usecase
            .join_room(
                player,
                &code.as_str().to_lowercase(),
                Some("Ana".to_string()),
                None,
            )
            .await;

        // then:
        assert_eq!(result.unwrap(), code);
        let events = drain(&mut player_rx);
        assert_eq!(events[0]["type"], "room_joined");
        assert_eq!(events[0]["code"], code.as_str());
    }

    #[tokio::test]
    async fn test_last_disconnect_destroys_the_room() {
        // given:
        let f = fixture();
        let (host, _host_rx) = connect(&f.pusher).await;
        let code = f.usecase.create_room(host.clone(), None, None).await;

        // when:
        f.usecase.disconnect(&host, &code).await;

        // then:
        assert_eq!(f.registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_host_disconnect_promotes_the_next_participant() {
        // given: a host and one player
        let f = fixture();
        let (host, _host_rx) = connect(&f.pusher).await;
        let code = f.usecase.create_room(host.clone(), None, None).await;
        let (player, mut player_rx) = connect(&f.pusher).await;
        f.usecase
            .join_room(player.clone(), code.as_str(), Some("Ana".to_string()), None)
            .await
            .unwrap();
        drain(&mut player_rx);

        // when:
        f.usecase.disconnect(&host, &code).await;

        // then: the player is told they are the host now
        let events = drain(&mut player_rx);
        let host_changed = events
            .iter()
            .find(|e| e["type"] == "host_changed")
            .expect("host_changed must be broadcast");
        assert_eq!(host_changed["hostId"], player.as_str());
        assert_eq!(f.registry.count().await, 1);
    }
}
