//! Application services wiring the domain to the registry, the message
//! pusher and the round scheduler.
//!
//! Each usecase locks the room, runs one domain transition to
//! completion, and pushes the returned events out — no operation
//! suspends between reading room state and writing it back.

mod auction;
mod membership;
mod roulette;
mod trade;

pub use auction::AuctionUseCase;
pub use membership::MembershipUseCase;
pub use roulette::RouletteUseCase;
pub use trade::TradeUseCase;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ActionError, ClientId, Envelope, MessagePusher, Room, RoomCode, RoomRegistry, Target,
};

/// Serialize and deliver a batch of addressed events. Room-targeted
/// events go to every current participant; failures are logged, never
/// propagated.
pub(crate) async fn dispatch(pusher: &dyn MessagePusher, room: &Room, envelopes: Vec<Envelope>) {
    for envelope in envelopes {
        let payload = match serde_json::to_string(&envelope.event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize event: {}", e);
                continue;
            }
        };
        match envelope.target {
            Target::Client(id) => {
                if let Err(e) = pusher.push_to(&id, &payload).await {
                    tracing::warn!("Failed to push event to client '{}': {}", id, e);
                }
            }
            Target::Room => {
                let targets: Vec<ClientId> =
                    room.participants.iter().map(|p| p.id.clone()).collect();
                if let Err(e) = pusher.broadcast(targets, &payload).await {
                    tracing::warn!("Failed to broadcast event: {}", e);
                }
            }
        }
    }
}

/// Parse a client-supplied code and look the room up. Malformed and
/// unknown codes are the same `RoomNotFound` to the caller.
pub(crate) async fn resolve_room(
    registry: &dyn RoomRegistry,
    code: &str,
) -> Result<(RoomCode, Arc<Mutex<Room>>), ActionError> {
    let code = RoomCode::parse(code).map_err(|_| ActionError::RoomNotFound)?;
    let handle = registry
        .get(&code)
        .await
        .ok_or(ActionError::RoomNotFound)?;
    Ok((code, handle))
}
