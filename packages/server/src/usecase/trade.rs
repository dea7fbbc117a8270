//! UseCase: transfer market gate, offer relay and acceptance.

use std::sync::Arc;

use crate::domain::{
    ActionError, ClientId, MessagePusher, RoomRegistry, TransferOffer,
};

use super::{dispatch, resolve_room};

pub struct TradeUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn MessagePusher>,
}

impl TradeUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self { registry, pusher }
    }

    /// Host opens or closes the transfer market.
    pub async fn market_state(
        &self,
        caller: &ClientId,
        code: &str,
        open: bool,
        reason: Option<String>,
    ) -> Result<(), ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.set_market_state(caller, open, reason.clone())?;
        tracing::info!(
            "market_state -> code={} open={} reason={} sender={}",
            code,
            open,
            reason.as_deref().unwrap_or("broadcast"),
            caller
        );
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }

    /// Relay an offer to the room while the market is open.
    pub async fn offer(
        &self,
        caller: &ClientId,
        offer: TransferOffer,
    ) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), &offer.code).await?;
        let room = handle.lock().await;
        let events = room.relay_offer(caller, offer)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }

    /// Relay an offer update; on accept the domain executes the atomic
    /// swap. A skipped swap is logged but emits nothing.
    pub async fn offer_update(
        &self,
        code: &str,
        action: &str,
        offer: TransferOffer,
    ) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let outcome = room.offer_update(action, offer)?;
        if let Some(reason) = &outcome.rejected {
            tracing::debug!("transfer accept skipped: {}", reason);
        }
        dispatch(self.pusher.as_ref(), &room, outcome.events).await;
        Ok(())
    }
}
