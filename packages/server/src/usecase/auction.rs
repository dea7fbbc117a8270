//! UseCase: the bid/award engine.
//!
//! Owns the countdown wiring: an accepted bid arms a fresh 5-second
//! timer through the scheduler, and both the timer expiry and the
//! host's confirmation funnel into the domain's single adjudication
//! routine.

use std::sync::Arc;
use std::time::Duration;

use subasta_shared::time::Clock;

use crate::domain::{
    ActionError, BID_TIMER_MS, ClientId, MessagePusher, PlayerCard, RoomCode, RoomRegistry,
    RoundScheduler,
};

use super::{dispatch, resolve_room};

pub struct AuctionUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn MessagePusher>,
    scheduler: Arc<dyn RoundScheduler>,
    clock: Arc<dyn Clock>,
}

impl AuctionUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        pusher: Arc<dyn MessagePusher>,
        scheduler: Arc<dyn RoundScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            pusher,
            scheduler,
            clock,
        }
    }

    /// Host sets one budget for every participant.
    pub async fn set_all_budgets(
        &self,
        caller: &ClientId,
        code: &str,
        amount: f64,
    ) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.set_all_budgets(caller, amount)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }

    /// Host starts (or restarts) the auction.
    pub async fn start_game(&self, caller: &ClientId, code: &str) -> Result<(), ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.start_game(caller)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        drop(room);
        // a fresh round has no countdown
        self.scheduler.cancel(&code).await;
        Ok(())
    }

    /// Host announces the position under auction.
    pub async fn set_round(
        &self,
        caller: &ClientId,
        code: &str,
        position_name: String,
        rounds: u32,
    ) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.set_round(caller, position_name, rounds)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }

    /// Host puts the next item under the hammer, killing any countdown
    /// still pending from the previous one.
    pub async fn set_player(
        &self,
        caller: &ClientId,
        code: &str,
        player: PlayerCard,
        index: i64,
    ) -> Result<(), ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.set_player(caller, player, index)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        drop(room);
        self.scheduler.cancel(&code).await;
        Ok(())
    }

    /// Anyone may bid. Acceptance re-arms the countdown; its expiry
    /// adjudicates automatically.
    pub async fn place_bid(
        &self,
        caller: &ClientId,
        code: &str,
        value: f64,
    ) -> Result<(), ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let end_at = self.clock.now_millis() + BID_TIMER_MS;
        let events = room.place_bid(caller, value, end_at)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        drop(room);

        let registry = Arc::clone(&self.registry);
        let pusher = Arc::clone(&self.pusher);
        let timer_code = code.clone();
        self.scheduler
            .arm(
                code,
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(BID_TIMER_MS as u64)).await;
                    adjudicate_now(registry.as_ref(), pusher.as_ref(), &timer_code).await;
                }),
            )
            .await;
        Ok(())
    }

    /// Host reveals the item, blocking further bids.
    pub async fn reveal_player(&self, caller: &ClientId, code: &str) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.reveal(caller)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }

    /// Host closes the round. The domain routine is the same one the
    /// countdown uses, so a timer firing concurrently awards at most
    /// once.
    pub async fn confirm_winner(&self, caller: &ClientId, code: &str) -> Result<(), ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let events = room.confirm_winner(caller)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        drop(room);
        self.scheduler.cancel(&code).await;
        Ok(())
    }
}

/// Timer-expiry path into the adjudication routine. The room is
/// re-fetched from the registry because it may have been torn down while
/// the countdown was pending.
pub(crate) async fn adjudicate_now(
    registry: &dyn RoomRegistry,
    pusher: &dyn MessagePusher,
    code: &RoomCode,
) {
    let Some(handle) = registry.get(code).await else {
        return;
    };
    let mut room = handle.lock().await;
    let events = room.adjudicate();
    dispatch(pusher, &room, events).await;
}
