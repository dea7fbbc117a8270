//! UseCase: host-triggered roulette draws.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    ActionError, ClientId, MessagePusher, ROULETTE_SETTLE_MS, RoomRegistry, RoundScheduler,
};

use super::{dispatch, resolve_room};

pub struct RouletteUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn MessagePusher>,
    scheduler: Arc<dyn RoundScheduler>,
}

impl RouletteUseCase {
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

    /// Host spins the wheel for the current item. When somebody is
    /// drawn, the result settles after the animation delay; the domain
    /// re-validates the round at that point, so the host moving on in
    /// the meantime abandons the draw.
    pub async fn spin(&self, caller: &ClientId, code: &str) -> Result<(), ActionError> {
        let (code, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let mut room = handle.lock().await;
        let (events, pending) = {
            let mut rng = rand::thread_rng();
            room.spin_roulette(caller, &mut rng)?
        };
        dispatch(self.pusher.as_ref(), &room, events).await;
        drop(room);

        if let Some(spin) = pending {
            // the wheel supersedes any running bid countdown
            self.scheduler.cancel(&code).await;
            let registry = Arc::clone(&self.registry);
            let pusher = Arc::clone(&self.pusher);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ROULETTE_SETTLE_MS as u64)).await;
                let Some(handle) = registry.get(&code).await else {
                    return;
                };
                let mut room = handle.lock().await;
                let events = room.settle_roulette(&spin);
                dispatch(pusher.as_ref(), &room, events).await;
            });
        }
        Ok(())
    }

    /// Host opens/closes the roulette modal on every client.
    pub async fn modal(&self, caller: &ClientId, code: &str, open: bool) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let room = handle.lock().await;
        let events = room.roulette_modal(caller, open)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }

    /// Host dismisses the roulette result on every client.
    pub async fn close(&self, caller: &ClientId, code: &str) -> Result<(), ActionError> {
        let (_, handle) = resolve_room(self.registry.as_ref(), code).await?;
        let room = handle.lock().await;
        let events = room.roulette_close(caller)?;
        dispatch(self.pusher.as_ref(), &room, events).await;
        Ok(())
    }
}
