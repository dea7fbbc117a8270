//! Room registry interface required by the domain.
//!
//! The registry owns the process-wide room table. The usecase layer
//! depends on this trait; the in-memory implementation lives in the
//! infrastructure layer (dependency inversion).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Participant, Room, RoomCode};

#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Create a room hosted by `host` under a freshly generated code
    /// that is guaranteed absent from the table at insertion time.
    async fn create_room(&self, host: Participant) -> (RoomCode, Arc<Mutex<Room>>);

    /// Look up a live room.
    async fn get(&self, code: &RoomCode) -> Option<Arc<Mutex<Room>>>;

    /// Drop a room; its code becomes reusable.
    async fn remove(&self, code: &RoomCode);

    /// Number of live rooms.
    async fn count(&self) -> usize;

    /// Clone of every live room, for the debug endpoint.
    async fn snapshot(&self) -> Vec<Room>;
}
