//! In-memory room registry.
//!
//! Implements the `RoomRegistry` trait the domain defines (dependency
//! inversion). The table maps room codes to shared room handles; each
//! room is mutated under its own lock, the table lock only guards
//! membership of the table itself. All state is ephemeral by design.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Participant, Room, RoomCode, RoomRegistry};

/// Process-wide room table. Constructed once at startup and shared by
/// every usecase; never a global.
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<RoomCode, Arc<Mutex<Room>>>>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn create_room(&self, host: Participant) -> (RoomCode, Arc<Mutex<Room>>) {
        let mut rooms = self.rooms.lock().await;
        // collisions are vanishingly rare at 32^6 codes, but the loop
        // makes reuse of a freed code safe rather than assumed
        let mut rng = rand::thread_rng();
        let code = loop {
            let candidate = RoomCode::random(&mut rng);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Arc::new(Mutex::new(Room::new(code.clone(), host)));
        rooms.insert(code.clone(), room.clone());
        (code, room)
    }

    async fn get(&self, code: &RoomCode) -> Option<Arc<Mutex<Room>>> {
        let rooms = self.rooms.lock().await;
        rooms.get(code).cloned()
    }

    async fn remove(&self, code: &RoomCode) {
        let mut rooms = self.rooms.lock().await;
        rooms.remove(code);
    }

    async fn count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }

    async fn snapshot(&self) -> Vec<Room> {
        let handles: Vec<Arc<Mutex<Room>>> = {
            let rooms = self.rooms.lock().await;
            rooms.values().cloned().collect()
        };
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.lock().await.clone());
        }
        out
    }
}
