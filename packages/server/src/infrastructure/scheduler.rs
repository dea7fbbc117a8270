//! Tokio-backed round scheduler.
//!
//! Holds the single live countdown task per room. Arming replaces (and
//! aborts) whatever was pending, so a superseded timer can never fire —
//! the correctness of the award path depends on that, not just on the
//! idempotence of adjudication.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::{RoomCode, RoundScheduler};

pub struct TokioRoundScheduler {
    timers: Mutex<HashMap<RoomCode, JoinHandle<()>>>,
}

impl TokioRoundScheduler {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for TokioRoundScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoundScheduler for TokioRoundScheduler {
    async fn arm(&self, code: RoomCode, task: BoxFuture<'static, ()>) {
        let mut timers = self.timers.lock().await;
        if let Some(previous) = timers.remove(&code) {
            previous.abort();
        }
        timers.insert(code, tokio::spawn(task));
    }

    async fn cancel(&self, code: &RoomCode) {
        let mut timers = self.timers.lock().await;
        if let Some(handle) = timers.remove(code) {
            handle.abort();
        }
    }
}
