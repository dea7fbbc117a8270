//! Countdown scheduling interface required by the domain.

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use super::RoomCode;

/// Owner of the per-room countdown task.
///
/// At most one timer is live per room: arming a new one always cancels
/// the previous handle first, and a cancelled task must never fire.
#[async_trait]
pub trait RoundScheduler: Send + Sync {
    /// Replace the room's live timer with `task`, cancelling any
    /// predecessor.
    async fn arm(&self, code: RoomCode, task: BoxFuture<'static, ()>);

    /// Cancel the room's live timer, if any.
    async fn cancel(&self, code: &RoomCode);
}
