//! Shared application state for the axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{MessagePusher, RoomRegistry};
use crate::usecase::{AuctionUseCase, MembershipUseCase, RouletteUseCase, TradeUseCase};

pub struct AppState {
    pub membership: Arc<MembershipUseCase>,
    pub auction: Arc<AuctionUseCase>,
    pub roulette: Arc<RouletteUseCase>,
    pub trade: Arc<TradeUseCase>,
    /// Needed directly by the debug endpoint.
    pub registry: Arc<dyn RoomRegistry>,
    /// Needed directly by the gateway to register connections and to
    /// surface `room_error` events.
    pub pusher: Arc<dyn MessagePusher>,
    /// Root of the static front-end assets; player photos live in its
    /// `Fotos/` subdirectory.
    pub assets_dir: PathBuf,
}
