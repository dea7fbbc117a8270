//! Server execution logic.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::domain::{MessagePusher, RoomRegistry};
use crate::usecase::{AuctionUseCase, MembershipUseCase, RouletteUseCase, TradeUseCase};

use super::{
    handler::{
        http::{debug_rooms, health_check, photo_manifest},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// The auction game server: WebSocket gateway plus the static-asset and
/// manifest collaborators.
pub struct Server {
    membership: Arc<MembershipUseCase>,
    auction: Arc<AuctionUseCase>,
    roulette: Arc<RouletteUseCase>,
    trade: Arc<TradeUseCase>,
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn MessagePusher>,
    assets_dir: PathBuf,
}

impl Server {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        membership: Arc<MembershipUseCase>,
        auction: Arc<AuctionUseCase>,
        roulette: Arc<RouletteUseCase>,
        trade: Arc<TradeUseCase>,
        registry: Arc<dyn RoomRegistry>,
        pusher: Arc<dyn MessagePusher>,
        assets_dir: PathBuf,
    ) -> Self {
        Self {
            membership,
            auction,
            roulette,
            trade,
            registry,
            pusher,
            assets_dir,
        }
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "0.0.0.0")
    /// * `port` - The port number to bind to (e.g., 3000)
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let assets_dir = self.assets_dir.clone();
        let app_state = Arc::new(AppState {
            membership: self.membership,
            auction: self.auction,
            roulette: self.roulette,
            trade: self.trade,
            registry: self.registry,
            pusher: self.pusher,
            assets_dir: assets_dir.clone(),
        });

        let app = Router::new()
            // WebSocket endpoint
            .route("/ws", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/photo-manifest", get(photo_manifest))
            .route("/debug/rooms", get(debug_rooms))
            // static front-end assets (photos included)
            .fallback_service(ServeDir::new(&assets_dir))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Auction game server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
