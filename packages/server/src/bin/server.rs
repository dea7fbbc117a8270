//! Room-based auction game server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin subasta-server
//! cargo run --bin subasta-server -- --host 0.0.0.0 --port 3000
//! PORT=8080 cargo run --bin subasta-server
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use subasta_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

use subasta_server::{
    domain::{MessagePusher, RoomRegistry, RoundScheduler},
    infrastructure::{InMemoryRoomRegistry, TokioRoundScheduler, WebSocketMessagePusher},
    ui::Server,
    usecase::{AuctionUseCase, MembershipUseCase, RouletteUseCase, TradeUseCase},
};

#[derive(Parser, Debug)]
#[command(name = "subasta-server")]
#[command(about = "Room-based auction game server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Directory with the static front-end assets; player photos are
    /// expected in its Fotos/ subdirectory
    #[arg(long, default_value = ".")]
    assets_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Registry (in-memory room table)
    // 2. MessagePusher (WebSocket implementation)
    // 3. Scheduler + Clock
    // 4. UseCases
    // 5. Server
    let registry: Arc<dyn RoomRegistry> = Arc::new(InMemoryRoomRegistry::new());
    let pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
    let scheduler: Arc<dyn RoundScheduler> = Arc::new(TokioRoundScheduler::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let membership = Arc::new(MembershipUseCase::new(
        registry.clone(),
        pusher.clone(),
        scheduler.clone(),
    ));
    let auction = Arc::new(AuctionUseCase::new(
        registry.clone(),
        pusher.clone(),
        scheduler.clone(),
        clock,
    ));
    let roulette = Arc::new(RouletteUseCase::new(
        registry.clone(),
        pusher.clone(),
        scheduler.clone(),
    ));
    let trade = Arc::new(TradeUseCase::new(registry.clone(), pusher.clone()));

    let server = Server::new(
        membership,
        auction,
        roulette,
        trade,
        registry,
        pusher,
        args.assets_dir,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
