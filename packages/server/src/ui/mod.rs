//! UI layer: axum router, WebSocket gateway and HTTP handlers.

mod handler;
mod server;
mod signal;
mod state;

pub use server::Server;
pub use state::AppState;
