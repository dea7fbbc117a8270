//! WebSocket gateway: one connection per client, commands in, events out.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{ActionError, ClientId, RoomCode, RoomEvent, lenient_number},
    infrastructure::dto::websocket::{ClientCommand, bid_value, item_index, round_count, truthy},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Spawns the task that drains the client's outbound channel into its
/// WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // the connection id doubles as the participant id for the lifetime
    // of this socket
    let client_id = ClientId::random();
    let (tx, rx) = mpsc::unbounded_channel();
    state.pusher.register_client(client_id.clone(), tx).await;
    tracing::info!("Client '{}' connected", client_id);

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    // which room this socket has entered, shared with the cleanup below
    let joined: Arc<Mutex<Option<RoomCode>>> = Arc::new(Mutex::new(None));

    let state_for_recv = state.clone();
    let client_for_recv = client_id.clone();
    let joined_for_recv = joined.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };
            match msg {
                Message::Text(text) => {
                    handle_command(&state_for_recv, &client_for_recv, &joined_for_recv, &text)
                        .await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", client_for_recv);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.pusher.unregister_client(&client_id).await;
    let code = joined.lock().await.take();
    if let Some(code) = code {
        state.membership.disconnect(&client_id, &code).await;
    }
    tracing::info!("Client '{}' disconnected", client_id);
}

/// Parse and dispatch one inbound message. Validation and authorization
/// failures are absorbed here: only a failed join talks back to the
/// client, everything else is logged at debug level and dropped.
async fn handle_command(
    state: &Arc<AppState>,
    client_id: &ClientId,
    joined: &Arc<Mutex<Option<RoomCode>>>,
    text: &str,
) {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Dropping unparseable command: {}", e);
            return;
        }
    };

    match command {
        ClientCommand::CreateRoom { name, avatar } => {
            let code = state
                .membership
                .create_room(client_id.clone(), name, avatar)
                .await;
            *joined.lock().await = Some(code);
        }
        ClientCommand::JoinRoom { code, name, avatar } => {
            match state
                .membership
                .join_room(client_id.clone(), &code, name, avatar)
                .await
            {
                Ok(code) => {
                    *joined.lock().await = Some(code);
                }
                Err(error @ (ActionError::RoomNotFound | ActionError::AvatarTaken)) => {
                    send_room_error(state, client_id, &error).await;
                }
                Err(error) => {
                    tracing::debug!("join_room ignored: {}", error);
                }
            }
        }
        ClientCommand::SetAllBudgets { code, amount } => absorb(
            state
                .auction
                .set_all_budgets(client_id, &code, lenient_number(&amount))
                .await,
            "set_all_budgets",
        ),
        ClientCommand::StartGame { code } => {
            absorb(state.auction.start_game(client_id, &code).await, "start_game")
        }
        ClientCommand::SetRound {
            code,
            position_name,
            rounds,
        } => absorb(
            state
                .auction
                .set_round(client_id, &code, position_name, round_count(&rounds))
                .await,
            "set_round",
        ),
        ClientCommand::SetPlayer {
            code,
            player,
            index,
        } => absorb(
            state
                .auction
                .set_player(client_id, &code, player, item_index(&index))
                .await,
            "set_player",
        ),
        ClientCommand::PlaceBid { code, value } => absorb(
            state
                .auction
                .place_bid(client_id, &code, bid_value(&value))
                .await,
            "place_bid",
        ),
        ClientCommand::PlayerRevealed { code } => absorb(
            state.auction.reveal_player(client_id, &code).await,
            "player_revealed",
        ),
        ClientCommand::ConfirmWinner { code } => absorb(
            state.auction.confirm_winner(client_id, &code).await,
            "confirm_winner",
        ),
        ClientCommand::SpinRoulette { code } => {
            absorb(state.roulette.spin(client_id, &code).await, "spin_roulette")
        }
        ClientCommand::RouletteModal { code, open } => absorb(
            state.roulette.modal(client_id, &code, truthy(&open)).await,
            "roulette_modal",
        ),
        ClientCommand::RouletteClose { code } => absorb(
            state.roulette.close(client_id, &code).await,
            "roulette_close",
        ),
        ClientCommand::MarketState { code, open, reason } => absorb(
            state
                .trade
                .market_state(client_id, &code, truthy(&open), reason)
                .await,
            "market_state",
        ),
        ClientCommand::TransferOffer(offer) => absorb(
            state.trade.offer(client_id, offer).await,
            "transfer_offer",
        ),
        ClientCommand::TransferOfferUpdate {
            code,
            action,
            offer,
        } => absorb(
            state.trade.offer_update(&code, &action, offer).await,
            "transfer_offer_update",
        ),
    }
}

/// Fail closed and quiet: skipped operations never talk back to the
/// caller.
fn absorb(result: Result<(), ActionError>, operation: &str) {
    if let Err(error) = result {
        tracing::debug!("{} ignored: {}", operation, error);
    }
}

/// The two errors the protocol does surface, with the messages the
/// front-end shows verbatim.
async fn send_room_error(state: &Arc<AppState>, client_id: &ClientId, error: &ActionError) {
    let message = match error {
        ActionError::RoomNotFound => "La sala no existe.",
        ActionError::AvatarTaken => {
            "El avatar seleccionado ya está en uso en esta sala. Elige otro."
        }
        _ => return,
    };
    let event = RoomEvent::RoomError {
        message: message.to_string(),
    };
    match serde_json::to_string(&event) {
        Ok(payload) => {
            if let Err(e) = state.pusher.push_to(client_id, &payload).await {
                tracing::warn!("Failed to push room_error to '{}': {}", client_id, e);
            }
        }
        Err(e) => tracing::error!("Failed to serialize room_error: {}", e),
    }
}
