//! Outbound events produced by room state transitions.

use std::collections::HashMap;

use serde::Serialize;

use super::{ClientId, Participant, PlayerCard, RoomCode, Team, TransferOffer};

/// Where an event is delivered: the whole room or one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Room,
    Client(ClientId),
}

/// An addressed event. Room transitions return these; the usecase layer
/// serializes and pushes them through the gateway.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub target: Target,
    pub event: RoomEvent,
}

impl Envelope {
    /// Broadcast to every participant of the room.
    pub fn room(event: RoomEvent) -> Self {
        Self {
            target: Target::Room,
            event,
        }
    }

    /// Deliver to a single connection.
    pub fn client(id: ClientId, event: RoomEvent) -> Self {
        Self {
            target: Target::Client(id),
            event,
        }
    }
}

/// The outbound wire protocol. Variant names are the event names on the
/// wire (`type` field); payload fields keep the camelCase shapes the
/// clients already speak.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    RoomCreated {
        code: RoomCode,
        participants: Vec<Participant>,
    },
    RoomJoined {
        code: RoomCode,
        participants: Vec<Participant>,
    },
    RoomError {
        message: String,
    },
    ParticipantsUpdate {
        code: RoomCode,
        participants: Vec<Participant>,
    },
    BudgetUpdate {
        budgets: HashMap<ClientId, i64>,
    },
    MarketState {
        open: bool,
        reason: String,
    },
    GameStarted {
        code: RoomCode,
    },
    RoundSet {
        position_name: String,
        rounds: u32,
    },
    PlayerSet {
        player: PlayerCard,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_rounds: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        position_name: Option<String>,
    },
    BidUpdate {
        current_bid: i64,
        bidder_id: Option<ClientId>,
    },
    TimerUpdate {
        end_at: Option<i64>,
    },
    /// Emitted with a payload when the host reveals, and bare (no
    /// payload) by the adjudication routine to force the reveal before
    /// the win banner.
    PlayerRevealed {
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<PlayerCard>,
        #[serde(skip_serializing_if = "Option::is_none")]
        position_name: Option<String>,
    },
    WinnerConfirmed {
        winner_id: ClientId,
        price: i64,
        player: PlayerCard,
        position_name: String,
    },
    TeamsUpdate {
        users: HashMap<ClientId, Team>,
    },
    RouletteUpdate {
        count: usize,
        position_name: String,
    },
    RouletteSpun {
        winner_id: ClientId,
        position_name: String,
        price: i64,
    },
    RouletteModal {
        open: bool,
    },
    RouletteClose,
    HostChanged {
        code: RoomCode,
        host_id: ClientId,
    },
    TransferOffer(TransferOffer),
    TransferOfferUpdate {
        action: String,
        offer: TransferOffer,
    },
}
