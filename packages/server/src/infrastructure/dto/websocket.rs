//! Inbound WebSocket command DTOs.
//!
//! Commands arrive as JSON objects tagged by `type`; variant names are
//! the event names the clients already emit and payload fields keep
//! their camelCase spellings. Numeric payloads that browsers send
//! loosely (bid values, budget amounts, indices) are carried as raw
//! JSON and coerced with `Number()` semantics where they are consumed.

use serde::Deserialize;

use crate::domain::{PlayerCard, TransferOffer, lenient_number};

/// One client-to-server message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        avatar: Option<serde_json::Value>,
    },
    JoinRoom {
        #[serde(default)]
        code: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        avatar: Option<serde_json::Value>,
    },
    SetAllBudgets {
        #[serde(default)]
        code: String,
        #[serde(default)]
        amount: serde_json::Value,
    },
    StartGame {
        #[serde(default)]
        code: String,
    },
    SetRound {
        #[serde(default)]
        code: String,
        #[serde(default)]
        position_name: String,
        #[serde(default)]
        rounds: serde_json::Value,
    },
    SetPlayer {
        #[serde(default)]
        code: String,
        player: PlayerCard,
        #[serde(default)]
        index: serde_json::Value,
    },
    PlaceBid {
        #[serde(default)]
        code: String,
        #[serde(default)]
        value: Option<serde_json::Value>,
    },
    PlayerRevealed {
        #[serde(default)]
        code: String,
    },
    ConfirmWinner {
        #[serde(default)]
        code: String,
    },
    SpinRoulette {
        #[serde(default)]
        code: String,
    },
    RouletteModal {
        #[serde(default)]
        code: String,
        #[serde(default)]
        open: serde_json::Value,
    },
    RouletteClose {
        #[serde(default)]
        code: String,
    },
    MarketState {
        #[serde(default)]
        code: String,
        #[serde(default)]
        open: serde_json::Value,
        #[serde(default)]
        reason: Option<String>,
    },
    TransferOffer(TransferOffer),
    TransferOfferUpdate {
        #[serde(default)]
        code: String,
        #[serde(default)]
        action: String,
        offer: TransferOffer,
    },
}

/// `Number()` coercion for a bid value: an absent field is NaN (and
/// gets rejected downstream), everything else follows the lenient rules.
pub fn bid_value(value: &Option<serde_json::Value>) -> f64 {
    match value {
        Some(v) => lenient_number(v),
        None => f64::NAN,
    }
}

/// JavaScript truthiness, for the `open` flags clients send as anything.
pub fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// `Number(index) || 1` for the item index a host sends with
/// `set_player`.
pub fn item_index(value: &serde_json::Value) -> i64 {
    let n = lenient_number(value);
    if n.is_finite() && n != 0.0 { n as i64 } else { 1 }
}

/// `rounds || 0` for the round count.
pub fn round_count(value: &serde_json::Value) -> u32 {
    let n = lenient_number(value);
    if n.is_finite() && n > 0.0 { n as u32 } else { 0 }
}
