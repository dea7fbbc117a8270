//! Auction items and team rosters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A player card put up for auction by the host.
///
/// Clients attach presentation-only fields (clues, nationality, ...)
/// that the server relays without interpreting; they ride along in
/// `extra` so the card survives the round-trip verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCard {
    pub name: String,
    /// Reserve (minimum) price.
    #[serde(default)]
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clues: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What a participant paid for a position: the won card reduced to the
/// fields the roster needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSlot {
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// A participant's roster, keyed by position name.
pub type Team = HashMap<String, TeamSlot>;

impl TeamSlot {
    /// Build the roster entry for a card won at `price`.
    pub fn won(card: &PlayerCard, price: i64) -> Self {
        Self {
            name: card.name.clone(),
            price,
            photo: card.photo.clone(),
        }
    }
}
