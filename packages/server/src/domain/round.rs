//! The active auction round of a room.

use serde::Serialize;

use super::{ClientId, PlayerCard};

/// Fixed bid increment. Raw bids are snapped to multiples of this step.
pub const BID_STEP: i64 = 5;

/// Countdown armed after every accepted bid, in milliseconds. Expiry
/// triggers automatic adjudication.
pub const BID_TIMER_MS: i64 = 5_000;

/// Delay before a roulette result is settled, covering the client-side
/// wheel animation, in milliseconds.
pub const ROULETTE_SETTLE_MS: i64 = 5_200;

/// Per-room auction round state. Replaced wholesale on `start_game`;
/// the item and bid state reset on every `set_player`.
///
/// `timer_end_at` is the deadline shown to clients; the live scheduled
/// task itself is owned by the round scheduler, keyed by room code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Round {
    pub position_name: String,
    pub rounds: u32,
    pub player: Option<PlayerCard>,
    pub current_bid: i64,
    pub last_bidder: Option<ClientId>,
    pub awarded: bool,
    pub revealed: bool,
    pub timer_end_at: Option<i64>,
}

impl Round {
    /// Put a new item under the hammer, dropping all bid state from the
    /// previous one.
    pub fn put_up(&mut self, player: PlayerCard) {
        self.player = Some(player);
        self.current_bid = 0;
        self.last_bidder = None;
        self.awarded = false;
        self.revealed = false;
        self.timer_end_at = None;
    }

    /// Reserve price of the current item, 0 when none is active.
    pub fn reserve_price(&self) -> i64 {
        self.player.as_ref().map(|p| p.price).unwrap_or(0)
    }

    /// Minimum acceptable bid: one step above the standing bid, or the
    /// reserve price when nobody has bid yet.
    pub fn min_allowed_bid(&self) -> i64 {
        if self.current_bid > 0 {
            self.current_bid + BID_STEP
        } else {
            self.reserve_price()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(price: i64) -> PlayerCard {
        serde_json::from_value(serde_json::json!({ "name": "Luis", "price": price })).unwrap()
    }

    #[test]
    fn test_put_up_resets_bid_state() {
        // given: a round with leftover state from a previous item
        let mut round = Round {
            current_bid: 80,
            last_bidder: Some(ClientId::random()),
            awarded: true,
            revealed: true,
            timer_end_at: Some(99),
            ..Round::default()
        };

        // when:
        round.put_up(card(50));

        // then:
        assert_eq!(round.current_bid, 0);
        assert_eq!(round.last_bidder, None);
        assert!(!round.awarded);
        assert!(!round.revealed);
        assert_eq!(round.timer_end_at, None);
        assert_eq!(round.reserve_price(), 50);
    }

    #[test]
    fn test_min_allowed_bid_is_reserve_until_first_bid() {
        // given:
        let mut round = Round::default();
        round.put_up(card(50));

        // then:
        assert_eq!(round.min_allowed_bid(), 50);

        // when: somebody bids
        round.current_bid = 55;

        // then: the floor moves one step up
        assert_eq!(round.min_allowed_bid(), 60);
    }
}
