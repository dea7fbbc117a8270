//! Transfer market: offer relay and the atomic accept transaction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{
    ActionError, ClientId, Envelope, PositionGroup, Room, RoomEvent, TradeReject,
};

/// One proposed slot swap inside an offer: a slot of the sender's roster
/// against a slot of the receiver's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_slot: Option<String>,
}

/// A transfer offer as sent by a client. The server validates only what
/// it needs (parties, cash, pairs) and relays the envelope verbatim —
/// unknown fields ride along in `extra`.
///
/// Cash amounts stay raw JSON until accept time because clients send
/// them as numbers or numeric strings interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOffer {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub cash_mine: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub cash_theirs: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<TradePair>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TransferOffer {
    fn has_parties(&self) -> bool {
        !self.from.trim().is_empty() && !self.to.trim().is_empty()
    }
}

/// Result of processing a `transfer_offer_update`: the relay (and, on a
/// successful accept, the roster/budget updates) plus the reason the
/// swap itself was skipped, if it was. The rejection is internal only —
/// no event is emitted for it.
#[derive(Debug)]
pub struct OfferUpdateOutcome {
    pub events: Vec<Envelope>,
    pub rejected: Option<ActionError>,
}

/// `Number()`-style coercion for values the web clients send where a
/// number is expected. Returns NaN for anything non-numeric.
pub fn lenient_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Null => 0.0,
        serde_json::Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

/// Cash amounts are clamped to non-negative whole currency.
fn non_negative_cash(value: &serde_json::Value) -> i64 {
    let n = lenient_number(value);
    if n.is_finite() { n.max(0.0) as i64 } else { 0 }
}

impl Room {
    /// Host opens or closes the transfer market.
    pub fn set_market_state(
        &mut self,
        caller: &ClientId,
        open: bool,
        reason: Option<String>,
    ) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        self.market_open = open;
        let reason = reason
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "broadcast".to_string());
        Ok(vec![Envelope::room(RoomEvent::MarketState { open, reason })])
    }

    /// Relay an offer to the whole room so everyone sees the detail;
    /// only the targeted party will answer it. The sender must be the
    /// connection it claims to be.
    pub fn relay_offer(
        &self,
        caller: &ClientId,
        offer: TransferOffer,
    ) -> Result<Vec<Envelope>, ActionError> {
        if !self.market_open {
            return Err(ActionError::MarketClosed);
        }
        if !offer.has_parties() {
            return Err(ActionError::InvalidTrade(TradeReject::MalformedOffer));
        }
        if offer.from != caller.as_str() {
            return Err(ActionError::InvalidTrade(TradeReject::NotYourOffer));
        }
        Ok(vec![Envelope::room(RoomEvent::TransferOffer(offer))])
    }

    /// Relay an offer update to the room; on `accept` also execute the
    /// swap. The relay goes out regardless of whether the swap applies —
    /// a failed accept is skipped silently, all-or-nothing.
    pub fn offer_update(
        &mut self,
        action: &str,
        offer: TransferOffer,
    ) -> Result<OfferUpdateOutcome, ActionError> {
        if !offer.has_parties() {
            return Err(ActionError::InvalidTrade(TradeReject::MalformedOffer));
        }
        let mut events = vec![Envelope::room(RoomEvent::TransferOfferUpdate {
            action: action.to_string(),
            offer: offer.clone(),
        })];
        if action != "accept" {
            return Ok(OfferUpdateOutcome {
                events,
                rejected: None,
            });
        }
        if !self.market_open {
            return Ok(OfferUpdateOutcome {
                events,
                rejected: Some(ActionError::MarketClosed),
            });
        }
        match self.accept_offer(&offer) {
            Ok(mut trade_events) => {
                events.append(&mut trade_events);
                Ok(OfferUpdateOutcome {
                    events,
                    rejected: None,
                })
            }
            Err(reason) => Ok(OfferUpdateOutcome {
                events,
                rejected: Some(ActionError::InvalidTrade(reason)),
            }),
        }
    }

    /// The accept transaction: validate everything, then swap roster
    /// slots and move cash in one step. Any rejection leaves both
    /// parties untouched.
    fn accept_offer(&mut self, offer: &TransferOffer) -> Result<Vec<Envelope>, TradeReject> {
        let from = ClientId::new(offer.from.clone()).map_err(|_| TradeReject::MalformedOffer)?;
        let to = ClientId::new(offer.to.clone()).map_err(|_| TradeReject::MalformedOffer)?;

        let budget_from = self.budgets.get(&from).copied().unwrap_or(0);
        let budget_to = self.budgets.get(&to).copied().unwrap_or(0);
        let cash_mine = non_negative_cash(&offer.cash_mine);
        let cash_theirs = non_negative_cash(&offer.cash_theirs);
        if budget_from < cash_mine || budget_to < cash_theirs {
            return Err(TradeReject::InsufficientCash);
        }

        // work on copies; nothing is visible until commit
        let mut team_from = self.teams.get(&from).cloned().unwrap_or_default();
        let mut team_to = self.teams.get(&to).cloned().unwrap_or_default();
        let mut used_mine: HashSet<String> = HashSet::new();
        let mut used_theirs: HashSet<String> = HashSet::new();
        let mut applied_any = false;
        for pair in &offer.pairs {
            let (Some(my_slot), Some(opp_slot)) =
                (pair.my_slot.as_deref(), pair.opponent_slot.as_deref())
            else {
                continue;
            };
            if my_slot.is_empty() || opp_slot.is_empty() {
                continue;
            }
            // each slot may be consumed by one pair only
            if used_mine.contains(my_slot) || used_theirs.contains(opp_slot) {
                continue;
            }
            if PositionGroup::of(my_slot) != PositionGroup::of(opp_slot) {
                continue;
            }
            let (Some(theirs), Some(mine)) = (
                team_to.get(opp_slot).cloned(),
                team_from.get(my_slot).cloned(),
            ) else {
                continue;
            };
            team_to.insert(opp_slot.to_string(), mine);
            team_from.insert(my_slot.to_string(), theirs);
            used_mine.insert(my_slot.to_string());
            used_theirs.insert(opp_slot.to_string());
            applied_any = true;
        }

        if !applied_any && cash_mine == 0 && cash_theirs == 0 {
            return Err(TradeReject::NothingToApply);
        }

        let new_from = budget_from - cash_mine + cash_theirs;
        let new_to = budget_to - cash_theirs + cash_mine;
        // unreachable given the sufficiency check above, but the invariant
        // is cheap to enforce at the last write
        if new_from < 0 || new_to < 0 {
            return Err(TradeReject::NegativeBudget);
        }

        self.budgets.insert(from.clone(), new_from);
        self.budgets.insert(to.clone(), new_to);
        self.teams.insert(from.clone(), team_from.clone());
        self.teams.insert(to.clone(), team_to.clone());

        let mut users = HashMap::new();
        users.insert(from, team_from);
        users.insert(to, team_to);
        Ok(vec![
            Envelope::room(RoomEvent::TeamsUpdate { users }),
            Envelope::room(self.budget_update()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Participant, RoomCode, TeamSlot};
    use super::*;

    fn slot(name: &str, price: i64) -> TeamSlot {
        TeamSlot {
            name: name.to_string(),
            price,
            photo: None,
        }
    }

    /// Two-party room with an open market, budgets 800/600 and a
    /// goalkeeper on each roster.
    fn market_room() -> (Room, ClientId, ClientId) {
        let host = Participant::new(ClientId::random(), "host".to_string(), None);
        let host_id = host.id.clone();
        let mut room = Room::new(RoomCode::parse("AB2CD3").unwrap(), host);
        let other = Participant::new(ClientId::random(), "ana".to_string(), None);
        let other_id = other.id.clone();
        room.join(other).unwrap();
        room.set_market_state(&host_id, true, None).unwrap();
        room.budgets.insert(host_id.clone(), 800);
        room.budgets.insert(other_id.clone(), 600);
        room.teams
            .get_mut(&host_id)
            .unwrap()
            .insert("Portero".to_string(), slot("Iker", 100));
        room.teams
            .get_mut(&other_id)
            .unwrap()
            .insert("Portero".to_string(), slot("Victor", 80));
        (room, host_id, other_id)
    }

    fn offer(from: &ClientId, to: &ClientId, cash_mine: i64, cash_theirs: i64) -> TransferOffer {
        serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": from.as_str(),
            "to": to.as_str(),
            "cashMine": cash_mine,
            "cashTheirs": cash_theirs,
            "pairs": [{ "mySlot": "Portero", "opponentSlot": "Portero" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_offer_relay_requires_an_open_market() {
        // given:
        let (mut room, a, b) = market_room();
        room.set_market_state(&a, false, None).unwrap();

        // when / then:
        assert_eq!(
            room.relay_offer(&a, offer(&a, &b, 0, 0)).unwrap_err(),
            ActionError::MarketClosed
        );
    }

    #[test]
    fn test_offer_relay_rejects_an_impersonated_sender() {
        // given:
        let (room, a, b) = market_room();

        // when: b relays an offer claiming to be from a
        let result = room.relay_offer(&b, offer(&a, &b, 0, 0));

        // then:
        assert_eq!(
            result.unwrap_err(),
            ActionError::InvalidTrade(TradeReject::NotYourOffer)
        );
    }

    #[test]
    fn test_accept_swaps_slots_and_moves_cash() {
        // given: budgets 800/600, a goalkeeper on each side, 50 cash
        // from the first party
        let (mut room, a, b) = market_room();

        // when:
        let outcome = room.offer_update("accept", offer(&a, &b, 50, 0)).unwrap();

        // then:
        assert_eq!(outcome.rejected, None);
        assert_eq!(room.budgets[&a], 750);
        assert_eq!(room.budgets[&b], 650);
        assert_eq!(room.teams[&a]["Portero"].name, "Victor");
        assert_eq!(room.teams[&b]["Portero"].name, "Iker");
        // relay + teams_update + budget_update
        assert_eq!(outcome.events.len(), 3);
    }

    #[test]
    fn test_cash_conserves_across_a_trade() {
        // given:
        let (mut room, a, b) = market_room();
        let before = room.budgets[&a] + room.budgets[&b];

        // when: cash moves both ways
        room.offer_update("accept", offer(&a, &b, 200, 75)).unwrap();

        // then:
        assert_eq!(room.budgets[&a] + room.budgets[&b], before);
    }

    #[test]
    fn test_accept_with_unaffordable_cash_changes_nothing() {
        // given: cashMine above the sender's 800
        let (mut room, a, b) = market_room();

        // when:
        let outcome = room.offer_update("accept", offer(&a, &b, 900, 0)).unwrap();

        // then: both budgets and both rosters are untouched
        assert_eq!(
            outcome.rejected,
            Some(ActionError::InvalidTrade(TradeReject::InsufficientCash))
        );
        assert_eq!(room.budgets[&a], 800);
        assert_eq!(room.budgets[&b], 600);
        assert_eq!(room.teams[&a]["Portero"].name, "Iker");
        assert_eq!(room.teams[&b]["Portero"].name, "Victor");
        // only the relay went out
        assert_eq!(outcome.events.len(), 1);
    }

    #[test]
    fn test_accept_while_market_closed_only_relays() {
        // given:
        let (mut room, a, b) = market_room();
        room.set_market_state(&a, false, None).unwrap();

        // when:
        let outcome = room.offer_update("accept", offer(&a, &b, 50, 0)).unwrap();

        // then:
        assert_eq!(outcome.rejected, Some(ActionError::MarketClosed));
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(room.budgets[&a], 800);
    }

    #[test]
    fn test_cross_group_pairs_are_skipped() {
        // given: a striker on one side, a goalkeeper on the other
        let (mut room, a, b) = market_room();
        room.teams
            .get_mut(&a)
            .unwrap()
            .insert("Delantero Centro".to_string(), slot("Raul", 90));
        let o: TransferOffer = serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": a.as_str(),
            "to": b.as_str(),
            "cashMine": 0,
            "cashTheirs": 0,
            "pairs": [{ "mySlot": "Delantero Centro", "opponentSlot": "Portero" }]
        }))
        .unwrap();

        // when:
        let outcome = room.offer_update("accept", o).unwrap();

        // then: the pair is skipped, so nothing applied at all
        assert_eq!(
            outcome.rejected,
            Some(ActionError::InvalidTrade(TradeReject::NothingToApply))
        );
        assert_eq!(room.teams[&a]["Delantero Centro"].name, "Raul");
    }

    #[test]
    fn test_a_slot_is_consumed_by_at_most_one_pair() {
        // given: the same goalkeeper slot offered twice
        let (mut room, a, b) = market_room();
        let o: TransferOffer = serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": a.as_str(),
            "to": b.as_str(),
            "pairs": [
                { "mySlot": "Portero", "opponentSlot": "Portero" },
                { "mySlot": "Portero", "opponentSlot": "Portero" }
            ]
        }))
        .unwrap();

        // when:
        let outcome = room.offer_update("accept", o).unwrap();

        // then: one swap happened, not a swap-back
        assert_eq!(outcome.rejected, None);
        assert_eq!(room.teams[&a]["Portero"].name, "Victor");
        assert_eq!(room.teams[&b]["Portero"].name, "Iker");
    }

    #[test]
    fn test_pairs_with_an_empty_side_are_skipped() {
        // given: the receiver has no striker slot filled
        let (mut room, a, b) = market_room();
        room.teams
            .get_mut(&a)
            .unwrap()
            .insert("Delantero Centro".to_string(), slot("Raul", 90));
        let o: TransferOffer = serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": a.as_str(),
            "to": b.as_str(),
            "pairs": [{ "mySlot": "Delantero Centro", "opponentSlot": "Delantero Centro" }]
        }))
        .unwrap();

        // when:
        let outcome = room.offer_update("accept", o).unwrap();

        // then:
        assert_eq!(
            outcome.rejected,
            Some(ActionError::InvalidTrade(TradeReject::NothingToApply))
        );
    }

    #[test]
    fn test_cash_only_trades_apply_without_pairs() {
        // given:
        let (mut room, a, b) = market_room();
        let o: TransferOffer = serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": a.as_str(),
            "to": b.as_str(),
            "cashTheirs": 100
        }))
        .unwrap();

        // when:
        let outcome = room.offer_update("accept", o).unwrap();

        // then:
        assert_eq!(outcome.rejected, None);
        assert_eq!(room.budgets[&a], 900);
        assert_eq!(room.budgets[&b], 500);
    }

    #[test]
    fn test_non_accept_actions_only_relay() {
        // given:
        let (mut room, a, b) = market_room();

        // when:
        let outcome = room.offer_update("reject", offer(&a, &b, 50, 0)).unwrap();

        // then:
        assert_eq!(outcome.rejected, None);
        assert_eq!(outcome.events.len(), 1);
        assert!(matches!(
            &outcome.events[0].event,
            RoomEvent::TransferOfferUpdate { action, .. } if action == "reject"
        ));
        assert_eq!(room.budgets[&a], 800);
    }

    #[test]
    fn test_offer_without_parties_is_malformed() {
        // given:
        let (mut room, a, _b) = market_room();
        let o: TransferOffer = serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": a.as_str(),
            "to": ""
        }))
        .unwrap();

        // when / then:
        assert_eq!(
            room.offer_update("accept", o).unwrap_err(),
            ActionError::InvalidTrade(TradeReject::MalformedOffer)
        );
    }

    #[test]
    fn test_numeric_string_cash_is_accepted() {
        // given: a client sending cash as a string
        let (mut room, a, b) = market_room();
        let o: TransferOffer = serde_json::from_value(serde_json::json!({
            "code": "AB2CD3",
            "from": a.as_str(),
            "to": b.as_str(),
            "cashMine": "50",
            "pairs": [{ "mySlot": "Portero", "opponentSlot": "Portero" }]
        }))
        .unwrap();

        // when:
        let outcome = room.offer_update("accept", o).unwrap();

        // then:
        assert_eq!(outcome.rejected, None);
        assert_eq!(room.budgets[&a], 750);
        assert_eq!(room.budgets[&b], 650);
    }

    #[test]
    fn test_lenient_number_coercion() {
        assert_eq!(lenient_number(&serde_json::json!(50)), 50.0);
        assert_eq!(lenient_number(&serde_json::json!("50")), 50.0);
        assert_eq!(lenient_number(&serde_json::json!(" 7.5 ")), 7.5);
        assert_eq!(lenient_number(&serde_json::json!("")), 0.0);
        assert_eq!(lenient_number(&serde_json::Value::Null), 0.0);
        assert_eq!(lenient_number(&serde_json::json!(true)), 1.0);
        assert!(lenient_number(&serde_json::json!("abc")).is_nan());
        assert!(lenient_number(&serde_json::json!([1])).is_nan());
    }
}
