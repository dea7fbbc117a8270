//! The room entity and its state transitions.
//!
//! Every transition validates all preconditions before the first write
//! and returns the addressed events to emit, so no operation can leave
//! the room partially mutated and both adjudication triggers (countdown
//! expiry and host confirmation) share one idempotent routine.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::Serialize;

use super::{
    ActionError, BidReject, BID_STEP, ClientId, Envelope, Participant, PlayerCard, RoomCode,
    RoomEvent, Round, Team, TeamSlot,
};

/// Budget handed to every participant on first join.
pub const STARTING_BUDGET: i64 = 1_100;

/// Result of a participant leaving: whether the room died with them,
/// and the events to emit to whoever remains.
#[derive(Debug)]
pub struct LeaveOutcome {
    pub destroyed: bool,
    pub events: Vec<Envelope>,
}

/// A pending roulette draw, carried between the spin and the
/// animation-settle delay.
#[derive(Debug, Clone)]
pub struct RouletteSpin {
    pub winner: ClientId,
    pub position: String,
    pub reserve: i64,
}

/// Per-room auction state.
///
/// Participants are insertion-ordered; host failover promotes the first
/// remaining participant. `teams` deliberately outlives disconnects
/// while `participants`/`budgets` are pruned (see DESIGN.md).
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: ClientId,
    pub participants: Vec<Participant>,
    pub budgets: HashMap<ClientId, i64>,
    pub teams: HashMap<ClientId, Team>,
    pub winners_per_position: HashMap<String, HashSet<ClientId>>,
    pub market_open: bool,
    pub round: Round,
}

impl Room {
    /// Create a room with `host` as its first participant.
    pub fn new(code: RoomCode, host: Participant) -> Self {
        let host_id = host.id.clone();
        let mut budgets = HashMap::new();
        budgets.insert(host_id.clone(), STARTING_BUDGET);
        let mut teams = HashMap::new();
        teams.insert(host_id.clone(), Team::new());
        Self {
            code,
            host_id,
            participants: vec![host],
            budgets,
            teams,
            winners_per_position: HashMap::new(),
            market_open: false,
            round: Round::default(),
        }
    }

    /// Events sent right after creation: the host gets its initial
    /// state, the room gets the participant roster.
    pub fn created_events(&self) -> Vec<Envelope> {
        vec![
            Envelope::client(
                self.host_id.clone(),
                RoomEvent::RoomCreated {
                    code: self.code.clone(),
                    participants: self.participants.clone(),
                },
            ),
            Envelope::client(self.host_id.clone(), self.budget_update()),
            Envelope::client(
                self.host_id.clone(),
                RoomEvent::MarketState {
                    open: self.market_open,
                    reason: "init".to_string(),
                },
            ),
            Envelope::room(self.participants_update()),
        ]
    }

    /// Admit a participant. Fails when their avatar is already in use by
    /// someone currently in the room. Budget and team entries are only
    /// initialized when absent, and a late joiner is fast-forwarded into
    /// the round in progress.
    pub fn join(&mut self, participant: Participant) -> Result<Vec<Envelope>, ActionError> {
        if let Some(avatar) = &participant.avatar {
            let taken = self
                .participants
                .iter()
                .any(|p| p.avatar.as_ref() == Some(avatar));
            if taken {
                return Err(ActionError::AvatarTaken);
            }
        }

        let id = participant.id.clone();
        match self.participants.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
        self.budgets.entry(id.clone()).or_insert(STARTING_BUDGET);
        self.teams.entry(id.clone()).or_default();

        let mut events = vec![
            Envelope::client(
                id.clone(),
                RoomEvent::RoomJoined {
                    code: self.code.clone(),
                    participants: self.participants.clone(),
                },
            ),
            Envelope::client(id.clone(), self.budget_update()),
            Envelope::client(
                id.clone(),
                RoomEvent::MarketState {
                    open: self.market_open,
                    reason: "sync".to_string(),
                },
            ),
            Envelope::room(self.participants_update()),
        ];

        // fast-forward a late joiner into the round in progress
        if let Some(player) = &self.round.player {
            events.push(Envelope::client(
                id.clone(),
                RoomEvent::GameStarted {
                    code: self.code.clone(),
                },
            ));
            events.push(Envelope::client(
                id.clone(),
                RoomEvent::RoundSet {
                    position_name: self.round.position_name.clone(),
                    rounds: self.round.rounds,
                },
            ));
            events.push(Envelope::client(
                id.clone(),
                RoomEvent::PlayerSet {
                    player: player.clone(),
                    index: None,
                    total_rounds: None,
                    position_name: None,
                },
            ));
            if self.round.current_bid > 0 {
                events.push(Envelope::client(
                    id.clone(),
                    RoomEvent::BidUpdate {
                        current_bid: self.round.current_bid,
                        bidder_id: self.round.last_bidder.clone(),
                    },
                ));
            }
            if let Some(end_at) = self.round.timer_end_at {
                events.push(Envelope::client(
                    id,
                    RoomEvent::TimerUpdate {
                        end_at: Some(end_at),
                    },
                ));
            }
        }

        Ok(events)
    }

    /// Remove a connection. Budgets go with it; the team roster stays.
    /// The departing host hands over to the first remaining participant.
    pub fn leave(&mut self, id: &ClientId) -> LeaveOutcome {
        self.participants.retain(|p| &p.id != id);
        self.budgets.remove(id);

        if self.participants.is_empty() {
            return LeaveOutcome {
                destroyed: true,
                events: Vec::new(),
            };
        }

        let mut events = Vec::new();
        if &self.host_id == id {
            self.host_id = self.participants[0].id.clone();
            events.push(Envelope::room(RoomEvent::HostChanged {
                code: self.code.clone(),
                host_id: self.host_id.clone(),
            }));
        }
        events.push(Envelope::room(self.participants_update()));
        events.push(Envelope::room(self.budget_update()));
        LeaveOutcome {
            destroyed: false,
            events,
        }
    }

    /// Host sets one budget for everyone (lobby convenience).
    pub fn set_all_budgets(
        &mut self,
        caller: &ClientId,
        amount: f64,
    ) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        let clamped = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let value = clamped as i64;
        for p in &self.participants {
            self.budgets.insert(p.id.clone(), value);
        }
        Ok(vec![Envelope::room(self.budget_update())])
    }

    /// Host starts (or restarts) the auction: fresh round, fresh winner
    /// sets.
    pub fn start_game(&mut self, caller: &ClientId) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        self.round = Round::default();
        self.winners_per_position.clear();
        Ok(vec![Envelope::room(RoomEvent::GameStarted {
            code: self.code.clone(),
        })])
    }

    /// Host announces the position being auctioned and how many items it
    /// has.
    pub fn set_round(
        &mut self,
        caller: &ClientId,
        position_name: String,
        rounds: u32,
    ) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        self.round.position_name = position_name.clone();
        self.round.rounds = rounds;
        self.winners_per_position.entry(position_name).or_default();
        Ok(vec![Envelope::room(RoomEvent::RoundSet {
            position_name: self.round.position_name.clone(),
            rounds: self.round.rounds,
        })])
    }

    /// Host puts a new item under the hammer. Any pending countdown is
    /// dead from this point on (the caller must also drop the scheduled
    /// task).
    pub fn set_player(
        &mut self,
        caller: &ClientId,
        player: PlayerCard,
        index: i64,
    ) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        self.round.put_up(player.clone());
        Ok(vec![
            Envelope::room(RoomEvent::PlayerSet {
                player,
                index: Some(index),
                total_rounds: Some(self.round.rounds),
                position_name: Some(self.round.position_name.clone()),
            }),
            Envelope::room(RoomEvent::BidUpdate {
                current_bid: 0,
                bidder_id: None,
            }),
            Envelope::room(RoomEvent::TimerUpdate { end_at: None }),
            Envelope::room(self.roulette_update(self.round.reserve_price())),
        ])
    }

    /// Attempt a bid. The raw value is snapped to the nearest multiple
    /// of [`BID_STEP`]; the snapped value must reach the minimum and fit
    /// the caller's budget. Acceptance (re)arms the countdown at
    /// `end_at`.
    pub fn place_bid(
        &mut self,
        caller: &ClientId,
        value: f64,
        end_at: i64,
    ) -> Result<Vec<Envelope>, ActionError> {
        if self.round.player.is_none() {
            return Err(ActionError::NoActiveAuction);
        }
        if self.round.revealed {
            return Err(ActionError::InvalidBid(BidReject::RoundRevealed));
        }
        if self.is_position_winner(&self.round.position_name, caller) {
            return Err(ActionError::InvalidBid(BidReject::AlreadyWonPosition));
        }
        if !value.is_finite() {
            return Err(ActionError::InvalidBid(BidReject::NotNumeric));
        }
        let snapped = (value / BID_STEP as f64).round() as i64 * BID_STEP;
        if snapped < self.round.min_allowed_bid() {
            return Err(ActionError::InvalidBid(BidReject::BelowMinimum));
        }
        let budget = self.budgets.get(caller).copied().unwrap_or(0);
        if snapped > budget {
            return Err(ActionError::InvalidBid(BidReject::OverBudget));
        }

        self.round.current_bid = snapped;
        self.round.last_bidder = Some(caller.clone());
        self.round.timer_end_at = Some(end_at);
        Ok(vec![
            Envelope::room(RoomEvent::BidUpdate {
                current_bid: snapped,
                bidder_id: Some(caller.clone()),
            }),
            Envelope::room(RoomEvent::TimerUpdate {
                end_at: Some(end_at),
            }),
        ])
    }

    /// Host reveals the item, blocking all further bids.
    pub fn reveal(&mut self, caller: &ClientId) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        self.round.revealed = true;
        Ok(vec![Envelope::room(RoomEvent::PlayerRevealed {
            player: self.round.player.clone(),
            position_name: Some(self.round.position_name.clone()),
        })])
    }

    /// Host closes the round: forced reveal, then the same adjudication
    /// routine the countdown uses.
    pub fn confirm_winner(&mut self, caller: &ClientId) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        self.round.timer_end_at = None;
        self.round.revealed = true;
        let mut events = vec![Envelope::room(RoomEvent::PlayerRevealed {
            player: self.round.player.clone(),
            position_name: Some(self.round.position_name.clone()),
        })];
        events.extend(self.adjudicate());
        // post-award eligibility; the reserve is 0 once the item cleared
        events.push(Envelope::room(self.roulette_update(self.round.reserve_price())));
        Ok(events)
    }

    /// Award the item to the last bidder if every precondition holds.
    ///
    /// Called from the countdown expiry, from `confirm_winner` and from
    /// the roulette settle; must stay idempotent and callable when the
    /// preconditions are unmet (returns no events in that case). The
    /// bidder's budget is re-read here, not trusted from bid time, to
    /// close the race against concurrent trades.
    pub fn adjudicate(&mut self) -> Vec<Envelope> {
        let Some(player) = self.round.player.clone() else {
            return Vec::new();
        };
        let Some(winner) = self.round.last_bidder.clone() else {
            return Vec::new();
        };
        if self.round.awarded {
            return Vec::new();
        }
        let bid = self.round.current_bid;
        if bid < player.price {
            return Vec::new();
        }
        let budget = self.budgets.get(&winner).copied().unwrap_or(0);
        if bid > budget {
            return Vec::new();
        }
        let position = self.round.position_name.clone();
        if self
            .winners_per_position
            .entry(position.clone())
            .or_default()
            .contains(&winner)
        {
            return Vec::new();
        }

        // all guards passed; commit
        self.budgets.insert(winner.clone(), budget - bid);
        let mut events = vec![
            Envelope::room(self.budget_update()),
            // force the reveal everywhere before the win banner
            Envelope::room(RoomEvent::PlayerRevealed {
                player: None,
                position_name: None,
            }),
            Envelope::room(RoomEvent::WinnerConfirmed {
                winner_id: winner.clone(),
                price: bid,
                player: player.clone(),
                position_name: position.clone(),
            }),
        ];

        let team = self.teams.entry(winner.clone()).or_default();
        team.insert(position.clone(), TeamSlot::won(&player, bid));
        let mut users = HashMap::new();
        users.insert(winner.clone(), team.clone());
        events.push(Envelope::room(RoomEvent::TeamsUpdate { users }));

        self.winners_per_position
            .entry(position.clone())
            .or_default()
            .insert(winner);

        self.round.current_bid = 0;
        self.round.last_bidder = None;
        self.round.awarded = true;
        self.round.player = None;
        self.round.timer_end_at = None;

        events.push(Envelope::room(RoomEvent::RouletteUpdate {
            count: self.eligibles(&position, player.price).len(),
            position_name: position,
        }));
        events
    }

    /// Host spins the roulette for the current item. Returns the events
    /// to emit plus the pending draw the caller must settle after the
    /// animation delay (none when nobody is eligible).
    pub fn spin_roulette<R: Rng>(
        &mut self,
        caller: &ClientId,
        rng: &mut R,
    ) -> Result<(Vec<Envelope>, Option<RouletteSpin>), ActionError> {
        self.require_host(caller)?;
        let Some(player) = &self.round.player else {
            return Err(ActionError::NoActiveAuction);
        };
        let reserve = player.price;
        let position = self.round.position_name.clone();
        let eligibles = self.eligibles(&position, reserve);

        let mut events = vec![Envelope::room(RoomEvent::RouletteUpdate {
            count: eligibles.len(),
            position_name: position.clone(),
        })];
        if eligibles.is_empty() {
            return Ok((events, None));
        }

        let winner = eligibles[rng.gen_range(0..eligibles.len())].clone();
        // the roulette supersedes any running bid countdown
        self.round.timer_end_at = None;
        events.push(Envelope::room(RoomEvent::TimerUpdate { end_at: None }));
        events.push(Envelope::room(RoomEvent::RouletteSpun {
            winner_id: winner.clone(),
            position_name: position.clone(),
            price: reserve,
        }));
        Ok((
            events,
            Some(RouletteSpin {
                winner,
                position,
                reserve,
            }),
        ))
    }

    /// Apply a roulette draw once the animation has settled. The room
    /// may have moved on in the meantime: a missing item or a changed
    /// position abandons the draw. Roulette always awards at the reserve
    /// price.
    pub fn settle_roulette(&mut self, spin: &RouletteSpin) -> Vec<Envelope> {
        if self.round.player.is_none() {
            return Vec::new();
        }
        if self.round.position_name != spin.position {
            return Vec::new();
        }
        self.round.current_bid = spin.reserve;
        self.round.last_bidder = Some(spin.winner.clone());
        let mut events = vec![Envelope::room(RoomEvent::BidUpdate {
            current_bid: spin.reserve,
            bidder_id: Some(spin.winner.clone()),
        })];
        events.extend(self.adjudicate());
        events.push(Envelope::room(RoomEvent::RouletteUpdate {
            count: self.eligibles(&spin.position, spin.reserve).len(),
            position_name: spin.position.clone(),
        }));
        events
    }

    /// Host opens/closes the roulette modal on every client.
    pub fn roulette_modal(
        &self,
        caller: &ClientId,
        open: bool,
    ) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        Ok(vec![Envelope::room(RoomEvent::RouletteModal { open })])
    }

    /// Host dismisses the roulette result on every client.
    pub fn roulette_close(&self, caller: &ClientId) -> Result<Vec<Envelope>, ActionError> {
        self.require_host(caller)?;
        Ok(vec![Envelope::room(RoomEvent::RouletteClose)])
    }

    /// Participants who may still win `position`: not already a winner
    /// there, and able to pay `min`. Order follows the participant list.
    pub fn eligibles(&self, position: &str, min: i64) -> Vec<ClientId> {
        let winners = self.winners_per_position.get(position);
        self.participants
            .iter()
            .filter(|p| !winners.is_some_and(|w| w.contains(&p.id)))
            .filter(|p| self.budgets.get(&p.id).copied().unwrap_or(0) >= min)
            .map(|p| p.id.clone())
            .collect()
    }

    pub(super) fn require_host(&self, caller: &ClientId) -> Result<(), ActionError> {
        if &self.host_id != caller {
            return Err(ActionError::Unauthorized);
        }
        Ok(())
    }

    pub(super) fn is_position_winner(&self, position: &str, id: &ClientId) -> bool {
        self.winners_per_position
            .get(position)
            .is_some_and(|w| w.contains(id))
    }

    pub(super) fn budget_update(&self) -> RoomEvent {
        RoomEvent::BudgetUpdate {
            budgets: self.budgets.clone(),
        }
    }

    fn participants_update(&self) -> RoomEvent {
        RoomEvent::ParticipantsUpdate {
            code: self.code.clone(),
            participants: self.participants.clone(),
        }
    }

    fn roulette_update(&self, min: i64) -> RoomEvent {
        RoomEvent::RouletteUpdate {
            count: self.eligibles(&self.round.position_name, min).len(),
            position_name: self.round.position_name.clone(),
        }
    }
}
