//! Room-based auction game server library.
//!
//! Participants join a room via a generated code, the host drives a
//! sequence of auctioned player cards, attendees bid against a personal
//! budget, and the server adjudicates winners and tracks team rosters.
//! A post-auction transfer market lets two participants swap roster
//! slots and cash.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
