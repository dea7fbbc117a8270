//! Why a room operation was not applied.

use thiserror::Error;

/// Rejection taxonomy for room operations.
///
/// Only `RoomNotFound` and `AvatarTaken` are ever surfaced to a client
/// (as a `room_error` event on join); everything else is absorbed
/// silently by the gateway. The variants stay explicit so tests can
/// assert on the exact reason an operation was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("room not found")]
    RoomNotFound,
    #[error("avatar already in use in this room")]
    AvatarTaken,
    #[error("caller is not the room host")]
    Unauthorized,
    #[error("no player is up for auction")]
    NoActiveAuction,
    #[error("bid rejected: {0}")]
    InvalidBid(BidReject),
    #[error("trade rejected: {0}")]
    InvalidTrade(TradeReject),
    #[error("transfer market is closed")]
    MarketClosed,
}

/// Why a bid was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BidReject {
    #[error("round already revealed")]
    RoundRevealed,
    #[error("caller already won this position")]
    AlreadyWonPosition,
    #[error("value is not a finite number")]
    NotNumeric,
    #[error("below the minimum allowed bid")]
    BelowMinimum,
    #[error("over the caller's budget")]
    OverBudget,
}

/// Why a transfer was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TradeReject {
    #[error("offer envelope is malformed")]
    MalformedOffer,
    #[error("offer sender does not match the connection")]
    NotYourOffer,
    #[error("a party cannot cover the offered cash")]
    InsufficientCash,
    #[error("no slot pair applied and no cash moved")]
    NothingToApply,
    #[error("trade would leave a negative budget")]
    NegativeBudget,
}
