//! # Market Error Types
//!
//! Validation, funds and arithmetic failures. Every abort is total for the
//! call; the runtime's staged transaction discards partial writes.

use colosseum_core::StoreError;
use thiserror::Error;

use crate::asset::AssetError;

/// Errors that can occur in the pool and parlay markets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// No pool under this id.
    #[error("unknown pool: {0}")]
    UnknownPool(String),

    /// A pool already exists under this id.
    #[error("pool exists: {0}")]
    PoolExists(String),

    /// Betting is over for this pool (closed flag or past close time).
    #[error("betting closed: {0}")]
    BettingClosed(String),

    /// The pool cannot close before its close time.
    #[error("close too early: closes at {closes}")]
    CloseTooEarly {
        /// Configured close time (unix seconds).
        closes: u64,
    },

    /// The pool is already closed.
    #[error("pool already closed: {0}")]
    AlreadyClosed(String),

    /// The operation needs a closed pool.
    #[error("pool not closed: {0}")]
    PoolNotClosed(String),

    /// The pool is already settled.
    #[error("pool already settled: {0}")]
    AlreadySettled(String),

    /// The operation needs a settled pool.
    #[error("pool not settled: {0}")]
    PoolNotSettled(String),

    /// Bet below the pool minimum.
    #[error("bet too small: minimum {min}")]
    BetTooSmall {
        /// Pool minimum.
        min: u128,
    },

    /// Bet above the pool maximum.
    #[error("bet too large: maximum {max}")]
    BetTooLarge {
        /// Pool maximum.
        max: u128,
    },

    /// The pool cap would be exceeded.
    #[error("pool cap exceeded: cap {cap}")]
    PoolCapExceeded {
        /// Pool cap.
        cap: u128,
    },

    /// One bet per (pool, bettor).
    #[error("duplicate bet")]
    DuplicateBet,

    /// No bet by this bettor on this pool.
    #[error("unknown bet")]
    UnknownBet,

    /// The bet or betslip was already claimed.
    #[error("already claimed")]
    AlreadyClaimed,

    /// Settlement left no stake on the winning side; claiming against it is
    /// an impossible state.
    #[error("zero winning stake")]
    ZeroWinningStake,

    /// A parlay leg referenced an outcome with zero snapshot odds.
    #[error("zero odds for outcome on pool {0}")]
    ZeroOddsOutcome(String),

    /// No multipool under this id.
    #[error("unknown multipool: {0}")]
    UnknownMultipool(String),

    /// A multipool already exists under this id.
    #[error("multipool exists: {0}")]
    MultipoolExists(String),

    /// A betslip already exists under this id.
    #[error("betslip exists: {0}")]
    BetslipExists(String),

    /// No betslip under this id.
    #[error("unknown betslip: {0}")]
    UnknownBetslip(String),

    /// A parlay ticket needs at least one leg.
    #[error("no selections")]
    NoSelections,

    /// Too many parlay legs.
    #[error("too many legs: maximum {max}")]
    TooManyLegs {
        /// Leg limit.
        max: usize,
    },

    /// The same pool appears twice on one ticket.
    #[error("duplicate leg: {0}")]
    DuplicateLeg(String),

    /// A parlay leg referenced a pool that has not closed.
    #[error("leg not closed: {0}")]
    LegNotClosed(String),

    /// The betslip's winner status was already accounted.
    #[error("already accounted")]
    AlreadyAccounted,

    /// The betslip must be accounted before claiming.
    #[error("not accounted")]
    NotAccounted,

    /// The multipool is already finalized.
    #[error("multipool already finalized: {0}")]
    AlreadyFinalized(String),

    /// The multipool must be finalized before claiming.
    #[error("multipool not finalized: {0}")]
    NotFinalized(String),

    /// A multipool finalized with no winning weight cannot pay a winner.
    #[error("zero winning weight")]
    ZeroWinningWeight,

    /// Fixed-point arithmetic overflow.
    #[error("arithmetic overflow in market calculation")]
    Overflow,

    /// Asset transfer failure.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Store or codec failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for market operations.
pub type MarketResult<T> = Result<T, MarketError>;
