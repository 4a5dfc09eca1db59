//! # Runtime Error Type
//!
//! One top-level error over the gate, arena and market taxonomies. Every
//! rejection is synchronous and total for the call: the staged transaction
//! is dropped, the reentrancy lock released, and no partial writes remain.

use colosseum_arena::ArenaError;
use colosseum_core::{GateError, StoreError};
use colosseum_market::MarketError;
use thiserror::Error;

/// Errors surfaced by the runtime entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColosseumError {
    /// Pause, reentrancy or authorization failure.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// Character registry or battle engine failure.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Pool or parlay market failure.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// Store or codec failure outside the engines.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Malformed configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for runtime operations.
pub type ColosseumResult<T> = Result<T, ColosseumError>;
