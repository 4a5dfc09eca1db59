//! # Core Error Types
//!
//! Store and gate failures. Higher layers wrap these with `#[from]`.

use thiserror::Error;

/// Errors raised by the entity store and the record codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record under the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record existed but could not be decoded in the expected field order.
    #[error("corrupt record at {key}: {reason}")]
    Corrupt {
        /// Key of the undecodable record.
        key: String,
        /// What the reader choked on.
        reason: String,
    },

    /// A record carries a version this reader does not understand.
    #[error("unsupported record version {found} at {key}")]
    UnsupportedVersion {
        /// Key of the record.
        key: String,
        /// Version byte found.
        found: u8,
    },

    /// Arithmetic overflow while updating a scalar counter.
    #[error("counter overflow at {0}")]
    CounterOverflow(String),
}

/// Errors raised by the pause/reentrancy gate and the role tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// All mutating entry points are paused.
    #[error("paused")]
    Paused,

    /// A mutating call arrived while the reentrancy lock was held.
    #[error("reentrancy")]
    Reentrancy,

    /// Caller lacks the required role.
    #[error("missing role {role} for {caller}")]
    MissingRole {
        /// The role that was required.
        role: String,
        /// The caller that lacked it.
        caller: String,
    },

    /// Caller is not on the authorized-settler allow-list.
    #[error("not an authorized settler: {0}")]
    NotSettler(String),
}

impl StoreError {
    /// Builds a `Corrupt` error for `key` from any displayable reason.
    #[must_use]
    pub fn corrupt(key: &str, reason: &impl std::fmt::Display) -> Self {
        Self::Corrupt {
            key: key.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, StoreError>;
