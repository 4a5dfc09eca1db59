//! # Identity Types
//!
//! Callers are opaque address strings. There are no ambient globals: every
//! operation receives the caller and the observed time through an explicit
//! [`CallContext`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque caller/owner identity.
///
/// Addresses are compared byte-for-byte; the core never interprets them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Creates an address from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the address as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Administrative roles, stored as `<role>:<addr>` allow-list flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// May grant/revoke roles, mint equipment, create pools, manage settlers.
    Admin,
    /// May pause and unpause all mutating entry points.
    Pauser,
}

impl Role {
    /// The key segment used for this role's allow-list entries.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Pauser => "pauser",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call execution context: who is calling, and the time the operation
/// observes. Deadlines are evaluated against `now`; nothing inside an
/// operation ever blocks or re-reads the clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// The calling identity.
    pub caller: Address,
    /// Observed unix time (seconds) for this call.
    pub now: u64,
}

impl CallContext {
    /// Creates a context for `caller` at time `now`.
    #[must_use]
    pub fn new(caller: impl Into<Address>, now: u64) -> Self {
        Self {
            caller: caller.into(),
            now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr = Address::new("AU12abc");
        assert_eq!(addr.as_str(), "AU12abc");
        assert_eq!(format!("{addr}"), "AU12abc");
    }

    #[test]
    fn test_role_key_segments() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Pauser.as_str(), "pauser");
    }
}
