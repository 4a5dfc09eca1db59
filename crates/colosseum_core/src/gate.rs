//! # Gate
//!
//! Process-wide admission control shared by every mutating entry point:
//!
//! - a **pause flag** that rejects all mutating calls uniformly,
//! - a **reentrancy lock** held for the duration of each mutating call, so a
//!   nested call observed while the lock is held (e.g. an asset-transfer
//!   callback re-entering a claim) aborts immediately,
//! - **role allow-lists** keyed `<role>:<addr>`,
//! - the **authorized-settler** allow-list, surfaced as a typed
//!   [`SettlerCap`] so settlement entry points cannot be reached without
//!   passing the check.
//!
//! The flags are plain store records; there are no ambient globals.

use crate::error::GateError;
use crate::identity::{Address, Role};
use crate::keys;
use crate::store::{self, EntityStore};

/// Rejects the call if the pause flag is set.
///
/// # Errors
///
/// `GateError::Paused` while paused.
pub fn ensure_open<S: EntityStore + ?Sized>(store: &S) -> Result<(), GateError> {
    if store::flag(store, keys::PAUSED) {
        return Err(GateError::Paused);
    }
    Ok(())
}

/// Acquires the reentrancy lock.
///
/// # Errors
///
/// `GateError::Reentrancy` if the lock is already held.
pub fn acquire<S: EntityStore + ?Sized>(store: &mut S) -> Result<(), GateError> {
    if store::flag(store, keys::LOCKED) {
        return Err(GateError::Reentrancy);
    }
    store::set_flag(store, keys::LOCKED, true);
    Ok(())
}

/// Releases the reentrancy lock. Runs on both commit and abort paths.
pub fn release<S: EntityStore + ?Sized>(store: &mut S) {
    store::set_flag(store, keys::LOCKED, false);
}

/// Sets or clears the pause flag. Role enforcement happens at the runtime
/// entry point.
pub fn set_paused<S: EntityStore + ?Sized>(store: &mut S, paused: bool) {
    store::set_flag(store, keys::PAUSED, paused);
}

/// True if `addr` holds `role`.
#[must_use]
pub fn has_role<S: EntityStore + ?Sized>(store: &S, role: Role, addr: &Address) -> bool {
    store::flag(store, &keys::role(role, addr))
}

/// Rejects the call unless `addr` holds `role`.
///
/// # Errors
///
/// `GateError::MissingRole` when the allow-list entry is absent.
pub fn require_role<S: EntityStore + ?Sized>(
    store: &S,
    role: Role,
    addr: &Address,
) -> Result<(), GateError> {
    if has_role(store, role, addr) {
        Ok(())
    } else {
        Err(GateError::MissingRole {
            role: role.as_str().to_owned(),
            caller: addr.to_string(),
        })
    }
}

/// Adds `addr` to the `role` allow-list.
pub fn grant_role<S: EntityStore + ?Sized>(store: &mut S, role: Role, addr: &Address) {
    store::set_flag(store, &keys::role(role, addr), true);
}

/// Removes `addr` from the `role` allow-list.
pub fn revoke_role<S: EntityStore + ?Sized>(store: &mut S, role: Role, addr: &Address) {
    store::set_flag(store, &keys::role(role, addr), false);
}

/// True if `addr` is on the authorized-settler allow-list.
#[must_use]
pub fn is_settler<S: EntityStore + ?Sized>(store: &S, addr: &Address) -> bool {
    store::flag(store, &keys::auth_settler(addr))
}

/// Adds or removes a settler authorization.
pub fn set_settler<S: EntityStore + ?Sized>(store: &mut S, addr: &Address, authorized: bool) {
    store::set_flag(store, &keys::auth_settler(addr), authorized);
}

/// Proof that an address passed the authorized-settler check.
///
/// Settlement operations take a `&SettlerCap` instead of re-reading the
/// allow-list, so the set of call sites that can settle is visible in the
/// type system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlerCap {
    addr: Address,
}

impl SettlerCap {
    /// The authorized settler address this capability was issued for.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.addr
    }
}

/// Issues a [`SettlerCap`] for `addr`.
///
/// # Errors
///
/// `GateError::NotSettler` when the address is not allow-listed.
pub fn settler_cap<S: EntityStore + ?Sized>(
    store: &S,
    addr: &Address,
) -> Result<SettlerCap, GateError> {
    if is_settler(store, addr) {
        Ok(SettlerCap { addr: addr.clone() })
    } else {
        Err(GateError::NotSettler(addr.to_string()))
    }
}
