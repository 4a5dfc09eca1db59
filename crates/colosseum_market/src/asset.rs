//! # Asset Ledger Port
//!
//! The fungible-asset collaborator: balances, allowances, transfers. The
//! market pulls stakes with `transfer_from` (bettor must have pre-authorized
//! the house) and pays claims with `transfer` out of the house account.
//! [`MemoryLedger`] is the in-memory reference implementation used by tests
//! and the local runtime.

use std::collections::HashMap;

use colosseum_core::Address;
use thiserror::Error;

/// The book account holding pooled stakes and paying claims.
pub const HOUSE: &str = "colosseum:house";

/// Asset transfer failures. Always a hard abort for the calling operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Sender balance below the transfer amount.
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance {
        /// Amount required.
        need: u128,
        /// Amount available.
        have: u128,
    },

    /// Spender allowance below the transfer amount.
    #[error("insufficient allowance: need {need}, have {have}")]
    InsufficientAllowance {
        /// Amount required.
        need: u128,
        /// Amount available.
        have: u128,
    },
}

/// Fungible-asset collaborator contract.
pub trait AssetLedger {
    /// Balance of `owner` in `asset`.
    fn balance_of(&self, asset: &str, owner: &Address) -> u128;

    /// Remaining allowance `owner` has granted `spender` in `asset`.
    fn allowance(&self, asset: &str, owner: &Address, spender: &Address) -> u128;

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// `AssetError::InsufficientBalance` when `from` cannot cover it.
    fn transfer(
        &mut self,
        asset: &str,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), AssetError>;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// # Errors
    ///
    /// `AssetError::InsufficientAllowance` or `InsufficientBalance`.
    fn transfer_from(
        &mut self,
        asset: &str,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), AssetError>;
}

/// In-memory reference ledger for tests and the local runtime.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    balances: HashMap<(String, Address), u128>,
    allowances: HashMap<(String, Address, Address), u128>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `owner` with `amount` of `asset` (test fixture).
    pub fn mint(&mut self, asset: &str, owner: &Address, amount: u128) {
        let entry = self
            .balances
            .entry((asset.to_owned(), owner.clone()))
            .or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Sets `spender`'s allowance from `owner` in `asset`.
    pub fn approve(&mut self, asset: &str, owner: &Address, spender: &Address, amount: u128) {
        self.allowances
            .insert((asset.to_owned(), owner.clone(), spender.clone()), amount);
    }

    fn debit(&mut self, asset: &str, owner: &Address, amount: u128) -> Result<(), AssetError> {
        let have = self.balance_of(asset, owner);
        if have < amount {
            return Err(AssetError::InsufficientBalance {
                need: amount,
                have,
            });
        }
        self.balances
            .insert((asset.to_owned(), owner.clone()), have - amount);
        Ok(())
    }

    fn credit(&mut self, asset: &str, owner: &Address, amount: u128) {
        let entry = self
            .balances
            .entry((asset.to_owned(), owner.clone()))
            .or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

impl AssetLedger for MemoryLedger {
    fn balance_of(&self, asset: &str, owner: &Address) -> u128 {
        self.balances
            .get(&(asset.to_owned(), owner.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, asset: &str, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(asset.to_owned(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: &str,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), AssetError> {
        self.debit(asset, from, amount)?;
        self.credit(asset, to, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        asset: &str,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), AssetError> {
        let allowed = self.allowance(asset, from, spender);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance {
                need: amount,
                have: allowed,
            });
        }
        self.debit(asset, from, amount)?;
        self.allowances.insert(
            (asset.to_owned(), from.clone(), spender.clone()),
            allowed - amount,
        );
        self.credit(asset, to, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut ledger = MemoryLedger::new();
        let alice = Address::new("alice");
        let house = Address::new(HOUSE);
        ledger.mint("IRON", &alice, 1_000);
        ledger.approve("IRON", &alice, &house, 600);

        ledger
            .transfer_from("IRON", &house, &alice, &house, 400)
            .unwrap();
        assert_eq!(ledger.balance_of("IRON", &alice), 600);
        assert_eq!(ledger.balance_of("IRON", &house), 400);
        assert_eq!(ledger.allowance("IRON", &alice, &house), 200);

        assert!(matches!(
            ledger.transfer_from("IRON", &house, &alice, &house, 300),
            Err(AssetError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_transfer_requires_balance() {
        let mut ledger = MemoryLedger::new();
        let house = Address::new(HOUSE);
        let bob = Address::new("bob");
        assert!(matches!(
            ledger.transfer("IRON", &house, &bob, 1),
            Err(AssetError::InsufficientBalance { .. })
        ));
    }
}
