//! # Key Scheme
//!
//! Every logical record maps to exactly one store key built from a stable
//! prefix plus the entity id. Nothing else in the system constructs keys by
//! hand; all writers and readers go through these helpers, which is what
//! keeps the scheme collision-free.

use crate::identity::{Address, Role};

/// Scalar key: number of characters ever created.
pub const CHARACTER_COUNT: &str = "character_count";
/// Scalar key: number of battles ever created.
pub const BATTLE_COUNT: &str = "battle_count";
/// Scalar key: number of equipment items ever minted.
pub const EQUIPMENT_COUNT: &str = "equipment_count";
/// Scalar key: number of single pools ever created.
pub const SPOOL_COUNT: &str = "spool_count";
/// Scalar key: number of multipools ever created.
pub const MPOOL_COUNT: &str = "mpool_count";
/// Scalar key: number of battles that reached `finalize`.
pub const BATTLES_FINISHED: &str = "battles_finished";
/// Scalar key: global pause flag.
pub const PAUSED: &str = "paused";
/// Scalar key: reentrancy lock flag.
pub const LOCKED: &str = "locked";
/// Scalar key: accrued house-edge treasury counter (raw asset units).
pub const TREASURY: &str = "treasury";

/// `character:<id>`
#[must_use]
pub fn character(id: &str) -> String {
    format!("character:{id}")
}

/// `battle:<id>`
#[must_use]
pub fn battle(id: &str) -> String {
    format!("battle:{id}")
}

/// `equipment:<id>`
#[must_use]
pub fn equipment(id: &str) -> String {
    format!("equipment:{id}")
}

/// `spool:<id>`
#[must_use]
pub fn single_pool(id: &str) -> String {
    format!("spool:{id}")
}

/// `sbet:<poolId>:<bettor>`
#[must_use]
pub fn single_bet(pool_id: &str, bettor: &Address) -> String {
    format!("sbet:{pool_id}:{bettor}")
}

/// `mpool:<id>`
#[must_use]
pub fn multipool(id: &str) -> String {
    format!("mpool:{id}")
}

/// `betslip:<id>`
#[must_use]
pub fn betslip(id: &str) -> String {
    format!("betslip:{id}")
}

/// `battle_index:<n>` - creation-order index used by the bounded sweeps.
#[must_use]
pub fn battle_index(n: u64) -> String {
    format!("battle_index:{n}")
}

/// `spool_index:<n>` - creation-order index used by the bounded sweeps.
#[must_use]
pub fn single_pool_index(n: u64) -> String {
    format!("spool_index:{n}")
}

/// `streak:<addr>` - consecutive-win counter for the streak bonus.
#[must_use]
pub fn streak(bettor: &Address) -> String {
    format!("streak:{bettor}")
}

/// `auth_settler:<addr>` - authorized-settler allow-list entry.
#[must_use]
pub fn auth_settler(addr: &Address) -> String {
    format!("auth_settler:{addr}")
}

/// `<role>:<addr>` - role allow-list entry.
#[must_use]
pub fn role(role: Role, addr: &Address) -> String {
    format!("{}:{addr}", role.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_match_contract() {
        let bettor = Address::new("AU1bettor");
        assert_eq!(character("c1"), "character:c1");
        assert_eq!(battle("b1"), "battle:b1");
        assert_eq!(equipment("e1"), "equipment:e1");
        assert_eq!(single_pool("p1"), "spool:p1");
        assert_eq!(single_bet("p1", &bettor), "sbet:p1:AU1bettor");
        assert_eq!(multipool("m1"), "mpool:m1");
        assert_eq!(betslip("s1"), "betslip:s1");
        assert_eq!(role(Role::Admin, &bettor), "admin:AU1bettor");
        assert_eq!(auth_settler(&bettor), "auth_settler:AU1bettor");
    }
}
