//! # Fixed-Point Odds
//!
//! **CRITICAL: NO FLOATING POINT IN SETTLEMENT CALCULATIONS**
//!
//! Odds are the ratio of payout pool to an outcome's stake, held as a u128
//! scaled by 1,000,000. All derived quantities (parlay products, ticket
//! weights, payouts) stay in integer math with u128 intermediates; every
//! division floors, so rounding always favors the house.

use std::fmt;

/// Scale factor: 1.0 of odds = 1,000,000.
pub const ODDS_SCALE: u128 = 1_000_000;

/// Fixed-point odds value (scale 1e6).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Odds(u128);

impl Odds {
    /// Zero odds - an outcome nobody staked.
    pub const ZERO: Self = Self(0);

    /// Even money (1.0x).
    pub const ONE: Self = Self(ODDS_SCALE);

    /// Creates from a raw scaled value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Creates from a whole multiplier (2 -> 2.0x).
    #[inline]
    #[must_use]
    pub const fn from_whole(whole: u128) -> Self {
        Self(whole * ODDS_SCALE)
    }

    /// The raw scaled value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// True for zero odds.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The parimutuel snapshot: `payout_pool * SCALE / stake`, flooring.
    /// Returns `None` on a zero stake or overflow.
    #[inline]
    #[must_use]
    pub const fn ratio(payout_pool: u128, stake: u128) -> Option<Self> {
        if stake == 0 {
            return None;
        }
        match payout_pool.checked_mul(ODDS_SCALE) {
            Some(scaled) => Some(Self(scaled / stake)),
            None => None,
        }
    }

    /// Accumulates one parlay leg: `self * leg / SCALE`, flooring.
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn combine(self, leg: Self) -> Option<Self> {
        match self.0.checked_mul(leg.0) {
            Some(product) => Some(Self(product / ODDS_SCALE)),
            None => None,
        }
    }

    /// Applies the odds to an amount: `amount * self / SCALE`, flooring.
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn apply(self, amount: u128) -> Option<u128> {
        match amount.checked_mul(self.0) {
            Some(product) => Some(product / ODDS_SCALE),
            None => None,
        }
    }

    /// The whole part of the multiplier.
    #[inline]
    #[must_use]
    pub const fn whole(self) -> u128 {
        self.0 / ODDS_SCALE
    }

    /// The fractional part (0 to 999,999).
    #[inline]
    #[must_use]
    pub const fn decimal(self) -> u128 {
        self.0 % ODDS_SCALE
    }
}

/// Splits a total into (payout pool, house edge) by basis points, flooring
/// the edge so the payout pool keeps the rounding remainder.
#[inline]
#[must_use]
pub const fn split_edge(total: u128, edge_bps: u32) -> (u128, u128) {
    let edge = total * edge_bps as u128 / 10_000;
    (total - edge, edge)
}

/// Proportional payout: `pool * share / total_share`, flooring. Returns
/// `None` on a zero denominator or overflow.
#[inline]
#[must_use]
pub const fn pro_rata(pool: u128, share: u128, total_share: u128) -> Option<u128> {
    if total_share == 0 {
        return None;
    }
    match pool.checked_mul(share) {
        Some(product) => Some(product / total_share),
        None => None,
    }
}

impl fmt::Debug for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Odds({}.{:06})", self.whole(), self.decimal())
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.whole(), self.decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parimutuel_snapshot() {
        // Scenario A: total 2000, edge 500 bps -> payout 1900; 1000 staked
        // per outcome -> odds 1.9x on both sides.
        let (payout, edge) = split_edge(2_000, 500);
        assert_eq!(payout, 1_900);
        assert_eq!(edge, 100);
        let odds = Odds::ratio(payout, 1_000).unwrap();
        assert_eq!(odds.raw(), 1_900_000);
        assert_eq!(format!("{odds}"), "1.900000");
    }

    #[test]
    fn test_zero_stake_has_no_odds() {
        assert!(Odds::ratio(1_900, 0).is_none());
    }

    #[test]
    fn test_parlay_combination() {
        // Scenario D: 2.0x and 1.5x legs -> 3.0x combined.
        let combined = Odds::ONE
            .combine(Odds::from_raw(2_000_000))
            .unwrap()
            .combine(Odds::from_raw(1_500_000))
            .unwrap();
        assert_eq!(combined.raw(), 3_000_000);
        // weight = stake x 3.0
        assert_eq!(combined.apply(500).unwrap(), 1_500);
    }

    #[test]
    fn test_rounding_floors() {
        // 1000 * 1e6 / 3 = 333_333_333 (floored)
        let odds = Odds::ratio(1_000, 3).unwrap();
        assert_eq!(odds.raw(), 333_333_333);
        // odds x stake never exceeds the payout pool
        assert!(odds.apply(3).unwrap() <= 1_000);
    }

    #[test]
    fn test_pro_rata_floors_and_guards() {
        assert_eq!(pro_rata(1_900, 1_000, 1_000).unwrap(), 1_900);
        assert_eq!(pro_rata(1_900, 1, 3).unwrap(), 633);
        assert!(pro_rata(1_900, 1, 0).is_none());
    }
}
