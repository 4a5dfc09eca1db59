//! # COLOSSEUM Market
//!
//! The prediction-market ledger: parimutuel single pools keyed to battles,
//! and multi-leg parlay tickets over closed pools.
//!
//! ## Design Principles
//!
//! 1. **Zero floating point** - odds are u128 fixed-point at scale 1e6
//! 2. **Odds snapshot once** - computed at pool close from the then-current
//!    totals, never recomputed
//! 3. **Claim-before-transfer** - claimed flags are staged before any
//!    outbound transfer, so a re-entrant callback finds the bet spent
//! 4. **Rounding favors the house** - every division floors; the sum of all
//!    winning claims never exceeds the payout pool
//!
//! Settlement requires a [`colosseum_core::SettlerCap`], the typed proof of
//! authorized-settler membership.

pub mod asset;
pub mod error;
pub mod fixed_point;
pub mod parlay;
pub mod single_pool;

pub use asset::{AssetError, AssetLedger, MemoryLedger, HOUSE};
pub use error::{MarketError, MarketResult};
pub use fixed_point::{Odds, ODDS_SCALE};
pub use parlay::{Betslip, Multipool, ParlayMarket, Selection, MAX_LEGS};
pub use single_pool::{Outcome, PoolMarket, PoolParams, SingleBet, SinglePool};
