//! # Single-Pool Parimutuel Market
//!
//! Pool lifecycle `Open -> Closed -> Settled`. Odds are computed exactly
//! once, at close, from the then-current per-outcome totals. Settlement is
//! capability-gated; claims are single-shot with the claimed flag staged
//! before any funds move.

use colosseum_core::{
    decode_record, keys, store, Address, CallContext, DecodeError, DecodeResult, EntityStore,
    Notification, RecordReader, RecordWriter, SettlerCap, StoreError,
};
use tracing::{debug, info};

use crate::asset::{AssetLedger, HOUSE};
use crate::error::{MarketError, MarketResult};
use crate::fixed_point::{pro_rata, split_edge, Odds};

/// Pool/bet record version.
pub const RECORD_VERSION: u8 = 1;

/// Streak bonus step per consecutive win (basis points of the payout).
const STREAK_STEP_BPS: u64 = 500;
/// Streak bonus ceiling (basis points), reached from streak 5.
const STREAK_CAP_BPS: u64 = 2_500;

/// A bettable outcome: side A (battle side 1) or side B (battle side 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Battle side 1 wins.
    A,
    /// Battle side 2 wins.
    B,
}

impl Outcome {
    /// The persisted byte (1 or 2).
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
        }
    }

    /// Converts from the persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::A),
            2 => Some(Self::B),
            _ => None,
        }
    }

    /// Signal rendering (`A` / `B`).
    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

/// Pool sizing and edge parameters fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolParams {
    /// Minimum bet size.
    pub min_bet: u128,
    /// Maximum bet size.
    pub max_bet: u128,
    /// Total-stake cap; 0 = uncapped.
    pub cap: u128,
    /// House edge in basis points.
    pub edge_bps: u32,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            min_bet: 1,
            max_bet: u128::MAX,
            cap: 0,
            edge_bps: 500,
        }
    }
}

/// A parimutuel pool tied to one battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinglePool {
    /// Linked battle id.
    pub battle: String,
    /// Stake asset id.
    pub asset: String,
    /// Betting close time (unix seconds).
    pub close_time: u64,
    /// Total staked.
    pub total: u128,
    /// Staked on outcome A.
    pub staked_a: u128,
    /// Staked on outcome B.
    pub staked_b: u128,
    /// Odds for A, snapshotted at close.
    pub odds_a: Odds,
    /// Odds for B, snapshotted at close.
    pub odds_b: Odds,
    /// House edge in basis points.
    pub edge_bps: u32,
    /// Set once betting closed and odds snapshotted.
    pub closed: bool,
    /// Set once a settler recorded the winner.
    pub settled: bool,
    /// Winning outcome, present iff settled.
    pub winner: Option<Outcome>,
    /// Minimum bet size.
    pub min_bet: u128,
    /// Maximum bet size.
    pub max_bet: u128,
    /// Total-stake cap; 0 = uncapped.
    pub cap: u128,
}

impl SinglePool {
    /// Creates an open pool.
    #[must_use]
    pub fn new(battle: String, asset: String, close_time: u64, params: PoolParams) -> Self {
        Self {
            battle,
            asset,
            close_time,
            total: 0,
            staked_a: 0,
            staked_b: 0,
            odds_a: Odds::ZERO,
            odds_b: Odds::ZERO,
            edge_bps: params.edge_bps,
            closed: false,
            settled: false,
            winner: None,
            min_bet: params.min_bet,
            max_bet: params.max_bet,
            cap: params.cap,
        }
    }

    /// Stake on one outcome.
    #[inline]
    #[must_use]
    pub const fn staked(&self, outcome: Outcome) -> u128 {
        match outcome {
            Outcome::A => self.staked_a,
            Outcome::B => self.staked_b,
        }
    }

    /// Snapshot odds for one outcome.
    #[inline]
    #[must_use]
    pub const fn odds(&self, outcome: Outcome) -> Odds {
        match outcome {
            Outcome::A => self.odds_a,
            Outcome::B => self.odds_b,
        }
    }

    /// Total minus the house edge.
    #[inline]
    #[must_use]
    pub const fn payout_pool(&self) -> u128 {
        split_edge(self.total, self.edge_bps).0
    }

    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(&self.battle)
            .str(&self.asset)
            .u64(self.close_time)
            .u128(self.total)
            .u128(self.staked_a)
            .u128(self.staked_b)
            .u128(self.odds_a.raw())
            .u128(self.odds_b.raw())
            .u32(self.edge_bps)
            .bool(self.closed)
            .bool(self.settled)
            .u8(self.winner.map_or(0, Outcome::as_u8))
            .u128(self.min_bet)
            .u128(self.max_bet)
            .u128(self.cap);
        w.finish()
    }

    /// Decodes a record previously produced by [`SinglePool::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, Self::decode_fields)
    }

    fn decode_fields(r: &mut RecordReader<'_>) -> DecodeResult<Self> {
        let battle = r.str()?;
        let asset = r.str()?;
        let close_time = r.u64()?;
        let total = r.u128()?;
        let staked_a = r.u128()?;
        let staked_b = r.u128()?;
        let odds_a = Odds::from_raw(r.u128()?);
        let odds_b = Odds::from_raw(r.u128()?);
        let edge_bps = r.u32()?;
        let closed = r.bool()?;
        let settled = r.bool()?;
        let winner = match r.u8()? {
            0 => None,
            b => Some(
                Outcome::from_u8(b)
                    .ok_or_else(|| DecodeError(format!("invalid outcome byte {b}")))?,
            ),
        };
        Ok(Self {
            battle,
            asset,
            close_time,
            total,
            staked_a,
            staked_b,
            odds_a,
            odds_b,
            edge_bps,
            closed,
            settled,
            winner,
            min_bet: r.u128()?,
            max_bet: r.u128()?,
            cap: r.u128()?,
        })
    }

    /// Loads a pool by id.
    ///
    /// # Errors
    ///
    /// `MarketError::UnknownPool` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(store: &S, id: &str) -> MarketResult<Self> {
        let key = keys::single_pool(id);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(MarketError::UnknownPool(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the pool under its id.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S, id: &str) {
        store.set(&keys::single_pool(id), self.encode());
    }
}

/// One bettor's single bet in one pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleBet {
    /// The bettor.
    pub bettor: Address,
    /// Pool id.
    pub pool: String,
    /// Staked amount.
    pub amount: u128,
    /// Chosen outcome.
    pub outcome: Outcome,
    /// Set once claimed (win or lose).
    pub claimed: bool,
    /// Placement time (unix seconds).
    pub placed_at: u64,
}

impl SingleBet {
    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(self.bettor.as_str())
            .str(&self.pool)
            .u128(self.amount)
            .u8(self.outcome.as_u8())
            .bool(self.claimed)
            .u64(self.placed_at);
        w.finish()
    }

    /// Decodes a record previously produced by [`SingleBet::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, |r| {
            let bettor = Address::new(r.str()?);
            let pool = r.str()?;
            let amount = r.u128()?;
            let outcome_byte = r.u8()?;
            let outcome = Outcome::from_u8(outcome_byte)
                .ok_or_else(|| DecodeError(format!("invalid outcome byte {outcome_byte}")))?;
            Ok(Self {
                bettor,
                pool,
                amount,
                outcome,
                claimed: r.bool()?,
                placed_at: r.u64()?,
            })
        })
    }

    /// Loads the bet of `bettor` on `pool_id`.
    ///
    /// # Errors
    ///
    /// `MarketError::UnknownBet` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(
        store: &S,
        pool_id: &str,
        bettor: &Address,
    ) -> MarketResult<Self> {
        let key = keys::single_bet(pool_id, bettor);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(MarketError::UnknownBet),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the bet under its (pool, bettor) key.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S) {
        store.set(&keys::single_bet(&self.pool, &self.bettor), self.encode());
    }
}

/// Parimutuel market engine over a borrowed store and asset ledger.
pub struct PoolMarket<'a, S: EntityStore + ?Sized, L: AssetLedger + ?Sized> {
    store: &'a mut S,
    ledger: &'a mut L,
    signals: Vec<Notification>,
}

impl<'a, S: EntityStore + ?Sized, L: AssetLedger + ?Sized> PoolMarket<'a, S, L> {
    /// Creates a market engine over `store` and `ledger`.
    pub fn new(store: &'a mut S, ledger: &'a mut L) -> Self {
        Self {
            store,
            ledger,
            signals: Vec::new(),
        }
    }

    /// Consumes the engine and returns the signals it emitted.
    #[must_use]
    pub fn into_signals(self) -> Vec<Notification> {
        self.signals
    }

    /// Creates a pool under a unique id. Admin-only at the runtime boundary,
    /// which also checks the linked battle exists.
    ///
    /// # Errors
    ///
    /// `PoolExists` on a duplicate id.
    pub fn create_pool(
        &mut self,
        id: &str,
        battle_id: &str,
        asset: &str,
        close_time: u64,
        params: PoolParams,
    ) -> MarketResult<()> {
        if self.store.has(&keys::single_pool(id)) {
            return Err(MarketError::PoolExists(id.to_owned()));
        }
        let pool = SinglePool::new(battle_id.to_owned(), asset.to_owned(), close_time, params);
        pool.save(self.store, id);
        let count = store::bump_counter(self.store, keys::SPOOL_COUNT)?;
        self.store
            .set(&keys::single_pool_index(count - 1), id.as_bytes().to_vec());
        info!(id, battle = battle_id, close_time, "pool created");
        self.signals.push(Notification::SinglePoolCreated {
            id: id.to_owned(),
            battle: battle_id.to_owned(),
        });
        Ok(())
    }

    /// Places the caller's single bet on one outcome, pulling the stake
    /// atomically via the pre-authorized allowance.
    ///
    /// # Errors
    ///
    /// Closed pool, size/cap violations, duplicate bet, or a failed pull.
    pub fn place_bet(
        &mut self,
        ctx: &CallContext,
        pool_id: &str,
        outcome: Outcome,
        amount: u128,
    ) -> MarketResult<()> {
        let mut pool = SinglePool::load(self.store, pool_id)?;
        if pool.closed || ctx.now >= pool.close_time {
            return Err(MarketError::BettingClosed(pool_id.to_owned()));
        }
        if amount < pool.min_bet {
            return Err(MarketError::BetTooSmall { min: pool.min_bet });
        }
        if amount > pool.max_bet {
            return Err(MarketError::BetTooLarge { max: pool.max_bet });
        }
        let new_total = pool.total.checked_add(amount).ok_or(MarketError::Overflow)?;
        if pool.cap > 0 && new_total > pool.cap {
            return Err(MarketError::PoolCapExceeded { cap: pool.cap });
        }
        if self.store.has(&keys::single_bet(pool_id, &ctx.caller)) {
            return Err(MarketError::DuplicateBet);
        }

        let house = Address::new(HOUSE);
        self.ledger
            .transfer_from(&pool.asset, &house, &ctx.caller, &house, amount)?;

        pool.total = new_total;
        match outcome {
            Outcome::A => pool.staked_a += amount,
            Outcome::B => pool.staked_b += amount,
        }
        pool.save(self.store, pool_id);
        let bet = SingleBet {
            bettor: ctx.caller.clone(),
            pool: pool_id.to_owned(),
            amount,
            outcome,
            claimed: false,
            placed_at: ctx.now,
        };
        bet.save(self.store);
        debug!(pool = pool_id, bettor = %ctx.caller, amount = %amount, "bet placed");
        self.signals.push(Notification::SingleBetPlaced {
            pool: pool_id.to_owned(),
            bettor: ctx.caller.clone(),
            outcome: outcome.as_char(),
            amount,
        });
        Ok(())
    }

    /// Closes betting and snapshots the odds from the current totals.
    /// Permissionless; only after close time, only once.
    ///
    /// # Errors
    ///
    /// `CloseTooEarly` before close time, `AlreadyClosed` after.
    pub fn close_pool(&mut self, ctx: &CallContext, pool_id: &str) -> MarketResult<()> {
        let mut pool = SinglePool::load(self.store, pool_id)?;
        if pool.closed {
            return Err(MarketError::AlreadyClosed(pool_id.to_owned()));
        }
        if ctx.now < pool.close_time {
            return Err(MarketError::CloseTooEarly {
                closes: pool.close_time,
            });
        }
        let payout = pool.payout_pool();
        pool.odds_a = match Odds::ratio(payout, pool.staked_a) {
            Some(odds) => odds,
            None if pool.staked_a == 0 => Odds::ZERO,
            None => return Err(MarketError::Overflow),
        };
        pool.odds_b = match Odds::ratio(payout, pool.staked_b) {
            Some(odds) => odds,
            None if pool.staked_b == 0 => Odds::ZERO,
            None => return Err(MarketError::Overflow),
        };
        pool.closed = true;
        pool.save(self.store, pool_id);
        info!(
            pool = pool_id,
            odds_a = %pool.odds_a,
            odds_b = %pool.odds_b,
            "pool closed"
        );
        self.signals.push(Notification::SinglePoolClosed {
            id: pool_id.to_owned(),
            odds_a: pool.odds_a.raw(),
            odds_b: pool.odds_b.raw(),
        });
        Ok(())
    }

    /// Records the winning outcome. Requires the settler capability; only
    /// once, only after close.
    ///
    /// # Errors
    ///
    /// `PoolNotClosed` or `AlreadySettled`.
    pub fn settle(
        &mut self,
        cap: &SettlerCap,
        pool_id: &str,
        winner: Outcome,
    ) -> MarketResult<()> {
        let mut pool = SinglePool::load(self.store, pool_id)?;
        if !pool.closed {
            return Err(MarketError::PoolNotClosed(pool_id.to_owned()));
        }
        if pool.settled {
            return Err(MarketError::AlreadySettled(pool_id.to_owned()));
        }
        pool.settled = true;
        pool.winner = Some(winner);
        pool.save(self.store, pool_id);
        info!(
            pool = pool_id,
            winner = %winner.as_char(),
            settler = %cap.address(),
            "pool settled"
        );
        self.signals.push(Notification::SinglePoolSettled {
            pool: pool_id.to_owned(),
            winner: winner.as_char(),
        });
        Ok(())
    }

    /// Claims a bet: zero payout for a loser (win streak resets), the
    /// proportional share plus any streak bonus for a winner. The claimed
    /// flag is staged before funds move. Returns the amount paid.
    ///
    /// # Errors
    ///
    /// Unknown/claimed bet, unsettled pool, impossible zero winning stake,
    /// or a failed outbound transfer (which aborts the whole call).
    pub fn claim(&mut self, pool_id: &str, bettor: &Address) -> MarketResult<u128> {
        let pool = SinglePool::load(self.store, pool_id)?;
        let mut bet = SingleBet::load(self.store, pool_id, bettor)?;
        if bet.claimed {
            return Err(MarketError::AlreadyClaimed);
        }
        let Some(winner) = pool.winner.filter(|_| pool.settled) else {
            return Err(MarketError::PoolNotSettled(pool_id.to_owned()));
        };

        let streak_key = keys::streak(bettor);
        if bet.outcome != winner {
            bet.claimed = true;
            bet.save(self.store);
            store::write_counter(self.store, &streak_key, 0);
            self.signals.push(Notification::SingleBetClaimed {
                pool: pool_id.to_owned(),
                bettor: bettor.clone(),
                payout: 0,
                bonus: 0,
            });
            return Ok(0);
        }

        let winning_stake = pool.staked(winner);
        if winning_stake == 0 {
            return Err(MarketError::ZeroWinningStake);
        }
        let payout_pool = pool.payout_pool();
        let payout =
            pro_rata(payout_pool, bet.amount, winning_stake).ok_or(MarketError::Overflow)?;

        // Claimed is staged before the transfer so a re-entrant callback
        // finds the bet spent; a failing transfer aborts the whole call.
        bet.claimed = true;
        bet.save(self.store);

        let streak = store::read_counter(self.store, &streak_key)? + 1;
        store::write_counter(self.store, &streak_key, streak);
        let bonus_bps = (STREAK_STEP_BPS * (streak - 1)).min(STREAK_CAP_BPS);
        let bonus = payout * u128::from(bonus_bps) / 10_000;

        let edge_total = pool.total - payout_pool;
        let edge_share =
            pro_rata(edge_total, bet.amount, winning_stake).ok_or(MarketError::Overflow)?;
        store::add_amount(self.store, keys::TREASURY, edge_share)?;

        let house = Address::new(HOUSE);
        self.ledger.transfer(&pool.asset, &house, bettor, payout)?;
        if bonus > 0 {
            self.ledger.transfer(&pool.asset, &house, bettor, bonus)?;
        }
        info!(pool = pool_id, bettor = %bettor, payout = %payout, bonus = %bonus, "bet claimed");
        self.signals.push(Notification::SingleBetClaimed {
            pool: pool_id.to_owned(),
            bettor: bettor.clone(),
            payout,
            bonus,
        });
        Ok(payout + bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryLedger;
    use colosseum_core::{gate, MemoryStore};

    const NOW: u64 = 1_700_000_000;
    const CLOSE: u64 = NOW + 600;
    const ASSET: &str = "IRON";

    fn ctx(caller: &str, now: u64) -> CallContext {
        CallContext::new(caller, now)
    }

    fn setup() -> (MemoryStore, MemoryLedger) {
        let mut ledger = MemoryLedger::new();
        let house = Address::new(HOUSE);
        for bettor in ["alice", "bob", "carol"] {
            let addr = Address::new(bettor);
            ledger.mint(ASSET, &addr, 10_000);
            ledger.approve(ASSET, &addr, &house, 10_000);
        }
        (MemoryStore::new(), ledger)
    }

    fn settler_cap(store: &mut MemoryStore) -> SettlerCap {
        let settler = Address::new("settler");
        gate::set_settler(store, &settler, true);
        gate::settler_cap(store, &settler).unwrap()
    }

    #[test]
    fn test_scenario_a_full_lifecycle() {
        let (mut store, mut ledger) = setup();
        let cap = settler_cap(&mut store);
        let mut market = PoolMarket::new(&mut store, &mut ledger);
        market
            .create_pool("p1", "b1", ASSET, CLOSE, PoolParams::default())
            .unwrap();

        market
            .place_bet(&ctx("alice", NOW), "p1", Outcome::A, 1_000)
            .unwrap();
        market
            .place_bet(&ctx("bob", NOW), "p1", Outcome::B, 1_000)
            .unwrap();

        let pool = SinglePool::load(market.store, "p1").unwrap();
        assert_eq!(pool.total, 2_000);
        assert_eq!(pool.total, pool.staked_a + pool.staked_b);

        market.close_pool(&ctx("anyone", CLOSE), "p1").unwrap();
        let pool = SinglePool::load(market.store, "p1").unwrap();
        assert_eq!(pool.odds_a.raw(), 1_900_000);
        assert_eq!(pool.odds_b.raw(), 1_900_000);

        market.settle(&cap, "p1", Outcome::A).unwrap();
        let paid = market.claim("p1", &Address::new("alice")).unwrap();
        assert_eq!(paid, 1_900);

        let lost = market.claim("p1", &Address::new("bob")).unwrap();
        assert_eq!(lost, 0);

        drop(market);
        assert_eq!(ledger.balance_of(ASSET, &Address::new("alice")), 10_900);
        assert_eq!(ledger.balance_of(ASSET, &Address::new("bob")), 9_000);
        // the 100 edge stays with the house and is accounted in the treasury
        assert_eq!(ledger.balance_of(ASSET, &Address::new(HOUSE)), 100);
        assert_eq!(store::read_amount(&store, keys::TREASURY).unwrap(), 100);
    }

    #[test]
    fn test_bet_window_and_duplicates() {
        let (mut store, mut ledger) = setup();
        let mut market = PoolMarket::new(&mut store, &mut ledger);
        market
            .create_pool(
                "p1",
                "b1",
                ASSET,
                CLOSE,
                PoolParams {
                    min_bet: 100,
                    max_bet: 2_000,
                    cap: 3_000,
                    edge_bps: 500,
                },
            )
            .unwrap();

        assert!(matches!(
            market.place_bet(&ctx("alice", NOW), "p1", Outcome::A, 50),
            Err(MarketError::BetTooSmall { .. })
        ));
        assert!(matches!(
            market.place_bet(&ctx("alice", NOW), "p1", Outcome::A, 2_500),
            Err(MarketError::BetTooLarge { .. })
        ));
        market
            .place_bet(&ctx("alice", NOW), "p1", Outcome::A, 2_000)
            .unwrap();
        assert!(matches!(
            market.place_bet(&ctx("alice", NOW), "p1", Outcome::B, 100),
            Err(MarketError::DuplicateBet)
        ));
        assert!(matches!(
            market.place_bet(&ctx("bob", NOW), "p1", Outcome::B, 1_500),
            Err(MarketError::PoolCapExceeded { .. })
        ));
        assert!(matches!(
            market.place_bet(&ctx("bob", CLOSE), "p1", Outcome::B, 100),
            Err(MarketError::BettingClosed(_))
        ));
        assert!(matches!(
            market.close_pool(&ctx("anyone", NOW), "p1"),
            Err(MarketError::CloseTooEarly { .. })
        ));
    }

    #[test]
    fn test_settle_requires_close_and_is_single_shot() {
        let (mut store, mut ledger) = setup();
        let cap = settler_cap(&mut store);
        let mut market = PoolMarket::new(&mut store, &mut ledger);
        market
            .create_pool("p1", "b1", ASSET, CLOSE, PoolParams::default())
            .unwrap();

        assert!(matches!(
            market.settle(&cap, "p1", Outcome::A),
            Err(MarketError::PoolNotClosed(_))
        ));
        market.close_pool(&ctx("anyone", CLOSE), "p1").unwrap();
        assert!(matches!(
            market.close_pool(&ctx("anyone", CLOSE), "p1"),
            Err(MarketError::AlreadyClosed(_))
        ));
        market.settle(&cap, "p1", Outcome::B).unwrap();
        assert!(matches!(
            market.settle(&cap, "p1", Outcome::A),
            Err(MarketError::AlreadySettled(_))
        ));
    }

    #[test]
    fn test_claim_is_single_shot() {
        let (mut store, mut ledger) = setup();
        let cap = settler_cap(&mut store);
        let mut market = PoolMarket::new(&mut store, &mut ledger);
        market
            .create_pool("p1", "b1", ASSET, CLOSE, PoolParams::default())
            .unwrap();
        market
            .place_bet(&ctx("alice", NOW), "p1", Outcome::A, 1_000)
            .unwrap();

        let alice = Address::new("alice");
        assert!(matches!(
            market.claim("p1", &alice),
            Err(MarketError::PoolNotSettled(_))
        ));
        market.close_pool(&ctx("anyone", CLOSE), "p1").unwrap();
        market.settle(&cap, "p1", Outcome::A).unwrap();
        market.claim("p1", &alice).unwrap();
        assert!(matches!(
            market.claim("p1", &alice),
            Err(MarketError::AlreadyClaimed)
        ));
    }

    #[test]
    fn test_streak_bonus_schedule() {
        let (mut store, mut ledger) = setup();
        let cap = settler_cap(&mut store);
        let alice = Address::new("alice");

        // five consecutive winning pools; 1000-stake solo winner each time
        for (round, expected_bonus) in [(0u64, 0u128), (1, 47), (2, 95), (3, 142), (4, 190)] {
            let mut market = PoolMarket::new(&mut store, &mut ledger);
            let id = format!("p{round}");
            market
                .create_pool(&id, "b1", ASSET, CLOSE, PoolParams::default())
                .unwrap();
            market
                .place_bet(&ctx("alice", NOW), &id, Outcome::A, 1_000)
                .unwrap();
            market.close_pool(&ctx("anyone", CLOSE), &id).unwrap();
            market.settle(&cap, &id, Outcome::A).unwrap();
            // solo pool: payout = 950 (edge 5%), bonus = 5% x (streak-1),
            // capped at 25% from streak 5
            let expected_payout = 950;
            let paid = market.claim(&id, &alice).unwrap();
            let bonus_bps = (500 * round).min(2_500);
            assert_eq!(u128::from(bonus_bps) * expected_payout / 10_000, expected_bonus);
            assert_eq!(paid, expected_payout + expected_bonus);
        }
        assert_eq!(store::read_counter(&store, &keys::streak(&alice)).unwrap(), 5);
    }
}
