//! # Parlay (Multipool) Market
//!
//! Multi-leg tickets over already-closed single pools. Combined odds are the
//! exact fixed-point product of the per-leg snapshots; a ticket wins iff
//! every leg's snapshot outcome equals that pool's settled outcome. Payouts
//! are weight-proportional out of the multipool once it is finalized.

use colosseum_core::{
    decode_record, keys, store, Address, CallContext, DecodeError, DecodeResult, EntityStore,
    Notification, RecordReader, RecordWriter, SettlerCap, StoreError,
};
use tracing::{debug, info};

use crate::asset::{AssetLedger, HOUSE};
use crate::error::{MarketError, MarketResult};
use crate::fixed_point::{pro_rata, split_edge, Odds};
use crate::single_pool::{Outcome, SinglePool};

/// Multipool/betslip record version.
pub const RECORD_VERSION: u8 = 1;

/// Maximum legs per betslip.
pub const MAX_LEGS: usize = 8;

/// A parlay pot shared by all tickets staked into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multipool {
    /// Stake asset id.
    pub asset: String,
    /// Total staked across all tickets.
    pub total: u128,
    /// Sum of all ticket weights.
    pub total_weight: u128,
    /// Sum of winning ticket weights (grows as slips are accounted).
    pub winning_weight: u128,
    /// Set once payouts are frozen.
    pub finalized: bool,
    /// House edge in basis points.
    pub edge_bps: u32,
}

impl Multipool {
    /// Creates an empty multipool.
    #[must_use]
    pub const fn new(asset: String, edge_bps: u32) -> Self {
        Self {
            asset,
            total: 0,
            total_weight: 0,
            winning_weight: 0,
            finalized: false,
            edge_bps,
        }
    }

    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(&self.asset)
            .u128(self.total)
            .u128(self.total_weight)
            .u128(self.winning_weight)
            .bool(self.finalized)
            .u32(self.edge_bps);
        w.finish()
    }

    /// Decodes a record previously produced by [`Multipool::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, |r| {
            Ok(Self {
                asset: r.str()?,
                total: r.u128()?,
                total_weight: r.u128()?,
                winning_weight: r.u128()?,
                finalized: r.bool()?,
                edge_bps: r.u32()?,
            })
        })
    }

    /// Loads a multipool by id.
    ///
    /// # Errors
    ///
    /// `MarketError::UnknownMultipool` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(store: &S, id: &str) -> MarketResult<Self> {
        let key = keys::multipool(id);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(MarketError::UnknownMultipool(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the multipool under its id.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S, id: &str) {
        store.set(&keys::multipool(id), self.encode());
    }
}

/// One leg of a parlay ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Referenced pool id.
    pub pool: String,
    /// Predicted outcome.
    pub outcome: Outcome,
    /// Odds snapshot taken at placement (the pool's close-time odds).
    pub odds: Odds,
}

/// A parlay ticket: one stake spanning multiple pool legs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Betslip {
    /// The bettor.
    pub bettor: Address,
    /// Multipool id.
    pub multipool: String,
    /// Staked amount.
    pub amount: u128,
    /// Ordered legs.
    pub selections: Vec<Selection>,
    /// Fixed-point product of the per-leg odds.
    pub combined: Odds,
    /// Ticket weight: `amount x combined / SCALE`.
    pub weight: u128,
    /// Set by accounting when every leg matched.
    pub winner: bool,
    /// Set once the winner status was accounted (single-shot).
    pub accounted: bool,
    /// Set once claimed (win or lose).
    pub claimed: bool,
}

impl Betslip {
    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(self.bettor.as_str())
            .str(&self.multipool)
            .u128(self.amount);
        w.u16(self.selections.len() as u16);
        for s in &self.selections {
            w.str(&s.pool).u8(s.outcome.as_u8()).u128(s.odds.raw());
        }
        w.u128(self.combined.raw())
            .u128(self.weight)
            .bool(self.winner)
            .bool(self.accounted)
            .bool(self.claimed);
        w.finish()
    }

    /// Decodes a record previously produced by [`Betslip::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, Self::decode_fields)
    }

    fn decode_fields(r: &mut RecordReader<'_>) -> DecodeResult<Self> {
        let bettor = Address::new(r.str()?);
        let multipool = r.str()?;
        let amount = r.u128()?;
        let count = r.u16()? as usize;
        let mut selections = Vec::with_capacity(count);
        for _ in 0..count {
            let pool = r.str()?;
            let outcome_byte = r.u8()?;
            let outcome = Outcome::from_u8(outcome_byte)
                .ok_or_else(|| DecodeError(format!("invalid outcome byte {outcome_byte}")))?;
            let odds = Odds::from_raw(r.u128()?);
            selections.push(Selection {
                pool,
                outcome,
                odds,
            });
        }
        Ok(Self {
            bettor,
            multipool,
            amount,
            selections,
            combined: Odds::from_raw(r.u128()?),
            weight: r.u128()?,
            winner: r.bool()?,
            accounted: r.bool()?,
            claimed: r.bool()?,
        })
    }

    /// Loads a betslip by id.
    ///
    /// # Errors
    ///
    /// `MarketError::UnknownBetslip` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(store: &S, id: &str) -> MarketResult<Self> {
        let key = keys::betslip(id);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(MarketError::UnknownBetslip(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the betslip under its id.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S, id: &str) {
        store.set(&keys::betslip(id), self.encode());
    }
}

/// Parlay market engine over a borrowed store and asset ledger.
pub struct ParlayMarket<'a, S: EntityStore + ?Sized, L: AssetLedger + ?Sized> {
    store: &'a mut S,
    ledger: &'a mut L,
    signals: Vec<Notification>,
}

impl<'a, S: EntityStore + ?Sized, L: AssetLedger + ?Sized> ParlayMarket<'a, S, L> {
    /// Creates a parlay engine over `store` and `ledger`.
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

    /// Creates a multipool under a unique id. Admin-only at the runtime
    /// boundary.
    ///
    /// # Errors
    ///
    /// `MultipoolExists` on a duplicate id.
    pub fn create_multipool(&mut self, id: &str, asset: &str, edge_bps: u32) -> MarketResult<()> {
        if self.store.has(&keys::multipool(id)) {
            return Err(MarketError::MultipoolExists(id.to_owned()));
        }
        Multipool::new(asset.to_owned(), edge_bps).save(self.store, id);
        store::bump_counter(self.store, keys::MPOOL_COUNT)?;
        info!(id, asset, "multipool created");
        self.signals
            .push(Notification::MultipoolCreated { id: id.to_owned() });
        Ok(())
    }

    /// Places a parlay ticket. Every leg must reference an already-closed
    /// pool with nonzero odds for the chosen outcome; the full stake is
    /// pulled once.
    ///
    /// # Errors
    ///
    /// Duplicate slip id, bad leg set, open-pool or zero-odds legs,
    /// overflow, or a failed pull.
    pub fn place_multibet(
        &mut self,
        ctx: &CallContext,
        betslip_id: &str,
        multipool_id: &str,
        amount: u128,
        picks: &[(String, Outcome)],
    ) -> MarketResult<()> {
        if self.store.has(&keys::betslip(betslip_id)) {
            return Err(MarketError::BetslipExists(betslip_id.to_owned()));
        }
        let mut multipool = Multipool::load(self.store, multipool_id)?;
        if multipool.finalized {
            return Err(MarketError::AlreadyFinalized(multipool_id.to_owned()));
        }
        if picks.is_empty() {
            return Err(MarketError::NoSelections);
        }
        if picks.len() > MAX_LEGS {
            return Err(MarketError::TooManyLegs { max: MAX_LEGS });
        }

        let mut selections = Vec::with_capacity(picks.len());
        let mut combined = Odds::ONE;
        for (pool_id, outcome) in picks {
            if selections.iter().any(|s: &Selection| &s.pool == pool_id) {
                return Err(MarketError::DuplicateLeg(pool_id.clone()));
            }
            let pool = SinglePool::load(self.store, pool_id)?;
            if !pool.closed {
                return Err(MarketError::LegNotClosed(pool_id.clone()));
            }
            let odds = pool.odds(*outcome);
            if odds.is_zero() {
                return Err(MarketError::ZeroOddsOutcome(pool_id.clone()));
            }
            combined = combined.combine(odds).ok_or(MarketError::Overflow)?;
            selections.push(Selection {
                pool: pool_id.clone(),
                outcome: *outcome,
                odds,
            });
        }
        let weight = combined.apply(amount).ok_or(MarketError::Overflow)?;

        let house = Address::new(HOUSE);
        self.ledger
            .transfer_from(&multipool.asset, &house, &ctx.caller, &house, amount)?;

        multipool.total = multipool
            .total
            .checked_add(amount)
            .ok_or(MarketError::Overflow)?;
        multipool.total_weight = multipool
            .total_weight
            .checked_add(weight)
            .ok_or(MarketError::Overflow)?;
        multipool.save(self.store, multipool_id);

        let slip = Betslip {
            bettor: ctx.caller.clone(),
            multipool: multipool_id.to_owned(),
            amount,
            selections,
            combined,
            weight,
            winner: false,
            accounted: false,
            claimed: false,
        };
        slip.save(self.store, betslip_id);
        debug!(
            betslip = betslip_id,
            multipool = multipool_id,
            amount = %amount,
            combined = %combined,
            "multibet placed"
        );
        self.signals.push(Notification::MultibetPlaced {
            betslip: betslip_id.to_owned(),
            multipool: multipool_id.to_owned(),
            amount,
            combined_odds: combined.raw(),
        });
        Ok(())
    }

    /// Accounts a betslip's winner status against the settled pools. Every
    /// referenced pool must be settled; any mismatch fails the whole ticket.
    /// Single-shot per slip; permissionless. Returns the winner status.
    ///
    /// # Errors
    ///
    /// Unknown slip, a not-yet-settled leg, or a repeated accounting.
    pub fn check_winner(&mut self, betslip_id: &str) -> MarketResult<bool> {
        let mut slip = Betslip::load(self.store, betslip_id)?;
        if slip.accounted {
            return Err(MarketError::AlreadyAccounted);
        }
        let mut winner = true;
        for selection in &slip.selections {
            let pool = SinglePool::load(self.store, &selection.pool)?;
            let Some(settled_winner) = pool.winner.filter(|_| pool.settled) else {
                return Err(MarketError::PoolNotSettled(selection.pool.clone()));
            };
            if settled_winner != selection.outcome {
                winner = false;
            }
        }
        slip.winner = winner;
        slip.accounted = true;
        slip.save(self.store, betslip_id);
        if winner {
            let mut multipool = Multipool::load(self.store, &slip.multipool)?;
            multipool.winning_weight = multipool
                .winning_weight
                .checked_add(slip.weight)
                .ok_or(MarketError::Overflow)?;
            multipool.save(self.store, &slip.multipool);
        }
        info!(betslip = betslip_id, winner, "betslip accounted");
        self.signals.push(Notification::BetslipAccounted {
            betslip: betslip_id.to_owned(),
            winner,
        });
        Ok(winner)
    }

    /// Freezes payouts. Requires the settler capability; only once.
    ///
    /// # Errors
    ///
    /// `AlreadyFinalized` on a repeat.
    pub fn finalize(&mut self, cap: &SettlerCap, multipool_id: &str) -> MarketResult<()> {
        let mut multipool = Multipool::load(self.store, multipool_id)?;
        if multipool.finalized {
            return Err(MarketError::AlreadyFinalized(multipool_id.to_owned()));
        }
        multipool.finalized = true;
        multipool.save(self.store, multipool_id);
        info!(multipool = multipool_id, settler = %cap.address(), "multipool finalized");
        self.signals.push(Notification::MultipoolFinalized {
            id: multipool_id.to_owned(),
        });
        Ok(())
    }

    /// Claims a betslip: zero for a loser, the weight-proportional share of
    /// the post-edge pot for a winner. Requires accounting and a finalized
    /// multipool; the claimed flag is staged before funds move. Returns the
    /// amount paid to the slip's bettor.
    ///
    /// # Errors
    ///
    /// Unknown/unaccounted/claimed slip, unfinalized multipool, impossible
    /// zero winning weight, or a failed outbound transfer.
    pub fn claim(&mut self, betslip_id: &str) -> MarketResult<u128> {
        let mut slip = Betslip::load(self.store, betslip_id)?;
        if slip.claimed {
            return Err(MarketError::AlreadyClaimed);
        }
        if !slip.accounted {
            return Err(MarketError::NotAccounted);
        }
        let multipool = Multipool::load(self.store, &slip.multipool)?;
        if !multipool.finalized {
            return Err(MarketError::NotFinalized(slip.multipool.clone()));
        }

        if !slip.winner {
            slip.claimed = true;
            slip.save(self.store, betslip_id);
            self.signals.push(Notification::BetslipClaimed {
                betslip: betslip_id.to_owned(),
                payout: 0,
            });
            return Ok(0);
        }

        if multipool.winning_weight == 0 {
            return Err(MarketError::ZeroWinningWeight);
        }
        let (pot, edge_total) = split_edge(multipool.total, multipool.edge_bps);
        let payout =
            pro_rata(pot, slip.weight, multipool.winning_weight).ok_or(MarketError::Overflow)?;

        // Claimed staged before the transfer; see the single-pool claim.
        slip.claimed = true;
        slip.save(self.store, betslip_id);

        let edge_share = pro_rata(edge_total, slip.weight, multipool.winning_weight)
            .ok_or(MarketError::Overflow)?;
        store::add_amount(self.store, keys::TREASURY, edge_share)?;

        let house = Address::new(HOUSE);
        self.ledger
            .transfer(&multipool.asset, &house, &slip.bettor, payout)?;
        info!(betslip = betslip_id, bettor = %slip.bettor, payout = %payout, "betslip claimed");
        self.signals.push(Notification::BetslipClaimed {
            betslip: betslip_id.to_owned(),
            payout,
        });
        Ok(payout)
    }
}
