//! # Bounded Sweeps
//!
//! The surface the autonomous scheduler calls. Each sweep scans the
//! creation-order index keys, performs at most `limit` state changes, and is
//! idempotent - re-invoking it across cycles (or after a crash) repeats no
//! work and breaks nothing. The scheduler itself lives outside the core; it
//! only ever sees these entry points and the signal outbox.

use colosseum_arena::{BattleEngine, EntropySource};
use colosseum_core::{keys, store, CallContext, EntityStore};
use colosseum_market::{AssetLedger, Outcome, PoolMarket, SinglePool};
use tracing::debug;

use crate::error::ColosseumError;
use crate::runtime::Colosseum;
use crate::ColosseumResult;

/// Reads a creation-order index (`prefix:<n>` -> id) into owned ids.
fn read_index(
    store: &dyn EntityStore,
    count_key: &str,
    index_key: impl Fn(u64) -> String,
) -> Result<Vec<String>, ColosseumError> {
    let count = store::read_counter(store, count_key)?;
    let mut ids = Vec::with_capacity(count as usize);
    for i in 0..count {
        let Ok(bytes) = store.get(&index_key(i)) else {
            continue;
        };
        if let Ok(id) = String::from_utf8(bytes) {
            ids.push(id);
        }
    }
    Ok(ids)
}

impl<S: EntityStore, L: AssetLedger, E: EntropySource> Colosseum<S, L, E> {
    /// Closes every pool past its close time, up to `limit` per call.
    /// Permissionless. Returns the number of pools closed.
    ///
    /// # Errors
    ///
    /// Pause, reentrancy, or a corrupt pool record.
    pub fn close_due_pools(&mut self, ctx: &CallContext, limit: usize) -> ColosseumResult<usize> {
        self.guarded(true, |txn, ledger, _, _| {
            let ids = read_index(txn, keys::SPOOL_COUNT, keys::single_pool_index)?;
            let mut due = Vec::new();
            for id in ids {
                if due.len() >= limit {
                    break;
                }
                let pool = SinglePool::load(txn, &id)?;
                if !pool.closed && ctx.now >= pool.close_time {
                    due.push(id);
                }
            }
            let mut market = PoolMarket::new(txn, ledger);
            for id in &due {
                market.close_pool(ctx, id)?;
            }
            debug!(closed = due.len(), "close sweep done");
            Ok((due.len(), market.into_signals()))
        })
    }

    /// Settles every closed, unsettled pool whose battle has been finalized,
    /// up to `limit` per call. Caller must be an authorized settler. Returns
    /// the number of pools settled.
    ///
    /// # Errors
    ///
    /// Missing settler authorization, pause, reentrancy, or a corrupt
    /// record.
    pub fn settle_due_pools(&mut self, ctx: &CallContext, limit: usize) -> ColosseumResult<usize> {
        self.guarded(true, |txn, ledger, _, _| {
            let cap = colosseum_core::gate::settler_cap(txn, &ctx.caller)?;
            let ids = read_index(txn, keys::SPOOL_COUNT, keys::single_pool_index)?;
            let mut due = Vec::new();
            for id in ids {
                if due.len() >= limit {
                    break;
                }
                let pool = SinglePool::load(txn, &id)?;
                if pool.closed && !pool.settled {
                    let battle = colosseum_arena::Battle::load(txn, &pool.battle)?;
                    if let Some(winner) = battle.winner.filter(|_| battle.finalized) {
                        let outcome = match winner {
                            colosseum_arena::BattleSide::One => Outcome::A,
                            colosseum_arena::BattleSide::Two => Outcome::B,
                        };
                        due.push((id, outcome));
                    }
                }
            }
            let mut market = PoolMarket::new(txn, ledger);
            for (id, outcome) in &due {
                market.settle(&cap, id, *outcome)?;
            }
            debug!(settled = due.len(), "settle sweep done");
            Ok((due.len(), market.into_signals()))
        })
    }

    /// Expires every wildcard past its decision deadline (missing decisions
    /// count as decline), up to `limit` per call. Permissionless. Returns
    /// the number of wildcards expired.
    ///
    /// # Errors
    ///
    /// Pause, reentrancy, or a corrupt battle record.
    pub fn expire_wildcards(&mut self, ctx: &CallContext, limit: usize) -> ColosseumResult<usize> {
        self.guarded(true, |txn, _, entropy, config| {
            let ids = read_index(txn, keys::BATTLE_COUNT, keys::battle_index)?;
            let mut engine = BattleEngine::new(txn, entropy, &config.battle);
            let mut expired = 0usize;
            for id in &ids {
                if expired >= limit {
                    break;
                }
                if engine.expire_wildcard(ctx.now, id)? {
                    expired += 1;
                }
            }
            debug!(expired, "wildcard sweep done");
            Ok((expired, engine.into_signals()))
        })
    }

    /// Forfeits every unfinished battle whose side-to-act has been silent
    /// past the stall timeout, up to `limit` per call. Permissionless.
    /// Returns the number of battles forfeited.
    ///
    /// # Errors
    ///
    /// Pause, reentrancy, or a corrupt battle record.
    pub fn forfeit_stalled_battles(
        &mut self,
        ctx: &CallContext,
        limit: usize,
    ) -> ColosseumResult<usize> {
        self.guarded(true, |txn, _, entropy, config| {
            let ids = read_index(txn, keys::BATTLE_COUNT, keys::battle_index)?;
            let mut engine = BattleEngine::new(txn, entropy, &config.battle);
            let mut forfeited = 0usize;
            for id in &ids {
                if forfeited >= limit {
                    break;
                }
                if engine.forfeit_if_stalled(ctx.now, id)? {
                    forfeited += 1;
                }
            }
            debug!(forfeited, "forfeit sweep done");
            Ok((forfeited, engine.into_signals()))
        })
    }
}
