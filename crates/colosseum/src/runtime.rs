//! # Runtime
//!
//! [`Colosseum`] owns the three collaborators (entity store, asset ledger,
//! entropy source) and exposes every externally invokable operation. Each
//! mutating entry point runs to completion against one staged transaction:
//!
//! 1. pause check (admin surface excepted, or unpausing would deadlock)
//! 2. reentrancy lock acquire
//! 3. operation body against the transaction overlay
//! 4. commit on success / drop on abort
//! 5. lock release, then signal publication to the outbox
//!
//! A nested mutating call observed while the lock is held - the classic
//! transfer-callback re-entry - fails at step 2 with `GateError::Reentrancy`
//! and commits nothing.

use parking_lot::Mutex;

use colosseum_arena::{
    Battle, BattleEngine, BattleSide, CharacterClass, CharacterRegistry, EntropySource,
    EquipRarity, EquipmentKind, StatKind, TurnCommand, TurnOutcome,
};
use colosseum_core::{
    gate, keys, store, Address, CallContext, EntityStore, Notification, Role, SettlerCap,
    StoreTxn,
};
use colosseum_market::{
    AssetLedger, MarketError, Outcome, ParlayMarket, PoolMarket, PoolParams, HOUSE,
};

use crate::config::ColosseumConfig;
use crate::error::{ColosseumError, ColosseumResult};

/// The runtime: one store, one ledger, one entropy source, one gate.
pub struct Colosseum<S: EntityStore, L: AssetLedger, E: EntropySource> {
    store: S,
    ledger: L,
    entropy: E,
    config: ColosseumConfig,
    outbox: Mutex<Vec<Notification>>,
}

impl<S: EntityStore, L: AssetLedger, E: EntropySource> Colosseum<S, L, E> {
    /// Creates a runtime and grants the genesis admin both roles.
    pub fn new(store: S, ledger: L, entropy: E, config: ColosseumConfig, admin: &Address) -> Self {
        let mut store = store;
        gate::grant_role(&mut store, Role::Admin, admin);
        gate::grant_role(&mut store, Role::Pauser, admin);
        Self {
            store,
            ledger,
            entropy,
            config,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Read access to the entity store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read access to the asset ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The active configuration.
    pub fn config(&self) -> &ColosseumConfig {
        &self.config
    }

    /// Drains every signal published since the last drain. External settlers
    /// and bots poll this through a shared reference.
    pub fn take_signals(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.outbox.lock())
    }

    /// Issues the typed settler capability for an allow-listed address.
    ///
    /// # Errors
    ///
    /// `GateError::NotSettler` when the address is not authorized.
    pub fn settler_cap(&self, addr: &Address) -> ColosseumResult<SettlerCap> {
        Ok(gate::settler_cap(&self.store, addr)?)
    }

    /// Gate-wrapped execution of one mutating operation. The body receives
    /// the staged transaction as an erased store handle; its writes land on
    /// the base store only if the body succeeds.
    pub(crate) fn guarded<T>(
        &mut self,
        check_pause: bool,
        f: impl FnOnce(
            &mut dyn EntityStore,
            &mut L,
            &mut E,
            &ColosseumConfig,
        ) -> Result<(T, Vec<Notification>), ColosseumError>,
    ) -> ColosseumResult<T> {
        let Self {
            store,
            ledger,
            entropy,
            config,
            outbox,
        } = self;
        if check_pause {
            gate::ensure_open(store)?;
        }
        gate::acquire(store)?;
        let outcome = {
            let mut txn = StoreTxn::new(store);
            match f(&mut txn, ledger, entropy, config) {
                Ok((value, signals)) => {
                    txn.commit();
                    Ok((value, signals))
                }
                Err(e) => Err(e),
            }
        };
        gate::release(store);
        let (value, signals) = outcome?;
        outbox.lock().extend(signals);
        Ok(value)
    }

    // ========================================================================
    // Administrative surface
    // ========================================================================

    /// Grants a role. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role, or the reentrancy lock is held.
    pub fn grant_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        addr: &Address,
    ) -> ColosseumResult<()> {
        self.guarded(false, |txn, _, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            gate::grant_role(txn, role, addr);
            Ok((
                (),
                vec![Notification::RoleGranted {
                    role: role.as_str().to_owned(),
                    addr: addr.clone(),
                }],
            ))
        })
    }

    /// Revokes a role. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role, or the reentrancy lock is held.
    pub fn revoke_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        addr: &Address,
    ) -> ColosseumResult<()> {
        self.guarded(false, |txn, _, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            gate::revoke_role(txn, role, addr);
            Ok((
                (),
                vec![Notification::RoleRevoked {
                    role: role.as_str().to_owned(),
                    addr: addr.clone(),
                }],
            ))
        })
    }

    /// Pauses every pause-gated entry point. Pauser-only.
    ///
    /// # Errors
    ///
    /// Missing pauser role, or the reentrancy lock is held.
    pub fn pause(&mut self, ctx: &CallContext) -> ColosseumResult<()> {
        self.guarded(false, |txn, _, _, _| {
            gate::require_role(txn, Role::Pauser, &ctx.caller)?;
            gate::set_paused(txn, true);
            Ok(((), vec![Notification::Paused]))
        })
    }

    /// Unpauses. Pauser-only; deliberately not pause-gated itself.
    ///
    /// # Errors
    ///
    /// Missing pauser role, or the reentrancy lock is held.
    pub fn unpause(&mut self, ctx: &CallContext) -> ColosseumResult<()> {
        self.guarded(false, |txn, _, _, _| {
            gate::require_role(txn, Role::Pauser, &ctx.caller)?;
            gate::set_paused(txn, false);
            Ok(((), vec![Notification::Unpaused]))
        })
    }

    /// Adds an address to the authorized-settler allow-list. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role, or the reentrancy lock is held.
    pub fn authorize_settler(
        &mut self,
        ctx: &CallContext,
        addr: &Address,
    ) -> ColosseumResult<()> {
        self.guarded(false, |txn, _, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            gate::set_settler(txn, addr, true);
            Ok((
                (),
                vec![Notification::SettlerAuthorized { addr: addr.clone() }],
            ))
        })
    }

    /// Removes an address from the authorized-settler allow-list.
    /// Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role, or the reentrancy lock is held.
    pub fn revoke_settler(&mut self, ctx: &CallContext, addr: &Address) -> ColosseumResult<()> {
        self.guarded(false, |txn, _, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            gate::set_settler(txn, addr, false);
            Ok((
                (),
                vec![Notification::SettlerRevoked { addr: addr.clone() }],
            ))
        })
    }

    /// Pays the accrued house-edge counter out of the house account.
    /// Admin-only. Returns the amount withdrawn.
    ///
    /// # Errors
    ///
    /// Missing admin role or a failed transfer.
    pub fn withdraw_treasury(
        &mut self,
        ctx: &CallContext,
        asset: &str,
        to: &Address,
    ) -> ColosseumResult<u128> {
        self.guarded(false, |txn, ledger, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            let amount = store::read_amount(txn, keys::TREASURY)?;
            store::write_amount(txn, keys::TREASURY, 0);
            if amount > 0 {
                ledger
                    .transfer(asset, &Address::new(HOUSE), to, amount)
                    .map_err(MarketError::Asset)?;
            }
            Ok((
                amount,
                vec![Notification::TreasuryWithdrawn {
                    to: to.clone(),
                    amount,
                }],
            ))
        })
    }

    // ========================================================================
    // Character & equipment registry
    // ========================================================================

    /// Creates a character owned by the caller.
    ///
    /// # Errors
    ///
    /// Duplicate id, pause, or reentrancy.
    pub fn create_character(
        &mut self,
        ctx: &CallContext,
        id: &str,
        class: CharacterClass,
        name: &str,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.create_character(ctx, id, class, name)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Spends 100 xp on one stat upgrade. Owner-only.
    ///
    /// # Errors
    ///
    /// Registry validation failures, pause, or reentrancy.
    pub fn upgrade_character(
        &mut self,
        ctx: &CallContext,
        id: &str,
        stat: StatKind,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.upgrade(ctx, id, stat)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Grants xp with auto-levelling. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role or an unknown character.
    pub fn grant_xp(&mut self, ctx: &CallContext, id: &str, amount: u64) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.grant_xp(id, amount)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Learns a skill for 150 xp. Owner-only.
    ///
    /// # Errors
    ///
    /// Registry validation failures, pause, or reentrancy.
    pub fn learn_skill(&mut self, ctx: &CallContext, id: &str, skill: u8) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.learn_skill(ctx, id, skill)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Places a learned skill into slot 1-3. Owner-only.
    ///
    /// # Errors
    ///
    /// Registry validation failures, pause, or reentrancy.
    pub fn equip_skill(
        &mut self,
        ctx: &CallContext,
        id: &str,
        slot: u8,
        skill: u8,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.equip_skill(ctx, id, slot, skill)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Mints equipment for an owner. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role or a duplicate id.
    pub fn mint_equipment(
        &mut self,
        ctx: &CallContext,
        id: &str,
        owner: &Address,
        kind: EquipmentKind,
        rarity: EquipRarity,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.mint_equipment(ctx, id, owner, kind, rarity)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Transfers equipment ownership. Owner-only.
    ///
    /// # Errors
    ///
    /// Registry validation failures, pause, or reentrancy.
    pub fn transfer_equipment(
        &mut self,
        ctx: &CallContext,
        id: &str,
        to: &Address,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.transfer_equipment(ctx, id, to)?;
            Ok(((), reg.into_signals()))
        })
    }

    /// Equips an item into its kind's slot. Caller must own both.
    ///
    /// # Errors
    ///
    /// Registry validation failures, pause, or reentrancy.
    pub fn equip_item(
        &mut self,
        ctx: &CallContext,
        character: &str,
        equipment: &str,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, _, config| {
            let mut reg = CharacterRegistry::new(txn, &config.battle);
            reg.equip_item(ctx, character, equipment)?;
            Ok(((), reg.into_signals()))
        })
    }

    // ========================================================================
    // Battle engine
    // ========================================================================

    /// Creates a battle between two characters; the caller owns side 1.
    ///
    /// # Errors
    ///
    /// Engine validation failures, pause, or reentrancy.
    pub fn create_battle(
        &mut self,
        ctx: &CallContext,
        id: &str,
        char1: &str,
        char2: &str,
        start_time: u64,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, entropy, config| {
            let mut engine = BattleEngine::new(txn, entropy, &config.battle);
            engine.create_battle(ctx, id, char1, char2, start_time)?;
            Ok(((), engine.into_signals()))
        })
    }

    /// Resolves one turn (or triggers a wildcard).
    ///
    /// # Errors
    ///
    /// Engine validation failures, pause, or reentrancy.
    pub fn execute_turn(
        &mut self,
        ctx: &CallContext,
        cmd: &TurnCommand,
    ) -> ColosseumResult<TurnOutcome> {
        self.guarded(true, |txn, _, entropy, config| {
            let mut engine = BattleEngine::new(txn, entropy, &config.battle);
            let outcome = engine.execute_turn(ctx, cmd)?;
            Ok((outcome, engine.into_signals()))
        })
    }

    /// Submits the caller's wildcard decision. Returns true once both
    /// decisions are in and the wildcard resolved.
    ///
    /// # Errors
    ///
    /// Engine validation failures, pause, or reentrancy.
    pub fn decide_wildcard(
        &mut self,
        ctx: &CallContext,
        battle_id: &str,
        accept: bool,
    ) -> ColosseumResult<bool> {
        self.guarded(true, |txn, _, entropy, config| {
            let mut engine = BattleEngine::new(txn, entropy, &config.battle);
            let resolved = engine.decide_wildcard(ctx, battle_id, accept)?;
            Ok((resolved, engine.into_signals()))
        })
    }

    /// One-shot post-battle finalize; emits the authoritative settlement
    /// signal. Permissionless.
    ///
    /// # Errors
    ///
    /// Engine validation failures, pause, or reentrancy.
    pub fn finalize_battle(&mut self, battle_id: &str) -> ColosseumResult<()> {
        self.guarded(true, |txn, _, entropy, config| {
            let mut engine = BattleEngine::new(txn, entropy, &config.battle);
            engine.finalize(battle_id)?;
            Ok(((), engine.into_signals()))
        })
    }

    // ========================================================================
    // Single-pool market
    // ========================================================================

    /// Creates a parimutuel pool tied to an existing battle. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role, unknown battle, or a duplicate pool id.
    pub fn create_pool(
        &mut self,
        ctx: &CallContext,
        id: &str,
        battle_id: &str,
        asset: &str,
        close_time: u64,
        params: PoolParams,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            if !txn.has(&keys::battle(battle_id)) {
                return Err(
                    colosseum_arena::ArenaError::UnknownBattle(battle_id.to_owned()).into(),
                );
            }
            let mut market = PoolMarket::new(txn, ledger);
            market.create_pool(id, battle_id, asset, close_time, params)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Places the caller's bet on one outcome.
    ///
    /// # Errors
    ///
    /// Market validation or funds failures, pause, or reentrancy.
    pub fn place_bet(
        &mut self,
        ctx: &CallContext,
        pool_id: &str,
        outcome: Outcome,
        amount: u128,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            let mut market = PoolMarket::new(txn, ledger);
            market.place_bet(ctx, pool_id, outcome, amount)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Closes betting and snapshots odds. Permissionless after close time.
    ///
    /// # Errors
    ///
    /// Market validation failures, pause, or reentrancy.
    pub fn close_pool(&mut self, ctx: &CallContext, pool_id: &str) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            let mut market = PoolMarket::new(txn, ledger);
            market.close_pool(ctx, pool_id)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Settles a pool with an explicit outcome. Caller must be an
    /// authorized settler.
    ///
    /// # Errors
    ///
    /// Missing settler authorization or market validation failures.
    pub fn settle_pool(
        &mut self,
        ctx: &CallContext,
        pool_id: &str,
        winner: Outcome,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            let cap = gate::settler_cap(txn, &ctx.caller)?;
            let mut market = PoolMarket::new(txn, ledger);
            market.settle(&cap, pool_id, winner)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Settles a pool from its finalized battle's recorded winner (side 1
    /// maps to outcome A). Caller must be an authorized settler. Returns the
    /// settled outcome.
    ///
    /// # Errors
    ///
    /// Missing settler authorization, an unfinalized battle, or market
    /// validation failures.
    pub fn settle_pool_from_battle(
        &mut self,
        ctx: &CallContext,
        pool_id: &str,
    ) -> ColosseumResult<Outcome> {
        self.guarded(true, |txn, ledger, _, _| {
            let cap = gate::settler_cap(txn, &ctx.caller)?;
            let pool = colosseum_market::SinglePool::load(txn, pool_id)?;
            let battle = Battle::load(txn, &pool.battle)?;
            let winner = battle.winner.filter(|_| battle.finalized).ok_or_else(|| {
                colosseum_arena::ArenaError::BattleNotFinished(pool.battle.clone())
            })?;
            let outcome = match winner {
                BattleSide::One => Outcome::A,
                BattleSide::Two => Outcome::B,
            };
            let mut market = PoolMarket::new(txn, ledger);
            market.settle(&cap, pool_id, outcome)?;
            Ok((outcome, market.into_signals()))
        })
    }

    /// Claims a bettor's bet on a settled pool. Permissionless; pays the
    /// bettor. Returns the amount paid.
    ///
    /// # Errors
    ///
    /// Market validation or funds failures, pause, or reentrancy.
    pub fn claim_bet(&mut self, pool_id: &str, bettor: &Address) -> ColosseumResult<u128> {
        self.guarded(true, |txn, ledger, _, _| {
            let mut market = PoolMarket::new(txn, ledger);
            let paid = market.claim(pool_id, bettor)?;
            Ok((paid, market.into_signals()))
        })
    }

    // ========================================================================
    // Parlay market
    // ========================================================================

    /// Creates a multipool. Admin-only.
    ///
    /// # Errors
    ///
    /// Missing admin role or a duplicate id.
    pub fn create_multipool(
        &mut self,
        ctx: &CallContext,
        id: &str,
        asset: &str,
        edge_bps: u32,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            gate::require_role(txn, Role::Admin, &ctx.caller)?;
            let mut market = ParlayMarket::new(txn, ledger);
            market.create_multipool(id, asset, edge_bps)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Places the caller's parlay ticket over closed pools.
    ///
    /// # Errors
    ///
    /// Market validation or funds failures, pause, or reentrancy.
    pub fn place_multibet(
        &mut self,
        ctx: &CallContext,
        betslip_id: &str,
        multipool_id: &str,
        amount: u128,
        picks: &[(String, Outcome)],
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            let mut market = ParlayMarket::new(txn, ledger);
            market.place_multibet(ctx, betslip_id, multipool_id, amount, picks)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Accounts a betslip's winner status against settled pools.
    /// Permissionless, single-shot. Returns the winner status.
    ///
    /// # Errors
    ///
    /// Market validation failures, pause, or reentrancy.
    pub fn check_winner(&mut self, betslip_id: &str) -> ColosseumResult<bool> {
        self.guarded(true, |txn, ledger, _, _| {
            let mut market = ParlayMarket::new(txn, ledger);
            let winner = market.check_winner(betslip_id)?;
            Ok((winner, market.into_signals()))
        })
    }

    /// Freezes a multipool's payouts. Caller must be an authorized settler.
    ///
    /// # Errors
    ///
    /// Missing settler authorization or market validation failures.
    pub fn finalize_multipool(
        &mut self,
        ctx: &CallContext,
        multipool_id: &str,
    ) -> ColosseumResult<()> {
        self.guarded(true, |txn, ledger, _, _| {
            let cap = gate::settler_cap(txn, &ctx.caller)?;
            let mut market = ParlayMarket::new(txn, ledger);
            market.finalize(&cap, multipool_id)?;
            Ok(((), market.into_signals()))
        })
    }

    /// Claims a betslip on a finalized multipool. Permissionless; pays the
    /// slip's bettor. Returns the amount paid.
    ///
    /// # Errors
    ///
    /// Market validation or funds failures, pause, or reentrancy.
    pub fn claim_betslip(&mut self, betslip_id: &str) -> ColosseumResult<u128> {
        self.guarded(true, |txn, ledger, _, _| {
            let mut market = ParlayMarket::new(txn, ledger);
            let paid = market.claim(betslip_id)?;
            Ok((paid, market.into_signals()))
        })
    }
}
