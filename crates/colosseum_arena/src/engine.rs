//! # Battle Engine
//!
//! The turn-resolution state machine:
//! `Created -> Active <-> WildcardPending -> Active -> Finished`, then a
//! one-shot `finalize` that publishes the settlement signal.
//!
//! Every turn runs to completion against the borrowed store with no
//! suspension; deadlines (wildcard window, stall timeout) are evaluated
//! against the call's observed time and either permit or reject. All rolls
//! flow through the pluggable entropy source with a seed built once per roll
//! from (battle id, turn, creation time, call time, salt) - replay a battle
//! with the same seeds and it resolves identically.

use colosseum_core::{keys, store, CallContext, EntityStore, Notification};
use tracing::{debug, info};

use crate::battle::{Battle, BattleSide, Decision, WildcardKind, WildcardState};
use crate::character::Character;
use crate::equipment;
use crate::error::{ArenaError, ArenaResult};
use crate::rng::{self, salt, EntropySource, Seed};
use crate::rules::BattleRules;
use crate::skill::{self, SkillEffect};
use crate::status::StatusMask;

/// Combat stance supplied with each turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stance {
    /// No damage modifier.
    #[default]
    Balanced,
    /// +20% outgoing damage.
    Aggressive,
    /// -20% outgoing damage.
    Defensive,
}

impl Stance {
    /// Outgoing-damage multiplier in basis points.
    #[must_use]
    pub const fn damage_bps(self, rules: &BattleRules) -> u32 {
        match self {
            Self::Balanced => 10_000,
            Self::Aggressive => rules.stance_aggressive_bps,
            Self::Defensive => rules.stance_defensive_bps,
        }
    }
}

/// One turn call.
#[derive(Clone, Debug)]
pub struct TurnCommand {
    /// Battle id.
    pub battle: String,
    /// Acting character id.
    pub character: String,
    /// Combat stance for this turn.
    pub stance: Stance,
    /// Fire the class special (30 energy, x1.5 damage).
    pub use_special: bool,
    /// Skill slot 1-3, or 0 for none.
    pub skill_slot: u8,
}

/// What a turn call resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A wildcard interrupted the turn; no damage was resolved.
    WildcardTriggered {
        /// Triggered kind.
        kind: WildcardKind,
        /// Decision deadline (unix seconds).
        deadline: u64,
    },
    /// The attacker was stunned; the turn advanced without damage.
    Stunned,
    /// Damage resolved.
    Resolved {
        /// Damage applied to the defender.
        damage: u64,
        /// Whether the hit was critical.
        crit: bool,
        /// Whether the defender dodged.
        dodged: bool,
        /// Whether the battle finished this turn.
        finished: bool,
    },
}

/// Builds the seed for one roll. The call timestamp enters exactly once.
fn turn_seed(battle_id: &str, battle: &Battle, roll_salt: u64, now: u64) -> Seed {
    Seed {
        battle: rng::fnv1a(battle_id),
        turn: battle.turn,
        created_at: battle.created_at,
        now,
        salt: roll_salt,
    }
}

/// Applies a basis-point multiplier with u128 intermediate math.
const fn scale_bps(value: u64, bps: u32) -> u64 {
    ((value as u128 * bps as u128) / 10_000) as u64
}

/// Battle engine over a borrowed store and entropy source.
pub struct BattleEngine<'a, S: EntityStore + ?Sized> {
    store: &'a mut S,
    entropy: &'a mut dyn EntropySource,
    rules: &'a BattleRules,
    signals: Vec<Notification>,
}

impl<'a, S: EntityStore + ?Sized> BattleEngine<'a, S> {
    /// Creates an engine over `store` drawing from `entropy`.
    pub fn new(
        store: &'a mut S,
        entropy: &'a mut dyn EntropySource,
        rules: &'a BattleRules,
    ) -> Self {
        Self {
            store,
            entropy,
            rules,
            signals: Vec::new(),
        }
    }

    /// Consumes the engine and returns the signals it emitted.
    #[must_use]
    pub fn into_signals(self) -> Vec<Notification> {
        self.signals
    }

    /// Creates a battle. The caller must own side 1's character; both
    /// characters must exist and be distinct.
    ///
    /// # Errors
    ///
    /// Duplicate battle id, unknown characters, self-battle, or ownership
    /// mismatch on side 1.
    pub fn create_battle(
        &mut self,
        ctx: &CallContext,
        id: &str,
        char1: &str,
        char2: &str,
        start_time: u64,
    ) -> ArenaResult<()> {
        if self.store.has(&keys::battle(id)) {
            return Err(ArenaError::BattleExists(id.to_owned()));
        }
        if char1 == char2 {
            return Err(ArenaError::SelfBattle);
        }
        let c1 = Character::load(self.store, char1)?;
        c1.require_owner(char1, &ctx.caller)?;
        let c2 = Character::load(self.store, char2)?;

        let battle = Battle::new(
            char1.to_owned(),
            char2.to_owned(),
            c1.owner,
            c2.owner,
            c1.current_hp,
            c2.current_hp,
            start_time,
            ctx.now,
        );
        battle.save(self.store, id);
        let count = store::bump_counter(self.store, keys::BATTLE_COUNT)?;
        self.store
            .set(&keys::battle_index(count - 1), id.as_bytes().to_vec());
        info!(id, char1, char2, "battle created");
        self.signals.push(Notification::BattleCreated { id: id.to_owned() });
        Ok(())
    }

    /// Resolves one turn. See the module docs for the full pipeline.
    ///
    /// # Errors
    ///
    /// Any validation or authorization failure listed in [`ArenaError`];
    /// the call aborts with no state change.
    #[allow(clippy::too_many_lines)]
    pub fn execute_turn(&mut self, ctx: &CallContext, cmd: &TurnCommand) -> ArenaResult<TurnOutcome> {
        let mut battle = Battle::load(self.store, &cmd.battle)?;
        if battle.finished {
            return Err(ArenaError::BattleFinished(cmd.battle.clone()));
        }
        if ctx.now < battle.start_time {
            return Err(ArenaError::BattleNotStarted {
                starts: battle.start_time,
            });
        }
        if battle.wildcard.active {
            return Err(ArenaError::WildcardPending);
        }
        let side = battle
            .side_of(&cmd.character)
            .ok_or_else(|| ArenaError::NotInBattle {
                character: cmd.character.clone(),
                battle: cmd.battle.clone(),
            })?;
        let mut attacker = Character::load(self.store, &cmd.character)?;
        attacker.require_owner(&cmd.character, &ctx.caller)?;
        if battle.turn_of != side {
            return Err(ArenaError::NotYourTurn);
        }

        // Wildcard roll interrupts the turn before any damage resolution.
        let wildcard_roll = rng::roll_bp(
            &mut *self.entropy,
            turn_seed(&cmd.battle, &battle, salt::WILDCARD, ctx.now),
        );
        if wildcard_roll < attacker.class.wildcard_bp() {
            let kind = WildcardKind::from_u8((wildcard_roll % 3) as u8)
                .unwrap_or(WildcardKind::HealingRain);
            let deadline = ctx.now + self.rules.wildcard_window_secs;
            battle.wildcard = WildcardState {
                active: true,
                kind,
                deadline,
                decision1: Decision::None,
                decision2: Decision::None,
            };
            battle.last_action_at = ctx.now;
            battle.save(self.store, &cmd.battle);
            info!(battle = %cmd.battle, kind = kind.name(), "wildcard triggered");
            self.signals.push(Notification::WildcardTriggered {
                battle: cmd.battle.clone(),
                kind: kind.name().to_owned(),
                deadline,
            });
            return Ok(TurnOutcome::WildcardTriggered { kind, deadline });
        }

        let defender_side = side.other();
        let defender_id = battle.character_of(defender_side).to_owned();
        let mut defender = Character::load(self.store, &defender_id)?;
        let atk_bonus = equipment::loadout(self.store, &attacker)?;
        let def_bonus = equipment::loadout(self.store, &defender)?;

        // Skill resolution. Fires even under stun; only the attack itself is
        // suppressed by stun below.
        let mut damage_mult_bps: u32 = 10_000;
        let mut force_crit = false;
        if cmd.skill_slot != 0 {
            if !(1..=3).contains(&cmd.skill_slot) {
                return Err(ArenaError::InvalidSkillSlot(cmd.skill_slot));
            }
            let idx = cmd.skill_slot as usize - 1;
            let skill_id = attacker.skill_slots[idx];
            if skill_id == 0 {
                return Err(ArenaError::EmptySkillSlot(cmd.skill_slot));
            }
            let spec = skill::spec(skill_id).ok_or(ArenaError::UnknownSkill(skill_id))?;
            let remaining = battle.side(side).cooldowns[idx];
            if remaining > 0 {
                return Err(ArenaError::SkillOnCooldown {
                    slot: cmd.skill_slot,
                    remaining,
                });
            }
            if attacker.energy < spec.energy_cost {
                return Err(ArenaError::InsufficientEnergy {
                    need: spec.energy_cost,
                    have: attacker.energy,
                });
            }
            attacker.energy -= spec.energy_cost;
            battle.side_mut(side).cooldowns[idx] = spec.cooldown;
            match spec.effect {
                SkillEffect::DamageBoost { multiplier_bps } => {
                    damage_mult_bps = scale_bps(u64::from(damage_mult_bps), multiplier_bps) as u32;
                }
                SkillEffect::Heal { max_hp_bps } => {
                    let heal = scale_bps(attacker.max_hp, max_hp_bps);
                    let state = battle.side_mut(side);
                    state.hp = (state.hp + heal).min(attacker.max_hp);
                }
                SkillEffect::Afflict { status, duration } => {
                    battle.side_mut(defender_side).status.apply(status, duration);
                }
                SkillEffect::Empower { status, duration } => {
                    battle.side_mut(side).status.apply(status, duration);
                }
                SkillEffect::ForceCrit => force_crit = true,
                SkillEffect::Overdrive { multiplier_bps } => {
                    battle.side_mut(side).combo = 0;
                    damage_mult_bps = scale_bps(u64::from(damage_mult_bps), multiplier_bps) as u32;
                }
            }
            debug!(battle = %cmd.battle, skill = spec.name, "skill fired");
        }
        if cmd.use_special {
            if attacker.energy < self.rules.special_cost {
                return Err(ArenaError::InsufficientEnergy {
                    need: self.rules.special_cost,
                    have: attacker.energy,
                });
            }
            attacker.energy -= self.rules.special_cost;
            damage_mult_bps =
                scale_bps(u64::from(damage_mult_bps), self.rules.special_multiplier_bps) as u32;
        }

        // Energy regeneration for both sides, capped.
        attacker.energy = attacker
            .energy
            .saturating_add(self.rules.energy_regen)
            .min(self.rules.max_energy);
        defender.energy = defender
            .energy
            .saturating_add(self.rules.energy_regen)
            .min(self.rules.max_energy);

        let resolved_turn = battle.turn;

        // A stunned attacker skips the entire damage phase (DOT included).
        if battle.side(side).status.has(StatusMask::STUN) {
            battle.side_mut(side).status.tick();
            battle.side_mut(defender_side).status.tick();
            tick_cooldowns(&mut battle, side, defender_side);
            battle.turn += 1;
            battle.turn_of = defender_side;
            battle.last_action_at = ctx.now;
            attacker.current_hp = battle.side(side).hp;
            defender.current_hp = battle.side(defender_side).hp;
            attacker.save(self.store, &cmd.character);
            defender.save(self.store, &defender_id);
            battle.save(self.store, &cmd.battle);
            debug!(battle = %cmd.battle, turn = resolved_turn, "attacker stunned");
            self.signals.push(Notification::TurnResolved {
                battle: cmd.battle.clone(),
                turn: resolved_turn,
                damage: 0,
                crit: false,
                dodged: false,
            });
            return Ok(TurnOutcome::Stunned);
        }

        // Damage pipeline: base -> stance -> RAGE -> skill -> crit -> combo
        // -> dodge -> defense -> SHIELD.
        let eff_min = attacker.damage_min + atk_bonus.damage_min;
        let eff_max = (attacker.damage_max + atk_bonus.damage_max).max(eff_min);
        let span = eff_max - eff_min + 1;
        let base_roll = rng::roll_span(
            &mut *self.entropy,
            turn_seed(&cmd.battle, &battle, salt::DAMAGE, ctx.now),
            span,
        );
        let level_bonus = u64::from(attacker.level - 1) * self.rules.level_damage_step;
        let mut damage = eff_min + base_roll + level_bonus;
        damage = scale_bps(damage, cmd.stance.damage_bps(self.rules));
        if battle.side(side).status.has(StatusMask::RAGE) {
            damage = scale_bps(damage, 10_000 + self.rules.rage_bonus_bps);
        }
        damage = scale_bps(damage, damage_mult_bps);

        let crit_bp = (attacker.crit_bp + atk_bonus.crit_bp).min(10_000);
        let crit = if force_crit {
            true
        } else {
            rng::roll_bp(
                &mut *self.entropy,
                turn_seed(&cmd.battle, &battle, salt::CRIT, ctx.now),
            ) < crit_bp
        };
        if crit {
            damage = scale_bps(damage, self.rules.crit_multiplier_bps);
        }
        if battle.side(side).combo >= self.rules.combo_threshold {
            damage = scale_bps(damage, 10_000 + self.rules.combo_bonus_bps);
        }

        let dodge_bp = (defender.dodge_bp + def_bonus.dodge_bp).min(10_000);
        let dodged = rng::roll_bp(
            &mut *self.entropy,
            turn_seed(&cmd.battle, &battle, salt::DODGE, ctx.now),
        ) < dodge_bp;
        let final_damage = if dodged {
            0
        } else {
            let after_defense = damage.saturating_sub(defender.defense + def_bonus.defense);
            if battle.side(defender_side).status.has(StatusMask::SHIELD) {
                scale_bps(after_defense, 10_000 - self.rules.shield_reduction_bps)
            } else {
                after_defense
            }
        };

        // Apply damage and combo bookkeeping.
        {
            let def_state = battle.side_mut(defender_side);
            def_state.hp = def_state.hp.saturating_sub(final_damage);
        }
        if !dodged && final_damage > 0 {
            let atk_state = battle.side_mut(side);
            atk_state.combo = atk_state.combo.saturating_add(1);
            battle.side_mut(defender_side).combo = 0;
        } else {
            battle.side_mut(side).combo = 0;
        }

        // Damage over time on both sides.
        for dot_side in [BattleSide::One, BattleSide::Two] {
            let max_hp = if dot_side == side {
                attacker.max_hp
            } else {
                defender.max_hp
            };
            let status = battle.side(dot_side).status;
            let mut dot = 0u64;
            if status.has(StatusMask::POISON) {
                dot += scale_bps(max_hp, self.rules.poison_bps);
            }
            if status.has(StatusMask::BURN) {
                dot += scale_bps(max_hp, self.rules.burn_bps);
            }
            if dot > 0 {
                let state = battle.side_mut(dot_side);
                state.hp = state.hp.saturating_sub(dot);
            }
        }

        // Housekeeping: durations, cooldowns, turn advance.
        battle.side_mut(side).status.tick();
        battle.side_mut(defender_side).status.tick();
        tick_cooldowns(&mut battle, side, defender_side);
        battle.turn += 1;
        battle.turn_of = defender_side;
        battle.last_action_at = ctx.now;

        // Finish check: the acting side wins a mutual kill.
        let finished = battle.side1.hp == 0 || battle.side2.hp == 0;
        if finished {
            let winner = if battle.side(defender_side).hp == 0 {
                side
            } else {
                defender_side
            };
            battle.finished = true;
            battle.winner = Some(winner);
            info!(
                battle = %cmd.battle,
                winner = winner.as_u8(),
                turn = resolved_turn,
                "battle finished"
            );
            self.signals.push(Notification::BattleFinished {
                battle: cmd.battle.clone(),
                winner: winner.as_u8(),
            });
        }

        attacker.current_hp = battle.side(side).hp;
        defender.current_hp = battle.side(defender_side).hp;
        attacker.save(self.store, &cmd.character);
        defender.save(self.store, &defender_id);
        battle.save(self.store, &cmd.battle);

        debug!(
            battle = %cmd.battle,
            turn = resolved_turn,
            damage = final_damage,
            crit,
            dodged,
            "turn resolved"
        );
        self.signals.push(Notification::TurnResolved {
            battle: cmd.battle.clone(),
            turn: resolved_turn,
            damage: final_damage,
            crit,
            dodged,
        });
        Ok(TurnOutcome::Resolved {
            damage: final_damage,
            crit,
            dodged,
            finished,
        })
    }

    /// Submits one side's wildcard decision. Once both decisions are in, the
    /// effect resolves (only if both accepted) and the sub-state resets.
    /// Returns true when the wildcard resolved with this call.
    ///
    /// # Errors
    ///
    /// No active wildcard, deadline passed, caller not a participant, or a
    /// duplicate decision.
    pub fn decide_wildcard(
        &mut self,
        ctx: &CallContext,
        battle_id: &str,
        accept: bool,
    ) -> ArenaResult<bool> {
        let mut battle = Battle::load(self.store, battle_id)?;
        if !battle.wildcard.active {
            return Err(ArenaError::WildcardNotActive);
        }
        if ctx.now > battle.wildcard.deadline {
            return Err(ArenaError::DecisionDeadlinePassed);
        }
        let side = if ctx.caller == battle.owner1 {
            BattleSide::One
        } else if ctx.caller == battle.owner2 {
            BattleSide::Two
        } else {
            return Err(ArenaError::NotOwner {
                entity: battle_id.to_owned(),
                caller: ctx.caller.to_string(),
            });
        };
        let slot = match side {
            BattleSide::One => &mut battle.wildcard.decision1,
            BattleSide::Two => &mut battle.wildcard.decision2,
        };
        if *slot != Decision::None {
            return Err(ArenaError::AlreadyDecided);
        }
        *slot = if accept {
            Decision::Accept
        } else {
            Decision::Decline
        };
        self.signals.push(Notification::WildcardDecided {
            battle: battle_id.to_owned(),
            side: side.as_u8(),
            accepted: accept,
        });

        let both_in = battle.wildcard.decision1 != Decision::None
            && battle.wildcard.decision2 != Decision::None;
        if both_in {
            let kind = battle.wildcard.kind;
            let activated = battle.wildcard.decision1 == Decision::Accept
                && battle.wildcard.decision2 == Decision::Accept;
            if activated {
                self.apply_wildcard_effect(&mut battle, kind)?;
            }
            battle.wildcard = WildcardState::default();
            info!(battle = battle_id, kind = kind.name(), activated, "wildcard resolved");
            self.signals.push(Notification::WildcardResolved {
                battle: battle_id.to_owned(),
                kind: kind.name().to_owned(),
                activated,
            });
        }
        battle.last_action_at = ctx.now;
        battle.save(self.store, battle_id);
        Ok(both_in)
    }

    /// Applies a both-accepted wildcard effect symmetrically.
    fn apply_wildcard_effect(&mut self, battle: &mut Battle, kind: WildcardKind) -> ArenaResult<()> {
        let char1_id = battle.char1.clone();
        let char2_id = battle.char2.clone();
        let mut c1 = Character::load(self.store, &char1_id)?;
        let mut c2 = Character::load(self.store, &char2_id)?;
        for (battle_side, character, id) in [
            (BattleSide::One, &mut c1, &char1_id),
            (BattleSide::Two, &mut c2, &char2_id),
        ] {
            let state = battle.side_mut(battle_side);
            match kind {
                WildcardKind::HealingRain => {
                    let heal = scale_bps(character.max_hp, self.rules.wildcard_heal_bps);
                    state.hp = (state.hp + heal).min(character.max_hp);
                }
                WildcardKind::AdrenalineRush => {
                    character.energy = character
                        .energy
                        .saturating_add(self.rules.wildcard_energy)
                        .min(self.rules.max_energy);
                }
                WildcardKind::BloodPrice => {
                    let price = scale_bps(character.max_hp, self.rules.wildcard_price_bps);
                    state.hp = state.hp.saturating_sub(price).max(1);
                }
            }
            character.current_hp = state.hp;
            character.save(self.store, id);
        }
        Ok(())
    }

    /// Resolves an overdue wildcard: missing decisions count as decline, so
    /// the effect never fires. Returns true if a wildcard was expired.
    ///
    /// # Errors
    ///
    /// Unknown battle; corrupt records propagate.
    pub fn expire_wildcard(&mut self, now: u64, battle_id: &str) -> ArenaResult<bool> {
        let mut battle = Battle::load(self.store, battle_id)?;
        if !battle.wildcard.active || now <= battle.wildcard.deadline {
            return Ok(false);
        }
        battle.wildcard = WildcardState::default();
        battle.last_action_at = now;
        battle.save(self.store, battle_id);
        info!(battle = battle_id, "wildcard expired");
        self.signals.push(Notification::WildcardExpired {
            battle: battle_id.to_owned(),
        });
        Ok(true)
    }

    /// Forfeits a battle whose side-to-act has been silent past the stall
    /// timeout; that side loses. Returns true if the battle was forfeited.
    ///
    /// # Errors
    ///
    /// Unknown battle; corrupt records propagate.
    pub fn forfeit_if_stalled(&mut self, now: u64, battle_id: &str) -> ArenaResult<bool> {
        let mut battle = Battle::load(self.store, battle_id)?;
        if battle.finished {
            return Ok(false);
        }
        let idle_since = battle.last_action_at.max(battle.start_time);
        if now.saturating_sub(idle_since) <= self.rules.stall_timeout_secs {
            return Ok(false);
        }
        let winner = battle.turn_of.other();
        battle.finished = true;
        battle.winner = Some(winner);
        battle.last_action_at = now;
        battle.save(self.store, battle_id);
        info!(battle = battle_id, winner = winner.as_u8(), "battle forfeited");
        self.signals.push(Notification::BattleForfeited {
            battle: battle_id.to_owned(),
            winner: winner.as_u8(),
        });
        self.signals.push(Notification::BattleFinished {
            battle: battle_id.to_owned(),
            winner: winner.as_u8(),
        });
        Ok(true)
    }

    /// One-shot post-battle accounting: win/loss counters, rating, xp, full
    /// heals, the finished-battle counter and the authoritative settlement
    /// signal. Touches no betting pool.
    ///
    /// # Errors
    ///
    /// Not finished yet, or already finalized.
    pub fn finalize(&mut self, battle_id: &str) -> ArenaResult<()> {
        let mut battle = Battle::load(self.store, battle_id)?;
        let Some(winner) = battle.winner.filter(|_| battle.finished) else {
            return Err(ArenaError::BattleNotFinished(battle_id.to_owned()));
        };
        if battle.finalized {
            return Err(ArenaError::AlreadyFinalized(battle_id.to_owned()));
        }

        let winner_id = battle.character_of(winner).to_owned();
        let loser_id = battle.character_of(winner.other()).to_owned();
        let mut winner_char = Character::load(self.store, &winner_id)?;
        let mut loser_char = Character::load(self.store, &loser_id)?;

        winner_char.wins += 1;
        winner_char.rating += self.rules.rating_delta;
        winner_char.gain_xp(self.rules.xp_win, self.rules);
        winner_char.heal_full();

        loser_char.losses += 1;
        loser_char.rating = loser_char.rating.saturating_sub(self.rules.rating_delta);
        loser_char.gain_xp(self.rules.xp_loss, self.rules);
        loser_char.heal_full();

        winner_char.save(self.store, &winner_id);
        loser_char.save(self.store, &loser_id);

        battle.finalized = true;
        battle.save(self.store, battle_id);
        store::bump_counter(self.store, keys::BATTLES_FINISHED)?;

        info!(battle = battle_id, winner = winner.as_u8(), "battle finalized");
        self.signals.push(Notification::BattleFinalized {
            battle: battle_id.to_owned(),
            winner: winner.as_u8(),
        });
        Ok(())
    }
}

/// Decrements every skill cooldown on both sides, flooring at zero.
fn tick_cooldowns(battle: &mut Battle, side: BattleSide, other: BattleSide) {
    for s in [side, other] {
        for cd in &mut battle.side_mut(s).cooldowns {
            *cd = cd.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::CharacterClass;
    use crate::registry::CharacterRegistry;
    use crate::rng::ScriptedDice;
    use colosseum_core::MemoryStore;

    const NOW: u64 = 1_700_000_000;

    fn ctx(caller: &str) -> CallContext {
        CallContext::new(caller, NOW)
    }

    /// Scripted rolls for one plain turn: wildcard (miss), damage, crit
    /// (miss), dodge (miss).
    fn plain_turn_rolls(damage_roll: u64) -> Vec<u64> {
        vec![9_999, damage_roll, 9_999, 9_999]
    }

    fn setup() -> (MemoryStore, BattleRules) {
        let mut store = MemoryStore::new();
        let rules = BattleRules::default();
        let mut reg = CharacterRegistry::new(&mut store, &rules);
        reg.create_character(&ctx("alice"), "c1", CharacterClass::Warrior, "Maximus")
            .unwrap();
        reg.create_character(&ctx("bob"), "c2", CharacterClass::Tank, "Wall")
            .unwrap();
        (store, rules)
    }

    fn turn(character: &str) -> TurnCommand {
        TurnCommand {
            battle: "b1".into(),
            character: character.into(),
            stance: Stance::Balanced,
            use_special: false,
            skill_slot: 0,
        }
    }

    #[test]
    fn test_turn_order_enforced() {
        let (mut store, rules) = setup();
        let mut dice = ScriptedDice::new(plain_turn_rolls(0));
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();

        // side 2 may not act first
        assert!(matches!(
            engine.execute_turn(&ctx("bob"), &turn("c2")),
            Err(ArenaError::NotYourTurn)
        ));
        // side 1 may not be driven by bob
        assert!(matches!(
            engine.execute_turn(&ctx("bob"), &turn("c1")),
            Err(ArenaError::NotOwner { .. })
        ));
        engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();

        let battle = Battle::load(&store, "b1").unwrap();
        assert_eq!(battle.turn, 1);
        assert_eq!(battle.turn_of, BattleSide::Two);
    }

    #[test]
    fn test_plain_hit_damage_math() {
        let (mut store, rules) = setup();
        // damage roll 0 -> base = min 8, level 1, no modifiers; Tank defense 5
        let mut dice = ScriptedDice::new(plain_turn_rolls(0));
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();
        let outcome = engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Resolved {
                damage: 3, // 8 - 5 defense
                crit: false,
                dodged: false,
                finished: false,
            }
        );
        let battle = Battle::load(&store, "b1").unwrap();
        assert_eq!(battle.side2.hp, 150 - 3);
        assert_eq!(battle.side1.combo, 1);
        // energy regenerated but capped at 100
        let c1 = Character::load(&store, "c1").unwrap();
        assert_eq!(c1.energy, 100);
    }

    #[test]
    fn test_stunned_attacker_skips_damage() {
        let (mut store, rules) = setup();
        // wildcard miss only; the stunned path draws no damage rolls
        let mut dice = ScriptedDice::new(vec![9_999]);
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();

        // stun side 1 by hand, then let it act
        let mut battle = Battle::load(engine.store, "b1").unwrap();
        battle.side1.status.apply(StatusMask::STUN, 1);
        battle.save(engine.store, "b1");

        let outcome = engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();
        assert_eq!(outcome, TurnOutcome::Stunned);

        let battle = Battle::load(&store, "b1").unwrap();
        assert_eq!(battle.side1.hp, 120);
        assert_eq!(battle.side2.hp, 150);
        assert_eq!(battle.turn, 1);
        assert_eq!(battle.turn_of, BattleSide::Two);
        assert_eq!(battle.side1.status.turns, 0);
        assert!(battle.side1.status.mask.is_empty());
    }

    #[test]
    fn test_wildcard_protocol_both_accept() {
        let (mut store, rules) = setup();
        // roll 0 < Warrior threshold 400 -> wildcard kind 0 (HealingRain)
        let mut dice = ScriptedDice::new(vec![0]);
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();

        // damage side 1 so the heal is visible
        let mut battle = Battle::load(engine.store, "b1").unwrap();
        battle.side1.hp = 60;
        battle.save(engine.store, "b1");

        let outcome = engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::WildcardTriggered {
                kind: WildcardKind::HealingRain,
                ..
            }
        ));
        // turns are suspended while pending
        assert!(matches!(
            engine.execute_turn(&ctx("alice"), &turn("c1")),
            Err(ArenaError::WildcardPending)
        ));

        assert!(!engine.decide_wildcard(&ctx("alice"), "b1", true).unwrap());
        assert!(matches!(
            engine.decide_wildcard(&ctx("alice"), "b1", true),
            Err(ArenaError::AlreadyDecided)
        ));
        assert!(engine.decide_wildcard(&ctx("bob"), "b1", true).unwrap());

        let battle = Battle::load(&store, "b1").unwrap();
        assert!(!battle.wildcard.active);
        // HealingRain: +15% of 120 = 18
        assert_eq!(battle.side1.hp, 78);
        // no wildcard may trigger while one is active - and none is now
        assert_eq!(battle.wildcard.decision1, Decision::None);
    }

    #[test]
    fn test_wildcard_decline_blocks_effect() {
        let (mut store, rules) = setup();
        let mut dice = ScriptedDice::new(vec![1]); // kind 1 (AdrenalineRush)
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();
        engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();

        // drain energy to observe (lack of) the grant
        let mut c1 = Character::load(engine.store, "c1").unwrap();
        c1.energy = 10;
        c1.save(engine.store, "c1");

        engine.decide_wildcard(&ctx("alice"), "b1", true).unwrap();
        engine.decide_wildcard(&ctx("bob"), "b1", false).unwrap();

        let c1 = Character::load(&store, "c1").unwrap();
        assert_eq!(c1.energy, 10);
        let battle = Battle::load(&store, "b1").unwrap();
        assert!(!battle.wildcard.active);
    }

    #[test]
    fn test_wildcard_deadline_rejects_late_decision() {
        let (mut store, rules) = setup();
        let mut dice = ScriptedDice::new(vec![0]);
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();
        engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();

        let late = CallContext::new("alice", NOW + rules.wildcard_window_secs + 1);
        assert!(matches!(
            engine.decide_wildcard(&late, "b1", true),
            Err(ArenaError::DecisionDeadlinePassed)
        ));

        // the sweep path clears it with no effect
        assert!(engine
            .expire_wildcard(NOW + rules.wildcard_window_secs + 1, "b1")
            .unwrap());
        let battle = Battle::load(&store, "b1").unwrap();
        assert!(!battle.wildcard.active);
    }

    #[test]
    fn test_finish_and_finalize_once() {
        let (mut store, rules) = setup();
        let mut dice = ScriptedDice::new(plain_turn_rolls(0));
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();

        // reduce side 2 to 1 hp so the next hit kills
        let mut battle = Battle::load(engine.store, "b1").unwrap();
        battle.side2.hp = 1;
        battle.save(engine.store, "b1");

        let outcome = engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Resolved { finished: true, .. }
        ));
        let battle = Battle::load(engine.store, "b1").unwrap();
        assert!(battle.finished);
        assert_eq!(battle.winner, Some(BattleSide::One));

        // turns after finish rejected
        assert!(matches!(
            engine.execute_turn(&ctx("bob"), &turn("c2")),
            Err(ArenaError::BattleFinished(_))
        ));

        engine.finalize("b1").unwrap();
        assert!(matches!(
            engine.finalize("b1"),
            Err(ArenaError::AlreadyFinalized(_))
        ));

        let c1 = Character::load(&store, "c1").unwrap();
        let c2 = Character::load(&store, "c2").unwrap();
        assert_eq!((c1.wins, c1.losses), (1, 0));
        assert_eq!((c2.wins, c2.losses), (0, 1));
        assert_eq!(c1.current_hp, c1.max_hp);
        assert_eq!(c2.current_hp, c2.max_hp);
        assert_eq!(c1.rating, 1_020);
        assert_eq!(c2.rating, 980);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let run = || {
            let (mut store, rules) = setup();
            let mut dice = ScriptedDice::new(vec![
                9_999, 3, 9_999, 9_999, // turn 1
                9_999, 1, 0, 9_999, // turn 2 (crit roll 0 -> crit)
                9_999, 5, 9_999, 9_999, // turn 3
            ]);
            let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
            engine
                .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
                .unwrap();
            engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();
            engine.execute_turn(&ctx("bob"), &turn("c2")).unwrap();
            engine.execute_turn(&ctx("alice"), &turn("c1")).unwrap();
            Battle::load(&store, "b1").unwrap().encode()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_forfeit_stalled_battle() {
        let (mut store, rules) = setup();
        let mut dice = ScriptedDice::new(vec![]);
        let mut engine = BattleEngine::new(&mut store, &mut dice, &rules);
        engine
            .create_battle(&ctx("alice"), "b1", "c1", "c2", NOW)
            .unwrap();

        assert!(!engine.forfeit_if_stalled(NOW + 10, "b1").unwrap());
        assert!(engine
            .forfeit_if_stalled(NOW + rules.stall_timeout_secs + 1, "b1")
            .unwrap());
        let battle = Battle::load(&store, "b1").unwrap();
        assert!(battle.finished);
        // side 1 was to act and stalled; side 2 wins
        assert_eq!(battle.winner, Some(BattleSide::Two));
    }
}
