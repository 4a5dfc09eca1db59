//! # Battle Rules
//!
//! Tunable constants for turn resolution and progression, loadable from an
//! external TOML file. Defaults reproduce the canonical balance; tests can
//! construct tweaked instances without touching any global.

use serde::{Deserialize, Serialize};

/// Tunable battle and progression constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleRules {
    /// Energy regenerated by both sides each turn.
    pub energy_regen: u8,
    /// Energy ceiling.
    pub max_energy: u8,
    /// Energy cost of the class special attack.
    pub special_cost: u8,
    /// Damage multiplier of the class special (basis points).
    pub special_multiplier_bps: u32,
    /// Outgoing damage multiplier for the aggressive stance (basis points).
    pub stance_aggressive_bps: u32,
    /// Outgoing damage multiplier for the defensive stance (basis points).
    pub stance_defensive_bps: u32,
    /// RAGE outgoing-damage bonus (basis points on top of 10000).
    pub rage_bonus_bps: u32,
    /// SHIELD incoming-damage reduction (basis points subtracted from 10000).
    pub shield_reduction_bps: u32,
    /// Combo streak required before the combo bonus applies.
    pub combo_threshold: u8,
    /// Combo damage bonus (basis points on top of 10000).
    pub combo_bonus_bps: u32,
    /// Critical hit multiplier (basis points).
    pub crit_multiplier_bps: u32,
    /// Poison damage per turn as a fraction of max HP (basis points).
    pub poison_bps: u32,
    /// Burn damage per turn as a fraction of max HP (basis points).
    pub burn_bps: u32,
    /// Per-level flat damage bonus applied in the damage formula.
    pub level_damage_step: u64,
    /// Wildcard decision window in seconds.
    pub wildcard_window_secs: u64,
    /// HealingRain heal as a fraction of max HP (basis points).
    pub wildcard_heal_bps: u32,
    /// AdrenalineRush energy grant.
    pub wildcard_energy: u8,
    /// BloodPrice cost as a fraction of max HP (basis points).
    pub wildcard_price_bps: u32,
    /// Seconds of inactivity before a battle can be forfeited.
    pub stall_timeout_secs: u64,
    /// Xp cost of one stat upgrade.
    pub upgrade_cost_xp: u64,
    /// Xp cost of learning a skill.
    pub learn_cost_xp: u64,
    /// Max HP gained per level.
    pub level_hp_bonus: u64,
    /// Damage min/max gained per level.
    pub level_damage_bonus: u64,
    /// Xp granted to the winner at finalize.
    pub xp_win: u64,
    /// Xp granted to the loser at finalize.
    pub xp_loss: u64,
    /// Matchmaking rating swing per finalized battle.
    pub rating_delta: u32,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            energy_regen: 10,
            max_energy: 100,
            special_cost: 30,
            special_multiplier_bps: 15_000,
            stance_aggressive_bps: 12_000,
            stance_defensive_bps: 8_000,
            rage_bonus_bps: 5_000,
            shield_reduction_bps: 3_000,
            combo_threshold: 3,
            combo_bonus_bps: 2_000,
            crit_multiplier_bps: 20_000,
            poison_bps: 500,
            burn_bps: 800,
            level_damage_step: 2,
            wildcard_window_secs: 120,
            wildcard_heal_bps: 1_500,
            wildcard_energy: 25,
            wildcard_price_bps: 1_000,
            stall_timeout_secs: 3_600,
            upgrade_cost_xp: 100,
            learn_cost_xp: 150,
            level_hp_bonus: 5,
            level_damage_bonus: 1,
            xp_win: 60,
            xp_loss: 25,
            rating_delta: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_canonical_balance() {
        let rules = BattleRules::default();
        assert_eq!(rules.energy_regen, 10);
        assert_eq!(rules.rage_bonus_bps, 5_000);
        assert_eq!(rules.shield_reduction_bps, 3_000);
        assert_eq!(rules.combo_threshold, 3);
        assert_eq!(rules.poison_bps, 500);
        assert_eq!(rules.burn_bps, 800);
        assert_eq!(rules.upgrade_cost_xp, 100);
    }
}
