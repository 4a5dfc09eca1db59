//! # Skill Catalog
//!
//! Fixed skill table: energy cost, cooldown and effect per skill id.
//! Characters carry a learned-skill bitset and three equipable slots; the
//! catalog itself is never persisted.

use crate::status::StatusMask;

/// Skill identifier (1-based; 0 is the empty-slot sentinel).
pub type SkillId = u8;

/// What a skill does when it fires during a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkillEffect {
    /// Multiplies this turn's attack damage (basis points, 10000 = x1).
    DamageBoost {
        /// Damage multiplier in basis points.
        multiplier_bps: u32,
    },
    /// Restores a fraction of max HP to the acting side.
    Heal {
        /// Healed fraction of max HP in basis points.
        max_hp_bps: u32,
    },
    /// Applies a status effect to the defender.
    Afflict {
        /// Effect flag to apply.
        status: StatusMask,
        /// Duration in turns.
        duration: u8,
    },
    /// Applies a status effect to the acting side itself.
    Empower {
        /// Effect flag to apply.
        status: StatusMask,
        /// Duration in turns.
        duration: u8,
    },
    /// This turn's attack crits unconditionally.
    ForceCrit,
    /// Resets the attacker's combo streak in exchange for a damage burst.
    Overdrive {
        /// Damage multiplier in basis points.
        multiplier_bps: u32,
    },
}

/// One catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillSpec {
    /// Skill id (1-based).
    pub id: SkillId,
    /// Display name.
    pub name: &'static str,
    /// Energy deducted when the skill fires.
    pub energy_cost: u8,
    /// Cooldown in turns set on the slot after firing.
    pub cooldown: u8,
    /// The skill's effect.
    pub effect: SkillEffect,
}

/// The fixed skill catalog.
pub const CATALOG: [SkillSpec; 9] = [
    SkillSpec {
        id: 1,
        name: "Power Strike",
        energy_cost: 20,
        cooldown: 2,
        effect: SkillEffect::DamageBoost {
            multiplier_bps: 15_000,
        },
    },
    SkillSpec {
        id: 2,
        name: "Mend",
        energy_cost: 30,
        cooldown: 4,
        effect: SkillEffect::Heal { max_hp_bps: 3_000 },
    },
    SkillSpec {
        id: 3,
        name: "Venom Edge",
        energy_cost: 25,
        cooldown: 3,
        effect: SkillEffect::Afflict {
            status: StatusMask::POISON,
            duration: 3,
        },
    },
    SkillSpec {
        id: 4,
        name: "Skull Bash",
        energy_cost: 35,
        cooldown: 5,
        effect: SkillEffect::Afflict {
            status: StatusMask::STUN,
            duration: 1,
        },
    },
    SkillSpec {
        id: 5,
        name: "Fire Brand",
        energy_cost: 25,
        cooldown: 3,
        effect: SkillEffect::Afflict {
            status: StatusMask::BURN,
            duration: 2,
        },
    },
    SkillSpec {
        id: 6,
        name: "Focused Aim",
        energy_cost: 30,
        cooldown: 4,
        effect: SkillEffect::ForceCrit,
    },
    SkillSpec {
        id: 7,
        name: "Reckless Burst",
        energy_cost: 40,
        cooldown: 6,
        effect: SkillEffect::Overdrive {
            multiplier_bps: 20_000,
        },
    },
    SkillSpec {
        id: 8,
        name: "War Cry",
        energy_cost: 30,
        cooldown: 4,
        effect: SkillEffect::Empower {
            status: StatusMask::RAGE,
            duration: 2,
        },
    },
    SkillSpec {
        id: 9,
        name: "Bulwark",
        energy_cost: 30,
        cooldown: 4,
        effect: SkillEffect::Empower {
            status: StatusMask::SHIELD,
            duration: 3,
        },
    },
];

/// Looks up a skill by id. Returns `None` for id 0 or anything past the
/// catalog.
#[must_use]
pub fn spec(id: SkillId) -> Option<&'static SkillSpec> {
    if id == 0 {
        return None;
    }
    CATALOG.get(id as usize - 1)
}

/// Learned-skill set as a fixed-size bitset over skill ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct SkillSet(u32);

impl SkillSet {
    /// Empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from its persisted bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The persisted bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if the skill is in the set. Id 0 is never contained.
    #[inline]
    #[must_use]
    pub const fn contains(self, id: SkillId) -> bool {
        id != 0 && id < 32 && self.0 & (1 << id) != 0
    }

    /// Adds a skill to the set.
    pub fn insert(&mut self, id: SkillId) {
        if id != 0 && id < 32 {
            self.0 |= 1 << id;
        }
    }

    /// Number of learned skills.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// True if no skill has been learned.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_positional() {
        for (i, s) in CATALOG.iter().enumerate() {
            assert_eq!(s.id as usize, i + 1);
            assert_eq!(spec(s.id), Some(s));
        }
        assert!(spec(0).is_none());
        assert!(spec(CATALOG.len() as u8 + 1).is_none());
    }

    #[test]
    fn test_skill_set_bits() {
        let mut set = SkillSet::EMPTY;
        assert!(set.is_empty());
        set.insert(3);
        set.insert(7);
        assert!(set.contains(3));
        assert!(set.contains(7));
        assert!(!set.contains(1));
        assert!(!set.contains(0));
        assert_eq!(set.len(), 2);
        assert_eq!(SkillSet::from_bits(set.bits()), set);
    }
}
