//! # Character Record
//!
//! Persistent character state plus progression math. The record encoding is
//! a versioned, ordered field sequence (identity strings, then numerics in
//! declaration order, then flags/sets); see the core codec for the contract.

use colosseum_core::{
    decode_record, keys, Address, DecodeError, DecodeResult, EntityStore, RecordReader,
    RecordWriter, StoreError,
};

use crate::class::CharacterClass;
use crate::error::{ArenaError, ArenaResult};
use crate::rules::BattleRules;
use crate::skill::SkillSet;

/// Character record version.
pub const RECORD_VERSION: u8 = 1;

/// Crit chance ceiling reachable through upgrades (basis points).
pub const CRIT_CAP_BP: u32 = 5_000;
/// Dodge chance ceiling reachable through upgrades (basis points).
pub const DODGE_CAP_BP: u32 = 4_000;

/// Fixed per-class starting stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseStats {
    /// Starting max HP.
    pub max_hp: u64,
    /// Minimum base damage.
    pub damage_min: u64,
    /// Maximum base damage.
    pub damage_max: u64,
    /// Crit chance in basis points.
    pub crit_bp: u32,
    /// Dodge chance in basis points.
    pub dodge_bp: u32,
    /// Flat damage reduction.
    pub defense: u64,
}

/// Upgradeable stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    /// +10 max HP (and +10 current).
    Hp,
    /// +2 minimum / +3 maximum damage.
    Damage,
    /// +5% crit, capped at 50%.
    Crit,
    /// +5% dodge, capped at 40%.
    Dodge,
}

impl StatKind {
    /// Stat name for signals.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hp => "hp",
            Self::Damage => "damage",
            Self::Crit => "crit",
            Self::Dodge => "dodge",
        }
    }
}

/// A playable character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Character {
    /// Owning identity.
    pub owner: Address,
    /// Display name.
    pub name: String,
    /// Class, fixed at creation.
    pub class: CharacterClass,
    /// Current level (starts at 1).
    pub level: u32,
    /// Unspent xp.
    pub xp: u64,
    /// Max HP.
    pub max_hp: u64,
    /// Current HP. Invariant: `current_hp <= max_hp`.
    pub current_hp: u64,
    /// Minimum base damage.
    pub damage_min: u64,
    /// Maximum base damage.
    pub damage_max: u64,
    /// Crit chance (basis points).
    pub crit_bp: u32,
    /// Dodge chance (basis points).
    pub dodge_bp: u32,
    /// Flat damage reduction.
    pub defense: u64,
    /// Finalized battles won.
    pub wins: u32,
    /// Finalized battles lost.
    pub losses: u32,
    /// Matchmaking rating.
    pub rating: u32,
    /// Equipment slot references (weapon, armor, accessory); "" = empty.
    pub equipment: [String; 3],
    /// Equipped skill slots; 0 = empty.
    pub skill_slots: [u8; 3],
    /// Learned-skill bitset.
    pub learned: SkillSet,
    /// Current energy. Invariant: `energy <= 100`.
    pub energy: u8,
}

impl Character {
    /// Creates a fresh character from its class base-stat table.
    #[must_use]
    pub fn new(owner: Address, name: String, class: CharacterClass) -> Self {
        let base = class.base_stats();
        Self {
            owner,
            name,
            class,
            level: 1,
            xp: 0,
            max_hp: base.max_hp,
            current_hp: base.max_hp,
            damage_min: base.damage_min,
            damage_max: base.damage_max,
            crit_bp: base.crit_bp,
            dodge_bp: base.dodge_bp,
            defense: base.defense,
            wins: 0,
            losses: 0,
            rating: 1_000,
            equipment: [String::new(), String::new(), String::new()],
            skill_slots: [0, 0, 0],
            learned: SkillSet::EMPTY,
            energy: 100,
        }
    }

    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(self.owner.as_str())
            .str(&self.name)
            .u8(self.class.as_u8())
            .u32(self.level)
            .u64(self.xp)
            .u64(self.max_hp)
            .u64(self.current_hp)
            .u64(self.damage_min)
            .u64(self.damage_max)
            .u32(self.crit_bp)
            .u32(self.dodge_bp)
            .u64(self.defense)
            .u32(self.wins)
            .u32(self.losses)
            .u32(self.rating);
        for slot in &self.equipment {
            w.str(slot);
        }
        for slot in self.skill_slots {
            w.u8(slot);
        }
        w.u32(self.learned.bits()).u8(self.energy);
        w.finish()
    }

    /// Decodes a record previously produced by [`Character::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, Self::decode_fields)
    }

    fn decode_fields(r: &mut RecordReader<'_>) -> DecodeResult<Self> {
        let owner = Address::new(r.str()?);
        let name = r.str()?;
        let class_byte = r.u8()?;
        let class = CharacterClass::from_u8(class_byte)
            .ok_or_else(|| DecodeError(format!("invalid class byte {class_byte}")))?;
        Ok(Self {
            owner,
            name,
            class,
            level: r.u32()?,
            xp: r.u64()?,
            max_hp: r.u64()?,
            current_hp: r.u64()?,
            damage_min: r.u64()?,
            damage_max: r.u64()?,
            crit_bp: r.u32()?,
            dodge_bp: r.u32()?,
            defense: r.u64()?,
            wins: r.u32()?,
            losses: r.u32()?,
            rating: r.u32()?,
            equipment: [r.str()?, r.str()?, r.str()?],
            skill_slots: [r.u8()?, r.u8()?, r.u8()?],
            learned: SkillSet::from_bits(r.u32()?),
            energy: r.u8()?,
        })
    }

    /// Loads a character by id.
    ///
    /// # Errors
    ///
    /// `ArenaError::UnknownCharacter` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(store: &S, id: &str) -> ArenaResult<Self> {
        let key = keys::character(id);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(ArenaError::UnknownCharacter(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the character under its id.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S, id: &str) {
        store.set(&keys::character(id), self.encode());
    }

    /// Rejects callers other than the owner.
    ///
    /// # Errors
    ///
    /// `ArenaError::NotOwner` on a mismatch.
    pub fn require_owner(&self, id: &str, caller: &Address) -> ArenaResult<()> {
        if &self.owner == caller {
            Ok(())
        } else {
            Err(ArenaError::NotOwner {
                entity: id.to_owned(),
                caller: caller.to_string(),
            })
        }
    }

    /// Adds xp and auto-levels while `xp >= level * 200`, carrying the
    /// remainder forward. Each level grants flat stat bumps. Returns the
    /// level after levelling.
    pub fn gain_xp(&mut self, amount: u64, rules: &BattleRules) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        loop {
            let threshold = u64::from(self.level) * 200;
            if self.xp < threshold {
                break;
            }
            self.xp -= threshold;
            self.level += 1;
            self.max_hp += rules.level_hp_bonus;
            self.current_hp = (self.current_hp + rules.level_hp_bonus).min(self.max_hp);
            self.damage_min += rules.level_damage_bonus;
            self.damage_max += rules.level_damage_bonus;
        }
        self.level
    }

    /// Spends xp on one stat upgrade.
    ///
    /// # Errors
    ///
    /// `InsufficientXp` below the upgrade cost; `StatCapped` when crit/dodge
    /// sit at their ceilings.
    pub fn upgrade(&mut self, stat: StatKind, rules: &BattleRules) -> ArenaResult<()> {
        if self.xp < rules.upgrade_cost_xp {
            return Err(ArenaError::InsufficientXp {
                need: rules.upgrade_cost_xp,
                have: self.xp,
            });
        }
        match stat {
            StatKind::Hp => {
                self.max_hp += 10;
                self.current_hp = (self.current_hp + 10).min(self.max_hp);
            }
            StatKind::Damage => {
                self.damage_min += 2;
                self.damage_max += 3;
            }
            StatKind::Crit => {
                if self.crit_bp >= CRIT_CAP_BP {
                    return Err(ArenaError::StatCapped("crit".to_owned()));
                }
                self.crit_bp = (self.crit_bp + 500).min(CRIT_CAP_BP);
            }
            StatKind::Dodge => {
                if self.dodge_bp >= DODGE_CAP_BP {
                    return Err(ArenaError::StatCapped("dodge".to_owned()));
                }
                self.dodge_bp = (self.dodge_bp + 500).min(DODGE_CAP_BP);
            }
        }
        self.xp -= rules.upgrade_cost_xp;
        Ok(())
    }

    /// Restores full HP.
    pub fn heal_full(&mut self) {
        self.current_hp = self.max_hp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warrior() -> Character {
        Character::new(Address::new("alice"), "Maximus".into(), CharacterClass::Warrior)
    }

    #[test]
    fn test_new_warrior_matches_class_table() {
        let c = warrior();
        assert_eq!(c.max_hp, 120);
        assert_eq!(c.current_hp, 120);
        assert_eq!(c.damage_min, 8);
        assert_eq!(c.damage_max, 15);
        assert_eq!(c.crit_bp, 1500);
        assert_eq!(c.dodge_bp, 0);
        assert_eq!(c.level, 1);
        assert_eq!(c.energy, 100);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut c = warrior();
        c.learned.insert(3);
        c.skill_slots = [3, 0, 0];
        c.equipment[0] = "sword1".into();
        c.energy = 70;

        let bytes = c.encode();
        let back = Character::decode("character:c1", &bytes).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_auto_level_rolls_remainder() {
        let rules = BattleRules::default();
        let mut c = warrior();
        // level 1 threshold 200: 450 xp levels once, 250 carries forward
        // (below the level 2 threshold of 400)
        c.gain_xp(450, &rules);
        assert_eq!(c.level, 2);
        assert_eq!(c.xp, 250);
        assert_eq!(c.max_hp, 125);
        assert_eq!(c.damage_min, 9);

        // 150 more brings xp to 400 = level 2 threshold
        c.gain_xp(150, &rules);
        assert_eq!(c.level, 3);
        assert_eq!(c.xp, 0);
    }

    #[test]
    fn test_upgrade_costs_and_caps() {
        let rules = BattleRules::default();
        let mut c = warrior();
        assert!(matches!(
            c.upgrade(StatKind::Damage, &rules),
            Err(ArenaError::InsufficientXp { .. })
        ));

        c.xp = 1_000;
        c.upgrade(StatKind::Damage, &rules).unwrap();
        assert_eq!((c.damage_min, c.damage_max), (10, 18));
        assert_eq!(c.xp, 900);

        c.crit_bp = CRIT_CAP_BP;
        assert!(matches!(
            c.upgrade(StatKind::Crit, &rules),
            Err(ArenaError::StatCapped(_))
        ));

        c.upgrade(StatKind::Hp, &rules).unwrap();
        assert_eq!(c.max_hp, 130);
        assert_eq!(c.current_hp, 130);
    }
}
