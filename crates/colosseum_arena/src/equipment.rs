//! # Equipment
//!
//! Admin-minted, owner-transferable items referenced from character slots.
//! Stat bonuses are a pure function of (kind, rarity) at mint time - the
//! record stores no bonus numbers, only the lookup inputs.

use colosseum_core::{
    decode_record, keys, Address, DecodeError, DecodeResult, EntityStore, RecordReader,
    RecordWriter, StoreError,
};

use crate::character::Character;
use crate::error::{ArenaError, ArenaResult};

/// Equipment record version.
pub const RECORD_VERSION: u8 = 1;

/// Equipment kind; determines the character slot it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EquipmentKind {
    /// Slot 0: damage and crit.
    Weapon = 0,
    /// Slot 1: defense.
    Armor = 1,
    /// Slot 2: dodge and crit.
    Accessory = 2,
}

impl EquipmentKind {
    /// Converts from the persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Weapon),
            1 => Some(Self::Armor),
            2 => Some(Self::Accessory),
            _ => None,
        }
    }

    /// Character equipment-slot index for this kind.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }
}

/// Rarity tier. Each tier maps to one fixed bonus row per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum EquipRarity {
    /// Baseline tier.
    Common = 0,
    /// Mid tier.
    Rare = 1,
    /// High tier.
    Epic = 2,
    /// Top tier.
    Legendary = 3,
}

impl EquipRarity {
    /// Converts from the persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Common),
            1 => Some(Self::Rare),
            2 => Some(Self::Epic),
            3 => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// Additive stat bonuses contributed by one item (or a whole loadout).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatBonus {
    /// Added to minimum damage.
    pub damage_min: u64,
    /// Added to maximum damage.
    pub damage_max: u64,
    /// Added to crit chance (basis points).
    pub crit_bp: u32,
    /// Added to dodge chance (basis points).
    pub dodge_bp: u32,
    /// Added to flat defense.
    pub defense: u64,
}

impl StatBonus {
    /// Sums two bonus rows.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            damage_min: self.damage_min + other.damage_min,
            damage_max: self.damage_max + other.damage_max,
            crit_bp: self.crit_bp + other.crit_bp,
            dodge_bp: self.dodge_bp + other.dodge_bp,
            defense: self.defense + other.defense,
        }
    }
}

/// The fixed bonus table: pure in (kind, rarity).
#[must_use]
pub const fn bonus_for(kind: EquipmentKind, rarity: EquipRarity) -> StatBonus {
    let zero = StatBonus {
        damage_min: 0,
        damage_max: 0,
        crit_bp: 0,
        dodge_bp: 0,
        defense: 0,
    };
    match kind {
        EquipmentKind::Weapon => match rarity {
            EquipRarity::Common => StatBonus {
                damage_min: 1,
                damage_max: 2,
                ..zero
            },
            EquipRarity::Rare => StatBonus {
                damage_min: 2,
                damage_max: 4,
                crit_bp: 200,
                ..zero
            },
            EquipRarity::Epic => StatBonus {
                damage_min: 4,
                damage_max: 7,
                crit_bp: 500,
                ..zero
            },
            EquipRarity::Legendary => StatBonus {
                damage_min: 6,
                damage_max: 10,
                crit_bp: 1_000,
                ..zero
            },
        },
        EquipmentKind::Armor => match rarity {
            EquipRarity::Common => StatBonus { defense: 1, ..zero },
            EquipRarity::Rare => StatBonus { defense: 2, ..zero },
            EquipRarity::Epic => StatBonus { defense: 4, ..zero },
            EquipRarity::Legendary => StatBonus { defense: 6, ..zero },
        },
        EquipmentKind::Accessory => match rarity {
            EquipRarity::Common => StatBonus {
                dodge_bp: 100,
                crit_bp: 100,
                ..zero
            },
            EquipRarity::Rare => StatBonus {
                dodge_bp: 300,
                crit_bp: 200,
                ..zero
            },
            EquipRarity::Epic => StatBonus {
                dodge_bp: 600,
                crit_bp: 400,
                ..zero
            },
            EquipRarity::Legendary => StatBonus {
                dodge_bp: 1_000,
                crit_bp: 700,
                ..zero
            },
        },
    }
}

/// An equipment item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equipment {
    /// Owning identity.
    pub owner: Address,
    /// Kind; fixes the character slot.
    pub kind: EquipmentKind,
    /// Rarity tier; fixes the bonus row.
    pub rarity: EquipRarity,
    /// Remaining durability.
    pub durability: u32,
    /// Durability at mint.
    pub max_durability: u32,
    /// Mint time (unix seconds).
    pub created_at: u64,
}

impl Equipment {
    /// Mints a fresh item record.
    #[must_use]
    pub const fn new(owner: Address, kind: EquipmentKind, rarity: EquipRarity, now: u64) -> Self {
        Self {
            owner,
            kind,
            rarity,
            durability: 100,
            max_durability: 100,
            created_at: now,
        }
    }

    /// The item's bonus row from the fixed table.
    #[must_use]
    pub const fn bonus(&self) -> StatBonus {
        bonus_for(self.kind, self.rarity)
    }

    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(self.owner.as_str())
            .u8(self.kind as u8)
            .u8(self.rarity as u8)
            .u32(self.durability)
            .u32(self.max_durability)
            .u64(self.created_at);
        w.finish()
    }

    /// Decodes a record previously produced by [`Equipment::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, |r| Self::decode_fields(r))
    }

    fn decode_fields(r: &mut RecordReader<'_>) -> DecodeResult<Self> {
        let owner = Address::new(r.str()?);
        let kind_byte = r.u8()?;
        let kind = EquipmentKind::from_u8(kind_byte)
            .ok_or_else(|| DecodeError(format!("invalid equipment kind {kind_byte}")))?;
        let rarity_byte = r.u8()?;
        let rarity = EquipRarity::from_u8(rarity_byte)
            .ok_or_else(|| DecodeError(format!("invalid rarity {rarity_byte}")))?;
        Ok(Self {
            owner,
            kind,
            rarity,
            durability: r.u32()?,
            max_durability: r.u32()?,
            created_at: r.u64()?,
        })
    }

    /// Loads an item by id.
    ///
    /// # Errors
    ///
    /// `ArenaError::UnknownEquipment` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(store: &S, id: &str) -> ArenaResult<Self> {
        let key = keys::equipment(id);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(ArenaError::UnknownEquipment(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the item under its id.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S, id: &str) {
        store.set(&keys::equipment(id), self.encode());
    }
}

/// Sums the bonus rows of everything a character has equipped. Empty slots
/// contribute nothing; a dangling reference is a corrupt-state error.
///
/// # Errors
///
/// Propagates store failures for referenced items.
pub fn loadout<S: EntityStore + ?Sized>(store: &S, character: &Character) -> ArenaResult<StatBonus> {
    let mut total = StatBonus::default();
    for id in &character.equipment {
        if id.is_empty() {
            continue;
        }
        total = total.plus(Equipment::load(store, id)?.bonus());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::CharacterClass;
    use colosseum_core::MemoryStore;

    #[test]
    fn test_bonus_is_pure_in_rarity() {
        let a = bonus_for(EquipmentKind::Weapon, EquipRarity::Legendary);
        let b = bonus_for(EquipmentKind::Weapon, EquipRarity::Legendary);
        assert_eq!(a, b);
        assert_eq!(a.damage_min, 6);
        assert_eq!(a.damage_max, 10);
        assert_eq!(a.crit_bp, 1_000);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let item = Equipment::new(
            Address::new("alice"),
            EquipmentKind::Accessory,
            EquipRarity::Epic,
            1_700_000_000,
        );
        let back = Equipment::decode("equipment:e1", &item.encode()).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_loadout_sums_equipped_slots() {
        let mut store = MemoryStore::new();
        let owner = Address::new("alice");
        Equipment::new(owner.clone(), EquipmentKind::Weapon, EquipRarity::Rare, 0)
            .save(&mut store, "w1");
        Equipment::new(owner.clone(), EquipmentKind::Armor, EquipRarity::Epic, 0)
            .save(&mut store, "a1");

        let mut c = Character::new(owner, "Maximus".into(), CharacterClass::Warrior);
        c.equipment[EquipmentKind::Weapon.slot()] = "w1".into();
        c.equipment[EquipmentKind::Armor.slot()] = "a1".into();

        let total = loadout(&store, &c).unwrap();
        assert_eq!(total.damage_min, 2);
        assert_eq!(total.damage_max, 4);
        assert_eq!(total.crit_bp, 200);
        assert_eq!(total.defense, 4);
    }
}
