//! # Battle Record
//!
//! The canonical battle state: two sides, strict turn alternation, wildcard
//! sub-state, per-side status effects, combo counters and skill cooldowns.
//! Exactly one side reaching 0 HP flips `finished`; `finalize` is guarded by
//! its own flag so the settlement signal fires once.

use colosseum_core::{
    decode_record, keys, Address, DecodeError, DecodeResult, EntityStore, RecordReader,
    RecordWriter, StoreError,
};

use crate::error::{ArenaError, ArenaResult};
use crate::status::{StatusMask, StatusState};

/// Battle record version.
pub const RECORD_VERSION: u8 = 1;

/// One of the two battle sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattleSide {
    /// Side 1 (the creator's character).
    One,
    /// Side 2.
    Two,
}

impl BattleSide {
    /// The persisted byte (1 or 2).
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Converts from the persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// The opposing side.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

/// Wildcard event kinds. The effect fires only if both sides accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WildcardKind {
    /// Both sides heal a fraction of max HP.
    HealingRain = 0,
    /// Both sides gain energy.
    AdrenalineRush = 1,
    /// Both sides pay a fraction of max HP (floored at 1).
    BloodPrice = 2,
}

impl WildcardKind {
    /// Converts from the persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::HealingRain),
            1 => Some(Self::AdrenalineRush),
            2 => Some(Self::BloodPrice),
            _ => None,
        }
    }

    /// Kind name for logs and signals.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HealingRain => "HealingRain",
            Self::AdrenalineRush => "AdrenalineRush",
            Self::BloodPrice => "BloodPrice",
        }
    }
}

/// One side's pending wildcard decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Decision {
    /// No decision submitted yet.
    #[default]
    None = 0,
    /// Accepted the wildcard.
    Accept = 1,
    /// Declined the wildcard.
    Decline = 2,
}

impl Decision {
    /// Converts from the persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Accept),
            2 => Some(Self::Decline),
            _ => None,
        }
    }
}

/// The wildcard sub-state: fully absent, or fully resolved before the next
/// trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WildcardState {
    /// Whether a wildcard is awaiting decisions.
    pub active: bool,
    /// The triggered kind (meaningful while active).
    pub kind: WildcardKind,
    /// Decision deadline (unix seconds).
    pub deadline: u64,
    /// Side 1's decision.
    pub decision1: Decision,
    /// Side 2's decision.
    pub decision2: Decision,
}

impl Default for WildcardState {
    fn default() -> Self {
        Self {
            active: false,
            kind: WildcardKind::HealingRain,
            deadline: 0,
            decision1: Decision::None,
            decision2: Decision::None,
        }
    }
}

/// Per-side mutable battle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SideState {
    /// Current HP in this battle.
    pub hp: u64,
    /// Active status effects.
    pub status: StatusState,
    /// Consecutive successful hits.
    pub combo: u8,
    /// Cooldowns for the three skill slots.
    pub cooldowns: [u8; 3],
}

/// A battle between two characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Battle {
    /// Side 1's character id.
    pub char1: String,
    /// Side 2's character id.
    pub char2: String,
    /// Side 1's owner.
    pub owner1: Address,
    /// Side 2's owner.
    pub owner2: Address,
    /// Scheduled start (unix seconds); turns before this are rejected.
    pub start_time: u64,
    /// Creation time (unix seconds); part of every roll seed.
    pub created_at: u64,
    /// Last accepted mutation (unix seconds); drives the stall sweep.
    pub last_action_at: u64,
    /// Turn counter, starting at 0.
    pub turn: u32,
    /// The side whose turn it is.
    pub turn_of: BattleSide,
    /// Set when one side's HP reaches 0.
    pub finished: bool,
    /// Set once `finalize` has run.
    pub finalized: bool,
    /// Winning side, present iff finished.
    pub winner: Option<BattleSide>,
    /// Side 1 state.
    pub side1: SideState,
    /// Side 2 state.
    pub side2: SideState,
    /// Wildcard sub-state.
    pub wildcard: WildcardState,
}

impl Battle {
    /// Creates a battle between two characters with their starting HP.
    #[must_use]
    pub fn new(
        char1: String,
        char2: String,
        owner1: Address,
        owner2: Address,
        hp1: u64,
        hp2: u64,
        start_time: u64,
        now: u64,
    ) -> Self {
        Self {
            char1,
            char2,
            owner1,
            owner2,
            start_time,
            created_at: now,
            last_action_at: now,
            turn: 0,
            turn_of: BattleSide::One,
            finished: false,
            finalized: false,
            winner: None,
            side1: SideState {
                hp: hp1,
                ..SideState::default()
            },
            side2: SideState {
                hp: hp2,
                ..SideState::default()
            },
            wildcard: WildcardState::default(),
        }
    }

    /// The state of one side.
    #[inline]
    #[must_use]
    pub const fn side(&self, side: BattleSide) -> &SideState {
        match side {
            BattleSide::One => &self.side1,
            BattleSide::Two => &self.side2,
        }
    }

    /// Mutable state of one side.
    #[inline]
    pub fn side_mut(&mut self, side: BattleSide) -> &mut SideState {
        match side {
            BattleSide::One => &mut self.side1,
            BattleSide::Two => &mut self.side2,
        }
    }

    /// The character id fighting on `side`.
    #[must_use]
    pub fn character_of(&self, side: BattleSide) -> &str {
        match side {
            BattleSide::One => &self.char1,
            BattleSide::Two => &self.char2,
        }
    }

    /// The owner of `side`.
    #[must_use]
    pub const fn owner_of(&self, side: BattleSide) -> &Address {
        match side {
            BattleSide::One => &self.owner1,
            BattleSide::Two => &self.owner2,
        }
    }

    /// Which side a character id fights on, if any.
    #[must_use]
    pub fn side_of(&self, character: &str) -> Option<BattleSide> {
        if self.char1 == character {
            Some(BattleSide::One)
        } else if self.char2 == character {
            Some(BattleSide::Two)
        } else {
            None
        }
    }

    /// Encodes the record in canonical field order.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new(RECORD_VERSION);
        w.str(&self.char1)
            .str(&self.char2)
            .str(self.owner1.as_str())
            .str(self.owner2.as_str())
            .u64(self.start_time)
            .u64(self.created_at)
            .u64(self.last_action_at)
            .u32(self.turn)
            .u8(self.turn_of.as_u8())
            .bool(self.finished)
            .bool(self.finalized)
            .u8(self.winner.map_or(0, BattleSide::as_u8))
            .u64(self.side1.hp)
            .u64(self.side2.hp)
            .bool(self.wildcard.active)
            .u8(self.wildcard.kind as u8)
            .u64(self.wildcard.deadline)
            .u8(self.wildcard.decision1 as u8)
            .u8(self.wildcard.decision2 as u8)
            .u8(self.side1.status.mask.bits())
            .u8(self.side1.status.turns)
            .u8(self.side2.status.mask.bits())
            .u8(self.side2.status.turns)
            .u8(self.side1.combo)
            .u8(self.side2.combo);
        for cd in self.side1.cooldowns {
            w.u8(cd);
        }
        for cd in self.side2.cooldowns {
            w.u8(cd);
        }
        w.finish()
    }

    /// Decodes a record previously produced by [`Battle::encode`].
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the bytes do not match the field order.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        decode_record(key, bytes, RECORD_VERSION, Self::decode_fields)
    }

    fn decode_fields(r: &mut RecordReader<'_>) -> DecodeResult<Self> {
        let char1 = r.str()?;
        let char2 = r.str()?;
        let owner1 = Address::new(r.str()?);
        let owner2 = Address::new(r.str()?);
        let start_time = r.u64()?;
        let created_at = r.u64()?;
        let last_action_at = r.u64()?;
        let turn = r.u32()?;
        let turn_of_byte = r.u8()?;
        let turn_of = BattleSide::from_u8(turn_of_byte)
            .ok_or_else(|| DecodeError(format!("invalid side byte {turn_of_byte}")))?;
        let finished = r.bool()?;
        let finalized = r.bool()?;
        let winner = match r.u8()? {
            0 => None,
            b => Some(
                BattleSide::from_u8(b)
                    .ok_or_else(|| DecodeError(format!("invalid winner byte {b}")))?,
            ),
        };
        let hp1 = r.u64()?;
        let hp2 = r.u64()?;
        let active = r.bool()?;
        let kind_byte = r.u8()?;
        let kind = WildcardKind::from_u8(kind_byte)
            .ok_or_else(|| DecodeError(format!("invalid wildcard kind {kind_byte}")))?;
        let deadline = r.u64()?;
        let d1_byte = r.u8()?;
        let decision1 = Decision::from_u8(d1_byte)
            .ok_or_else(|| DecodeError(format!("invalid decision byte {d1_byte}")))?;
        let d2_byte = r.u8()?;
        let decision2 = Decision::from_u8(d2_byte)
            .ok_or_else(|| DecodeError(format!("invalid decision byte {d2_byte}")))?;
        let status1 = StatusState {
            mask: StatusMask::from_bits(r.u8()?),
            turns: r.u8()?,
        };
        let status2 = StatusState {
            mask: StatusMask::from_bits(r.u8()?),
            turns: r.u8()?,
        };
        let combo1 = r.u8()?;
        let combo2 = r.u8()?;
        let cds1 = [r.u8()?, r.u8()?, r.u8()?];
        let cds2 = [r.u8()?, r.u8()?, r.u8()?];
        Ok(Self {
            char1,
            char2,
            owner1,
            owner2,
            start_time,
            created_at,
            last_action_at,
            turn,
            turn_of,
            finished,
            finalized,
            winner,
            side1: SideState {
                hp: hp1,
                status: status1,
                combo: combo1,
                cooldowns: cds1,
            },
            side2: SideState {
                hp: hp2,
                status: status2,
                combo: combo2,
                cooldowns: cds2,
            },
            wildcard: WildcardState {
                active,
                kind,
                deadline,
                decision1,
                decision2,
            },
        })
    }

    /// Loads a battle by id.
    ///
    /// # Errors
    ///
    /// `ArenaError::UnknownBattle` if absent; corrupt records propagate.
    pub fn load<S: EntityStore + ?Sized>(store: &S, id: &str) -> ArenaResult<Self> {
        let key = keys::battle(id);
        match store.get(&key) {
            Ok(bytes) => Ok(Self::decode(&key, &bytes)?),
            Err(StoreError::NotFound(_)) => Err(ArenaError::UnknownBattle(id.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists the battle under its id.
    pub fn save<S: EntityStore + ?Sized>(&self, store: &mut S, id: &str) {
        store.set(&keys::battle(id), self.encode());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Battle {
        let mut b = Battle::new(
            "c1".into(),
            "c2".into(),
            Address::new("alice"),
            Address::new("bob"),
            120,
            90,
            1_700_000_000,
            1_699_999_000,
        );
        b.turn = 7;
        b.turn_of = BattleSide::Two;
        b.side1.status.apply(StatusMask::POISON, 2);
        b.side2.combo = 4;
        b.side1.cooldowns = [0, 3, 0];
        b.wildcard = WildcardState {
            active: true,
            kind: WildcardKind::BloodPrice,
            deadline: 1_700_000_500,
            decision1: Decision::Accept,
            decision2: Decision::None,
        };
        b
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let b = sample();
        let back = Battle::decode("battle:b1", &b.encode()).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_side_lookup() {
        let b = sample();
        assert_eq!(b.side_of("c1"), Some(BattleSide::One));
        assert_eq!(b.side_of("c2"), Some(BattleSide::Two));
        assert_eq!(b.side_of("c3"), None);
        assert_eq!(b.owner_of(BattleSide::Two).as_str(), "bob");
        assert_eq!(b.side(BattleSide::Two).combo, 4);
    }
}
