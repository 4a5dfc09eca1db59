//! # Arena Error Types
//!
//! Validation failures abort the whole call; the runtime's transaction makes
//! the abort total. Authorization for admin-only operations (xp grants,
//! equipment minting) is enforced at the runtime entry points.

use colosseum_core::StoreError;
use thiserror::Error;

/// Errors that can occur in the character registry and battle engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// No character under this id.
    #[error("unknown character: {0}")]
    UnknownCharacter(String),

    /// A character already exists under this id.
    #[error("character exists: {0}")]
    CharacterExists(String),

    /// No equipment under this id.
    #[error("unknown equipment: {0}")]
    UnknownEquipment(String),

    /// Equipment already exists under this id.
    #[error("equipment exists: {0}")]
    EquipmentExists(String),

    /// No battle under this id.
    #[error("unknown battle: {0}")]
    UnknownBattle(String),

    /// A battle already exists under this id.
    #[error("battle exists: {0}")]
    BattleExists(String),

    /// Caller does not own the entity it tried to act on.
    #[error("not owner of {entity}: {caller}")]
    NotOwner {
        /// Entity id.
        entity: String,
        /// Offending caller.
        caller: String,
    },

    /// A battle needs two distinct characters.
    #[error("a character cannot battle itself")]
    SelfBattle,

    /// The character is not a participant of this battle.
    #[error("character {character} is not in battle {battle}")]
    NotInBattle {
        /// Character id.
        character: String,
        /// Battle id.
        battle: String,
    },

    /// The battle's scheduled start time has not been reached.
    #[error("battle not started until {starts}")]
    BattleNotStarted {
        /// Scheduled start (unix seconds).
        starts: u64,
    },

    /// The battle is already finished.
    #[error("battle finished: {0}")]
    BattleFinished(String),

    /// The battle has not finished yet.
    #[error("battle not finished: {0}")]
    BattleNotFinished(String),

    /// Finalize already ran for this battle.
    #[error("battle already finalized: {0}")]
    AlreadyFinalized(String),

    /// It is the other side's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// A wildcard is awaiting decisions; turns are suspended.
    #[error("wildcard pending")]
    WildcardPending,

    /// No wildcard is active on this battle.
    #[error("no active wildcard")]
    WildcardNotActive,

    /// This side already submitted its wildcard decision.
    #[error("wildcard decision already made")]
    AlreadyDecided,

    /// The wildcard decision window has closed.
    #[error("wildcard decision deadline passed")]
    DecisionDeadlinePassed,

    /// Not enough xp for the requested upgrade or skill.
    #[error("insufficient xp: need {need}, have {have}")]
    InsufficientXp {
        /// Xp required.
        need: u64,
        /// Xp available.
        have: u64,
    },

    /// Not enough energy for the requested skill or special.
    #[error("insufficient energy: need {need}, have {have}")]
    InsufficientEnergy {
        /// Energy required.
        need: u8,
        /// Energy available.
        have: u8,
    },

    /// The stat is already at its cap.
    #[error("stat capped: {0}")]
    StatCapped(String),

    /// Unknown skill id.
    #[error("unknown skill: {0}")]
    UnknownSkill(u8),

    /// The character already knows this skill.
    #[error("skill already learned: {0}")]
    SkillAlreadyLearned(u8),

    /// The character has not learned this skill.
    #[error("skill not learned: {0}")]
    SkillNotLearned(u8),

    /// Skill slot index out of range (valid: 1-3).
    #[error("invalid skill slot: {0}")]
    InvalidSkillSlot(u8),

    /// The selected skill slot holds no skill.
    #[error("empty skill slot: {0}")]
    EmptySkillSlot(u8),

    /// The selected skill is still cooling down.
    #[error("skill on cooldown: slot {slot}, {remaining} turns remaining")]
    SkillOnCooldown {
        /// Slot index (1-3).
        slot: u8,
        /// Turns until available.
        remaining: u8,
    },

    /// Store or codec failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
