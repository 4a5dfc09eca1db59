//! # COLOSSEUM Arena
//!
//! Characters, equipment and the battle turn state machine.
//!
//! ## Design Principles
//!
//! 1. **Deterministic resolution** - every roll flows through one pluggable
//!    [`rng::EntropySource`]; a scripted source replays a battle exactly
//! 2. **No floating point** - damage math is integer and basis-point only
//! 3. **Fixed tables** - class stats, skill catalog and equipment bonuses are
//!    compile-time lookup tables, never stored per entity
//! 4. **Store-backed state** - characters and battles live behind the shared
//!    entity store; engines borrow a store handle per call and persist
//!    explicitly
//!
//! The battle state machine is
//! `Created -> Active <-> WildcardPending -> Active -> Finished`, with a
//! one-shot `finalize` that publishes the settlement signal the betting
//! markets consume.

pub mod battle;
pub mod character;
pub mod class;
pub mod engine;
pub mod equipment;
pub mod error;
pub mod registry;
pub mod rng;
pub mod rules;
pub mod skill;
pub mod status;

pub use battle::{Battle, BattleSide, Decision, WildcardKind, WildcardState};
pub use character::{Character, StatKind};
pub use class::CharacterClass;
pub use engine::{BattleEngine, Stance, TurnCommand, TurnOutcome};
pub use equipment::{EquipRarity, Equipment, EquipmentKind, StatBonus};
pub use error::{ArenaError, ArenaResult};
pub use registry::CharacterRegistry;
pub use rng::{ChaChaSource, EntropySource, ScriptedDice, Seed, SipMixer};
pub use rules::BattleRules;
pub use skill::{SkillEffect, SkillId, SkillSet, SkillSpec};
pub use status::{StatusMask, StatusState};
