//! # Deterministic Entropy
//!
//! **NOT cryptographically secure - by contract.** Turn resolution needs a
//! replayable pseudo-random stream: the seed is built exactly once per roll
//! from (battle id, turn counter, battle creation time, call timestamp) plus
//! a per-roll salt, and handed whole to a pluggable [`EntropySource`]. Same
//! seed, same value, on every replay.
//!
//! The trait is the seam where a verifiable-random-function collaborator
//! plugs in without touching the turn-resolution algorithm. The shipped
//! sources:
//!
//! - [`SipMixer`] (default): SipHash-2-4 over the seed fields
//! - [`ChaChaSource`]: ChaCha20 stream keyed from the packed seed
//! - [`ScriptedDice`]: queue of pre-chosen values, for tests and replays

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use siphasher::sip::SipHasher24;
use std::collections::VecDeque;
use std::hash::Hasher;

/// Per-roll salts, so one turn's wildcard/damage/crit/dodge rolls draw from
/// distinct points of the stream.
pub mod salt {
    /// Wildcard trigger roll.
    pub const WILDCARD: u64 = 1;
    /// Base damage roll.
    pub const DAMAGE: u64 = 2;
    /// Critical hit roll.
    pub const CRIT: u64 = 3;
    /// Dodge roll.
    pub const DODGE: u64 = 4;
}

/// The full input of one pseudo-random draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seed {
    /// FNV-1a hash of the battle id.
    pub battle: u64,
    /// Turn counter at roll time.
    pub turn: u32,
    /// Battle creation time (unix seconds).
    pub created_at: u64,
    /// The call's observed time (unix seconds).
    pub now: u64,
    /// Per-roll salt from [`salt`].
    pub salt: u64,
}

impl Seed {
    /// Folds the seed into a single u64 for stream-cipher sources.
    #[must_use]
    pub const fn pack(self) -> u64 {
        let mut acc = 0xcbf2_9ce4_8422_2325u64;
        acc = (acc ^ self.battle).wrapping_mul(0x0100_0000_01b3);
        acc = (acc ^ self.turn as u64).wrapping_mul(0x0100_0000_01b3);
        acc = (acc ^ self.created_at).wrapping_mul(0x0100_0000_01b3);
        acc = (acc ^ self.now).wrapping_mul(0x0100_0000_01b3);
        acc = (acc ^ self.salt).wrapping_mul(0x0100_0000_01b3);
        acc
    }
}

/// FNV-1a over an id string, for the `battle` seed component.
#[must_use]
pub fn fnv1a(s: &str) -> u64 {
    let mut acc = 0xcbf2_9ce4_8422_2325u64;
    for b in s.as_bytes() {
        acc = (acc ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3);
    }
    acc
}

/// Seed-in, value-out pseudo-random source.
pub trait EntropySource {
    /// Draws one value for the given seed. Implementations MUST be pure in
    /// the seed (stateless sources) or replayable (scripted sources).
    fn draw(&mut self, seed: Seed) -> u64;
}

/// Default source: SipHash-2-4 of the seed fields under fixed keys.
#[derive(Clone, Copy, Debug)]
pub struct SipMixer {
    key0: u64,
    key1: u64,
}

impl SipMixer {
    /// Creates a mixer with explicit keys.
    #[must_use]
    pub const fn new(key0: u64, key1: u64) -> Self {
        Self { key0, key1 }
    }
}

impl Default for SipMixer {
    fn default() -> Self {
        Self::new(0x434f_4c4f_5353_4555, 0x4d5f_4152_454e_4131)
    }
}

impl EntropySource for SipMixer {
    fn draw(&mut self, seed: Seed) -> u64 {
        let mut hasher = SipHasher24::new_with_keys(self.key0, self.key1);
        hasher.write_u64(seed.battle);
        hasher.write_u32(seed.turn);
        hasher.write_u64(seed.created_at);
        hasher.write_u64(seed.now);
        hasher.write_u64(seed.salt);
        hasher.finish()
    }
}

/// Alternative source: first word of a ChaCha20 stream keyed by the packed
/// seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChaChaSource;

impl EntropySource for ChaChaSource {
    fn draw(&mut self, seed: Seed) -> u64 {
        ChaCha20Rng::seed_from_u64(seed.pack()).next_u64()
    }
}

/// Scripted source for tests: returns queued values in order, then zeros.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    queue: VecDeque<u64>,
}

impl ScriptedDice {
    /// Creates a source that will return `values` in order.
    #[must_use]
    pub fn new(values: Vec<u64>) -> Self {
        Self {
            queue: values.into(),
        }
    }

    /// Appends more values to the script.
    pub fn push(&mut self, value: u64) {
        self.queue.push_back(value);
    }

    /// Values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl EntropySource for ScriptedDice {
    fn draw(&mut self, _seed: Seed) -> u64 {
        self.queue.pop_front().unwrap_or(0)
    }
}

/// Draws a basis-point roll in `0..10000`.
pub fn roll_bp(source: &mut dyn EntropySource, seed: Seed) -> u32 {
    (source.draw(seed) % 10_000) as u32
}

/// Draws a value in `0..span`. A zero span always yields zero.
pub fn roll_span(source: &mut dyn EntropySource, seed: Seed, span: u64) -> u64 {
    if span == 0 {
        0
    } else {
        source.draw(seed) % span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(salt: u64) -> Seed {
        Seed {
            battle: fnv1a("b1"),
            turn: 4,
            created_at: 1_700_000_000,
            now: 1_700_000_600,
            salt,
        }
    }

    #[test]
    fn test_sip_mixer_is_deterministic() {
        let mut a = SipMixer::default();
        let mut b = SipMixer::default();
        assert_eq!(a.draw(seed(salt::CRIT)), b.draw(seed(salt::CRIT)));
        assert_ne!(a.draw(seed(salt::CRIT)), a.draw(seed(salt::DODGE)));
    }

    #[test]
    fn test_chacha_source_is_deterministic() {
        let mut a = ChaChaSource;
        let mut b = ChaChaSource;
        assert_eq!(a.draw(seed(salt::DAMAGE)), b.draw(seed(salt::DAMAGE)));
    }

    #[test]
    fn test_scripted_dice_replays_in_order() {
        let mut dice = ScriptedDice::new(vec![5, 6]);
        assert_eq!(dice.draw(seed(0)), 5);
        assert_eq!(dice.draw(seed(0)), 6);
        assert_eq!(dice.draw(seed(0)), 0);
    }

    #[test]
    fn test_roll_span_inclusive_bound() {
        let mut dice = ScriptedDice::new(vec![15]);
        // span 8 covers a 8..=15 damage range after the caller adds min
        assert_eq!(roll_span(&mut dice, seed(salt::DAMAGE), 8), 7);
        let mut dice = ScriptedDice::new(vec![0]);
        assert_eq!(roll_span(&mut dice, seed(salt::DAMAGE), 0), 0);
    }
}
