//! # Status Effects
//!
//! A fixed-size bitmask with named constants instead of string-encoded
//! effect lists: O(1) checks, no parse/format bugs. Each battle side carries
//! one mask plus a shared remaining-duration counter; the mask clears when
//! the duration hits zero.

/// Bitmask of active status effects on one battle side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct StatusMask(u8);

impl StatusMask {
    /// No effects.
    pub const NONE: Self = Self(0);
    /// Attacker skips their damage phase.
    pub const STUN: Self = Self(1);
    /// 5% max-HP damage per turn.
    pub const POISON: Self = Self(1 << 1);
    /// 8% max-HP damage per turn.
    pub const BURN: Self = Self(1 << 2);
    /// +50% outgoing damage.
    pub const RAGE: Self = Self(1 << 3);
    /// -30% incoming damage.
    pub const SHIELD: Self = Self(1 << 4);

    /// Builds a mask from its persisted byte.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// The persisted byte.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the mask with `other`'s flags added.
    #[inline]
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True if no flags are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One side's status effects: active mask + remaining duration in turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusState {
    /// Active effect flags.
    pub mask: StatusMask,
    /// Turns until the mask clears.
    pub turns: u8,
}

impl StatusState {
    /// Applies an effect for `duration` turns. The shared duration counter
    /// extends to the longest active effect.
    pub fn apply(&mut self, effect: StatusMask, duration: u8) {
        self.mask = self.mask.with(effect);
        if duration > self.turns {
            self.turns = duration;
        }
    }

    /// Decrements the duration, clearing the mask at zero.
    pub fn tick(&mut self) {
        if self.turns > 0 {
            self.turns -= 1;
        }
        if self.turns == 0 {
            self.mask = StatusMask::NONE;
        }
    }

    /// True if the given effect is currently active.
    #[inline]
    #[must_use]
    pub const fn has(self, effect: StatusMask) -> bool {
        self.mask.contains(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_flags_are_disjoint() {
        let all = [
            StatusMask::STUN,
            StatusMask::POISON,
            StatusMask::BURN,
            StatusMask::RAGE,
            StatusMask::SHIELD,
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert_eq!(a.bits() & b.bits(), 0);
                }
            }
        }
    }

    #[test]
    fn test_duration_clears_mask() {
        let mut state = StatusState::default();
        state.apply(StatusMask::POISON, 2);
        state.apply(StatusMask::STUN, 1);
        assert!(state.has(StatusMask::POISON));
        assert!(state.has(StatusMask::STUN));
        assert_eq!(state.turns, 2);

        state.tick();
        assert!(state.has(StatusMask::STUN));
        state.tick();
        assert!(state.mask.is_empty());
        assert_eq!(state.turns, 0);
    }
}
