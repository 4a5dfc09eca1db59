//! # Runtime Configuration
//!
//! Tunable rules loaded once at startup from an external TOML file. Every
//! field defaults to the canonical balance, so a partial (or absent) file is
//! valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use colosseum_arena::BattleRules;

use crate::error::{ColosseumError, ColosseumResult};

/// Top-level runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColosseumConfig {
    /// Battle and progression tunables.
    pub battle: BattleRules,
}

impl ColosseumConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// `ColosseumError::InvalidConfig` on malformed TOML.
    pub fn from_toml_str(raw: &str) -> ColosseumResult<Self> {
        toml::from_str(raw).map_err(|e| ColosseumError::InvalidConfig(e.to_string()))
    }

    /// Loads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// `ColosseumError::InvalidConfig` on an unreadable or malformed file.
    pub fn from_path(path: impl AsRef<Path>) -> ColosseumResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ColosseumError::InvalidConfig(e.to_string()))?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ColosseumConfig::from_toml_str("").unwrap();
        assert_eq!(config, ColosseumConfig::default());
        assert_eq!(config.battle.energy_regen, 10);
    }

    #[test]
    fn test_partial_override() {
        let config = ColosseumConfig::from_toml_str(
            "[battle]\nenergy_regen = 15\nstall_timeout_secs = 600\n",
        )
        .unwrap();
        assert_eq!(config.battle.energy_regen, 15);
        assert_eq!(config.battle.stall_timeout_secs, 600);
        // untouched fields keep their defaults
        assert_eq!(config.battle.combo_threshold, 3);
    }

    #[test]
    fn test_malformed_config_rejected() {
        assert!(matches!(
            ColosseumConfig::from_toml_str("battle = 3"),
            Err(ColosseumError::InvalidConfig(_))
        ));
    }
}
