//! Rule options for the battle engine.
//!
//! Options can be loaded from a JSON file and adjusted one at a time with
//! `setoption`, the same way engine options are set over the text protocol.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// When a leader-substitute card may be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstituteRule {
    /// Any time, in place of a leader.
    Anytime,
    /// Only when no leader could fight in the battle's territory.
    WhenLeaderless,
}

/// Toggles for optional and advanced battle rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Dialed units without spice backing fight at half strength.
    pub spice_support: bool,
    pub substitute_rule: SubstituteRule,
    /// The winner collects spice equal to the value of every leader killed.
    pub leader_kill_payout: bool,
    /// A lasgun meeting a shield destroys both sides.
    pub lasgun_shield_explosion: bool,
    /// The winner decides whether to keep its played weapon and defense.
    pub ask_card_retention: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            spice_support: true,
            substitute_rule: SubstituteRule::Anytime,
            leader_kill_payout: true,
            lasgun_shield_explosion: true,
            ask_card_retention: true,
        }
    }
}

/// Errors raised while loading or changing rule options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

impl RulesConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Sets a single option by name.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue { name: name.to_string(), value: value.to_string() };
        let flag = || value.parse::<bool>().map_err(|_| invalid());
        match name {
            "spice_support" => self.spice_support = flag()?,
            "leader_kill_payout" => self.leader_kill_payout = flag()?,
            "lasgun_shield_explosion" => self.lasgun_shield_explosion = flag()?,
            "ask_card_retention" => self.ask_card_retention = flag()?,
            "substitute_rule" => {
                self.substitute_rule = match value {
                    "anytime" => SubstituteRule::Anytime,
                    "when_leaderless" => SubstituteRule::WhenLeaderless,
                    _ => return Err(invalid()),
                }
            }
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        Ok(())
    }
}
