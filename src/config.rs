//! Table and computer-player settings.
//!
//! Every field has a default, so a TOML document only needs the keys it
//! wants to change:
//!
//! ```
//! use holdem_engine::config::TableConfig;
//!
//! let cfg = TableConfig::from_toml_str("raise_unit = 40\n[blinds]\nsmall = 10\nbig = 20\n").unwrap();
//! assert_eq!(cfg.blinds.big, 20);
//! assert_eq!(cfg.starting_stack, 1000);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blinds {
    pub small: u64,
    pub big: u64,
}

impl Default for Blinds {
    fn default() -> Self {
        Self { small: 5, big: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub blinds: Blinds,
    /// Fixed increment for computer raises and the minimum raise size.
    pub raise_unit: u64,
    pub starting_stack: u64,
    /// Upper bound on a computer seat's think delay.
    pub think_cap_ms: u64,
    /// Think budget shared across the table; each seat gets `budget / seats`.
    pub think_budget_ms: u64,
    pub policy: PolicyConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            blinds: Blinds::default(),
            raise_unit: 20,
            starting_stack: 1000,
            think_cap_ms: 500,
            think_budget_ms: 2000,
            policy: PolicyConfig::default(),
        }
    }
}

impl TableConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: TableConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blinds.small == 0 || self.blinds.big == 0 {
            return Err(ConfigError::Invalid("blinds must be positive".into()));
        }
        if self.blinds.big < self.blinds.small {
            return Err(ConfigError::Invalid(format!(
                "big blind {} is below small blind {}",
                self.blinds.big, self.blinds.small
            )));
        }
        if self.raise_unit == 0 {
            return Err(ConfigError::Invalid("raise_unit must be positive".into()));
        }
        self.policy.validate()
    }

    /// Think delay for one computer decision at a table of `seats`.
    pub fn think_time(&self, seats: usize) -> Duration {
        let share = self.think_budget_ms / seats.max(1) as u64;
        Duration::from_millis(share.min(self.think_cap_ms))
    }
}

/// Tuning for the equity estimate and EV policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub trials_pre_river: usize,
    pub trials_river: usize,
    pub flop_damping: f64,
    pub turn_damping: f64,
    /// Per-opponent fold probability for the fixed fold model.
    pub fold_probability: f64,
    pub river_fold_discount: f64,
    pub reraise_base: f64,
    pub reraise_penalty: f64,
    /// Chance of calling instead of taking a top-EV raise.
    pub downgrade_probability: f64,
    /// Raises per hand after which computer seats only call.
    pub raise_cap: u32,
    pub temperature: f64,
    /// Novice seats call below this draw and raise above `novice_raise_above`.
    pub novice_fold_below: f64,
    pub novice_raise_above: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            trials_pre_river: 800,
            trials_river: 3000,
            flop_damping: 0.7,
            turn_damping: 0.85,
            fold_probability: 0.1,
            river_fold_discount: 0.7,
            reraise_base: 0.2,
            reraise_penalty: 1.5,
            downgrade_probability: 0.15,
            raise_cap: 8,
            temperature: 0.7,
            novice_fold_below: 0.0,
            novice_raise_above: 0.9,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials_pre_river == 0 || self.trials_river == 0 {
            return Err(ConfigError::Invalid("trial counts must be positive".into()));
        }
        if self.temperature <= 0.0 {
            return Err(ConfigError::Invalid("temperature must be positive".into()));
        }
        let unit = [
            ("flop_damping", self.flop_damping),
            ("turn_damping", self.turn_damping),
            ("fold_probability", self.fold_probability),
            ("river_fold_discount", self.river_fold_discount),
            ("downgrade_probability", self.downgrade_probability),
        ];
        for (name, v) in unit {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {v}")));
            }
        }
        if self.novice_fold_below > self.novice_raise_above {
            return Err(ConfigError::Invalid(
                "novice_fold_below must not exceed novice_raise_above".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = TableConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, TableConfig::default());
    }

    #[test]
    fn nested_policy_overrides() {
        let cfg = TableConfig::from_toml_str("[policy]\nraise_cap = 3\ntemperature = 0.5\n").unwrap();
        assert_eq!(cfg.policy.raise_cap, 3);
        assert_eq!(cfg.policy.trials_river, 3000);
    }

    #[test]
    fn rejects_inverted_blinds() {
        let err = TableConfig::from_toml_str("[blinds]\nsmall = 20\nbig = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(TableConfig::from_toml_str("raise_unit = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn think_time_splits_budget_with_cap() {
        let cfg = TableConfig::default();
        assert_eq!(cfg.think_time(2), Duration::from_millis(500));
        assert_eq!(cfg.think_time(8), Duration::from_millis(250));
    }
}
