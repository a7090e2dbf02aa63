use crate::error::CoreError;
use crate::signals::EntryMode;
use serde::{Deserialize, Serialize};

/// How many positions an instrument may hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPolicy {
    /// At most one open position; new entries are rejected while one is open.
    #[default]
    Single,
    /// Any number of concurrent positions.
    Unbounded,
}

impl PositionPolicy {
    pub fn allows_open(self, open_count: usize) -> bool {
        match self {
            PositionPolicy::Single => open_count == 0,
            PositionPolicy::Unbounded => true,
        }
    }
}

/// Trade lifecycle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    pub position_policy: PositionPolicy,
    pub entry_mode: EntryMode,
    /// Take-profit distance in ATRs for sniper-confirmed entries.
    pub sniper_tp_multiplier: f64,
    /// Take-profit distance in ATRs for raw (unconfirmed) entries.
    pub raw_tp_multiplier: f64,
    pub lot_size: f64,
    pub close_on_opposite_signal: bool,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            position_policy: PositionPolicy::Single,
            entry_mode: EntryMode::Sniper,
            sniper_tp_multiplier: 2.0,
            raw_tp_multiplier: 1.0,
            lot_size: 1.0,
            close_on_opposite_signal: true,
        }
    }
}

impl TradeConfig {
    pub fn tp_multiplier(&self, confirmed: bool) -> f64 {
        if confirmed {
            self.sniper_tp_multiplier
        } else {
            self.raw_tp_multiplier
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("sniper_tp_multiplier", self.sniper_tp_multiplier),
            ("raw_tp_multiplier", self.raw_tp_multiplier),
            ("lot_size", self.lot_size),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(CoreError::InvalidConfiguration(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
