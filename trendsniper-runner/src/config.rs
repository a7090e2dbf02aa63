//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! tick_interval_ms = 1000
//! candle_limit = 200
//!
//! [indicator]
//! atr_period = 10
//! atr_method = "wilder"
//! multiplier = 3.0
//! ema_filter_length = 200
//!
//! [trade]
//! position_policy = "single"
//! entry_mode = "sniper"
//!
//! [[instruments]]
//! id = "BTCUSD"
//! entry_timeframes = ["5m", "15m"]
//! trend_timeframes = ["1h", "4h"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use trendsniper_core::domain::{InstrumentId, Timeframe};
use trendsniper_core::lifecycle::TradeConfig;
use trendsniper_core::signals::SignalParams;
use trendsniper_core::CoreError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// One traded instrument and the timeframes it is evaluated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub id: InstrumentId,
    /// Fast timeframes whose signals may open positions.
    pub entry_timeframes: Vec<Timeframe>,
    /// Slow reference timeframes whose trend must agree with an entry.
    #[serde(default)]
    pub trend_timeframes: Vec<Timeframe>,
}

impl InstrumentConfig {
    pub fn new(
        id: impl Into<String>,
        entry_timeframes: impl Into<Vec<Timeframe>>,
        trend_timeframes: impl Into<Vec<Timeframe>>,
    ) -> Self {
        Self {
            id: InstrumentId::new(id),
            entry_timeframes: entry_timeframes.into(),
            trend_timeframes: trend_timeframes.into(),
        }
    }

    /// Every timeframe that must be fetched each tick, fastest first, no repeats.
    pub fn timeframes(&self) -> Vec<Timeframe> {
        let mut all: Vec<Timeframe> = self
            .entry_timeframes
            .iter()
            .chain(&self.trend_timeframes)
            .copied()
            .collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn is_gated(&self) -> bool {
        !self.trend_timeframes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    /// Candles requested per fetch, and the size of each cached window.
    pub candle_limit: usize,
    pub indicator: SignalParams,
    pub trade: TradeConfig,
    pub instruments: Vec<InstrumentConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            candle_limit: 200,
            indicator: SignalParams::default(),
            trade: TradeConfig::default(),
            instruments: vec![InstrumentConfig::new(
                "BTCUSD",
                [Timeframe::M5, Timeframe::M15],
                [Timeframe::H1, Timeframe::H4],
            )],
        }
    }
}

impl EngineConfig {
    /// Largest accepted `candle_limit`; windows are preallocated at this size.
    pub const MAX_CANDLE_LIMIT: usize = 100_000;

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.indicator.validate()?;
        self.trade.validate()?;

        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be > 0"));
        }
        if self.candle_limit < SignalParams::MIN_CANDLES {
            return Err(invalid(format!(
                "candle_limit must be >= {}, got {}",
                SignalParams::MIN_CANDLES,
                self.candle_limit
            )));
        }
        if self.candle_limit > Self::MAX_CANDLE_LIMIT {
            return Err(invalid(format!(
                "candle_limit must be <= {}, got {}",
                Self::MAX_CANDLE_LIMIT,
                self.candle_limit
            )));
        }
        if self.instruments.is_empty() {
            return Err(invalid("at least one instrument is required"));
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if instrument.id.as_str().trim().is_empty() {
                return Err(invalid("instrument id must not be empty"));
            }
            if !seen.insert(&instrument.id) {
                return Err(invalid(format!("duplicate instrument '{}'", instrument.id)));
            }
            if instrument.entry_timeframes.is_empty() {
                return Err(invalid(format!(
                    "instrument '{}' has no entry timeframes",
                    instrument.id
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidConfiguration(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendsniper_core::indicators::AtrMethod;
    use trendsniper_core::lifecycle::PositionPolicy;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.candle_limit, 200);
    }

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_toml_takes_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            tick_interval_ms = 250

            [indicator]
            atr_method = "sma"

            [trade]
            position_policy = "unbounded"

            [[instruments]]
            id = "ETHUSD"
            entry_timeframes = ["1m"]
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.candle_limit, 200);
        assert_eq!(config.indicator.atr_method, AtrMethod::Sma);
        assert_eq!(config.indicator.atr_period, 10);
        assert_eq!(config.trade.position_policy, PositionPolicy::Unbounded);
        assert_eq!(config.instruments.len(), 1);
        assert!(!config.instruments[0].is_gated());
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let config = EngineConfig {
            tick_interval_ms: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_tiny_window() {
        let config = EngineConfig {
            candle_limit: 1,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_window() {
        let config = EngineConfig {
            candle_limit: usize::MAX,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));

        let at_limit = EngineConfig {
            candle_limit: EngineConfig::MAX_CANDLE_LIMIT,
            ..EngineConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        let mut config = EngineConfig::default();
        config.indicator.multiplier = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_duplicate_instruments() {
        let mut config = EngineConfig::default();
        config.instruments.push(config.instruments[0].clone());
        assert!(config.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_instrument_without_entry_timeframes() {
        let config = EngineConfig {
            instruments: vec![InstrumentConfig::new("BTCUSD", Vec::<Timeframe>::new(), [Timeframe::H1])],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_instrument_set() {
        let config = EngineConfig {
            instruments: vec![],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_timeframe_fails_to_parse() {
        let err = EngineConfig::from_toml(
            r#"
            [[instruments]]
            id = "BTCUSD"
            entry_timeframes = ["7m"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn timeframes_are_merged_and_sorted() {
        let instrument = InstrumentConfig::new(
            "BTCUSD",
            [Timeframe::M15, Timeframe::M5],
            [Timeframe::H1, Timeframe::M15],
        );
        assert_eq!(
            instrument.timeframes(),
            vec![Timeframe::M5, Timeframe::M15, Timeframe::H1]
        );
    }
}
