//! Full per-series pipeline: candles in, ATR/EMA/trend/signals out.

use crate::domain::Candle;
use crate::error::CoreError;
use crate::indicators::atr::atr_of_candles;
use crate::indicators::{ema, trend_from_atr, AtrMethod, TrendDirection, TrendPoint};
use crate::signals::classifier::{classify, Signal};
use serde::{Deserialize, Serialize};

/// Indicator parameters shared by every timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    pub atr_period: usize,
    pub atr_method: AtrMethod,
    pub multiplier: f64,
    pub ema_filter_length: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            atr_period: 10,
            atr_method: AtrMethod::Wilder,
            multiplier: 3.0,
            ema_filter_length: 200,
        }
    }
}

impl SignalParams {
    /// Minimum candles before any signal can exist (a flip needs two candles).
    pub const MIN_CANDLES: usize = 2;

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.atr_period == 0 {
            return Err(CoreError::InvalidConfiguration(
                "atr_period must be >= 1".into(),
            ));
        }
        if !(self.multiplier > 0.0) || !self.multiplier.is_finite() {
            return Err(CoreError::InvalidConfiguration(format!(
                "multiplier must be a positive number, got {}",
                self.multiplier
            )));
        }
        if self.ema_filter_length == 0 {
            return Err(CoreError::InvalidConfiguration(
                "ema_filter_length must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output of one pipeline run; every series is parallel to the input candles.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub atr: Vec<Option<f64>>,
    pub ema: Vec<Option<f64>>,
    pub trend: Vec<TrendPoint>,
    pub signals: Vec<Option<Signal>>,
}

impl Analysis {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Signal at the newest candle.
    pub fn latest_signal(&self) -> Option<&Signal> {
        self.signals.last().and_then(Option::as_ref)
    }

    /// ATR at the newest candle.
    pub fn latest_atr(&self) -> Option<f64> {
        self.atr.last().copied().flatten()
    }

    /// Trend sign at the newest candle.
    pub fn latest_trend(&self) -> Option<TrendDirection> {
        self.trend.last().map(|p| p.direction)
    }

    /// Iterate over (index, signal) for candles carrying a trend flip.
    pub fn flips(&self) -> impl Iterator<Item = (usize, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().filter(|s| s.is_flip()).map(|s| (i, s)))
    }
}

/// Run ATR → trend → EMA → classify over `candles`.
///
/// Pure: identical candles and params always yield an identical `Analysis`.
pub fn analyze(candles: &[Candle], params: &SignalParams) -> Result<Analysis, CoreError> {
    params.validate()?;
    if candles.len() < SignalParams::MIN_CANDLES {
        return Err(CoreError::InsufficientData {
            needed: SignalParams::MIN_CANDLES,
            got: candles.len(),
        });
    }

    let atr = atr_of_candles(candles, params.atr_period, params.atr_method)?;
    let trend = trend_from_atr(candles, &atr, params.multiplier);
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema = ema(&closes, params.ema_filter_length);
    let signals = classify(candles, &trend, &ema);

    Ok(Analysis {
        atr,
        ema,
        trend,
        signals,
    })
}
