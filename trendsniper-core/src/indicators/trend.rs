//! ATR-banded trailing trend (SuperTrend-style).
//!
//! Inherently sequential/stateful. Per candle:
//! - `src = (high + low) / 2`, raw bands `src ± multiplier * atr`
//! - the lower band ratchets up while the previous close stays above it,
//!   the upper band ratchets down while the previous close stays below it
//! - a down-trend flips up when close exceeds the previous upper band,
//!   an up-trend flips down when close falls below the previous lower band
//!
//! While ATR is absent (warm-up) bands are absent and the trend carries the
//! previous value. The seed trend at index 0 is always `Up`.

use crate::domain::Candle;
use crate::error::CoreError;
use crate::indicators::atr::{atr_of_candles, AtrMethod};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trend sign: `Up` = +1, `Down` = -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn sign(self) -> i8 {
        match self {
            TrendDirection::Up => 1,
            TrendDirection::Down => -1,
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.sign())
    }
}

/// Trend state at one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub direction: TrendDirection,
}

/// Compute the trend series from candles and a precomputed ATR series.
///
/// `atr` must be parallel to `candles`; indices past its end count as absent.
pub fn trend_from_atr(candles: &[Candle], atr: &[Option<f64>], multiplier: f64) -> Vec<TrendPoint> {
    let mut out = Vec::with_capacity(candles.len());
    let mut prev_lower: Option<f64> = None;
    let mut prev_upper: Option<f64> = None;
    let mut direction = TrendDirection::Up;

    for (i, candle) in candles.iter().enumerate() {
        let Some(atr) = atr.get(i).copied().flatten() else {
            out.push(TrendPoint {
                upper: None,
                lower: None,
                direction,
            });
            prev_lower = None;
            prev_upper = None;
            continue;
        };

        let src = candle.hl2();
        let raw_lower = src - multiplier * atr;
        let raw_upper = src + multiplier * atr;

        // A missing previous band is stood in for by the current raw band.
        let ref_lower = prev_lower.unwrap_or(raw_lower);
        let ref_upper = prev_upper.unwrap_or(raw_upper);

        let (lower, upper) = if i == 0 {
            (raw_lower, raw_upper)
        } else {
            let prev_close = candles[i - 1].close;
            let lower = if prev_close > ref_lower {
                raw_lower.max(ref_lower)
            } else {
                raw_lower
            };
            let upper = if prev_close < ref_upper {
                raw_upper.min(ref_upper)
            } else {
                raw_upper
            };
            (lower, upper)
        };

        if i > 0 {
            let flip_up_level = prev_upper.unwrap_or(upper);
            let flip_down_level = prev_lower.unwrap_or(lower);
            direction = match direction {
                TrendDirection::Down if candle.close > flip_up_level => TrendDirection::Up,
                TrendDirection::Up if candle.close < flip_down_level => TrendDirection::Down,
                unchanged => unchanged,
            };
        }

        out.push(TrendPoint {
            upper: Some(upper),
            lower: Some(lower),
            direction,
        });
        prev_lower = Some(lower);
        prev_upper = Some(upper);
    }

    out
}

/// Compute ATR and the trailing trend in one go.
pub fn compute_trend(
    candles: &[Candle],
    period: usize,
    multiplier: f64,
    method: AtrMethod,
) -> Result<Vec<TrendPoint>, CoreError> {
    if !(multiplier > 0.0) || !multiplier.is_finite() {
        return Err(CoreError::InvalidConfiguration(format!(
            "trend multiplier must be > 0, got {multiplier}"
        )));
    }
    let atr = atr_of_candles(candles, period, method)?;
    Ok(trend_from_atr(candles, &atr, multiplier))
}
