//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with
//! TR[0] = high[0]-low[0].
//! Two smoothing methods over `period`: a simple moving average of TR, or
//! Wilder's recursive smoothing seeded with that same SMA.
//! Warm-up: the first `period - 1` values are absent.

use crate::domain::Candle;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// ATR smoothing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrMethod {
    /// Simple moving average of true range.
    Sma,
    /// Wilder's smoothing: atr[t] = (atr[t-1] * (period-1) + tr[t]) / period.
    #[default]
    Wilder,
}

impl AtrMethod {
    pub fn from_wilder_flag(use_wilder: bool) -> Self {
        if use_wilder {
            AtrMethod::Wilder
        } else {
            AtrMethod::Sma
        }
    }
}

/// Compute the True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    let mut tr = Vec::with_capacity(n);
    for i in 0..n {
        let range = highs[i] - lows[i];
        if i == 0 {
            tr.push(range);
        } else {
            let pc = closes[i - 1];
            tr.push(range.max((highs[i] - pc).abs()).max((lows[i] - pc).abs()));
        }
    }
    tr
}

/// Simple moving average of `values` over `period`; first `period-1` absent.
fn sma_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    let mut window_sum: f64 = values[..period].iter().sum();
    result[period - 1] = Some(window_sum / period as f64);
    for i in period..values.len() {
        window_sum += values[i] - values[i - period];
        result[i] = Some(window_sum / period as f64);
    }
    result
}

/// Wilder smoothing seeded with the SMA of the first `period` values.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let p = period as f64;
    let mut prev = seed;
    for i in period..values.len() {
        let smoothed = (prev * (p - 1.0) + values[i]) / p;
        result[i] = Some(smoothed);
        prev = smoothed;
    }
    result
}

/// Compute ATR over parallel high/low/close series.
///
/// Returns a sequence of the same length as the input; the first `period - 1`
/// entries are `None`. Fails with `InsufficientData` only for empty input.
pub fn compute_atr(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    method: AtrMethod,
) -> Result<Vec<Option<f64>>, CoreError> {
    if period == 0 {
        return Err(CoreError::InvalidConfiguration(
            "ATR period must be >= 1".into(),
        ));
    }
    if highs.len() != lows.len() || highs.len() != closes.len() {
        return Err(CoreError::LengthMismatch {
            highs: highs.len(),
            lows: lows.len(),
            closes: closes.len(),
        });
    }
    if highs.is_empty() {
        return Err(CoreError::InsufficientData { needed: 1, got: 0 });
    }

    let tr = true_range(highs, lows, closes);
    Ok(match method {
        AtrMethod::Sma => sma_smooth(&tr, period),
        AtrMethod::Wilder => wilder_smooth(&tr, period),
    })
}

/// ATR over a candle series.
pub fn atr_of_candles(
    candles: &[Candle],
    period: usize,
    method: AtrMethod,
) -> Result<Vec<Option<f64>>, CoreError> {
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    compute_atr(&highs, &lows, &closes, period, method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    fn hlc(data: &[(f64, f64, f64, f64)]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let candles = make_ohlc_candles(data);
        (
            candles.iter().map(|c| c.high).collect(),
            candles.iter().map(|c| c.low).collect(),
            candles.iter().map(|c| c.close).collect(),
        )
    }

    #[test]
    fn true_range_basic() {
        let (h, l, c) = hlc(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 105-95 = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let (h, l, c) = hlc(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_atr_period_3() {
        let (h, l, c) = hlc(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let atr = compute_atr(&h, &l, &c, 3, AtrMethod::Sma).unwrap();
        assert_eq!(atr[0], None);
        assert_eq!(atr[1], None);
        assert_approx(atr[2].unwrap(), 9.0, DEFAULT_EPSILON);
        assert_approx(atr[3].unwrap(), 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(atr[4].unwrap(), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_atr_period_3() {
        let (h, l, c) = hlc(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
        ]);
        let atr = compute_atr(&h, &l, &c, 3, AtrMethod::Wilder).unwrap();
        // Seed at index 2: mean(10, 8, 9) = 9
        // ATR[3] = (9*2 + 6)/3 = 8
        // ATR[4] = (8*2 + 6)/3 = 22/3
        assert_eq!(atr[1], None);
        assert_approx(atr[2].unwrap(), 9.0, DEFAULT_EPSILON);
        assert_approx(atr[3].unwrap(), 8.0, DEFAULT_EPSILON);
        assert_approx(atr[4].unwrap(), 22.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn shorter_than_period_is_all_absent() {
        let (h, l, c) = hlc(&[(100.0, 105.0, 95.0, 102.0), (102.0, 108.0, 100.0, 106.0)]);
        for method in [AtrMethod::Sma, AtrMethod::Wilder] {
            let atr = compute_atr(&h, &l, &c, 5, method).unwrap();
            assert_eq!(atr, vec![None, None]);
        }
    }

    #[test]
    fn empty_input_is_insufficient_data() {
        let err = compute_atr(&[], &[], &[], 3, AtrMethod::Sma).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn zero_period_is_invalid() {
        let err = compute_atr(&[1.0], &[0.5], &[0.8], 0, AtrMethod::Wilder).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = compute_atr(&[1.0, 2.0], &[0.5], &[0.8, 1.5], 1, AtrMethod::Sma).unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { .. }));
    }

    #[test]
    fn wilder_flag_maps_to_method() {
        assert_eq!(AtrMethod::from_wilder_flag(true), AtrMethod::Wilder);
        assert_eq!(AtrMethod::from_wilder_flag(false), AtrMethod::Sma);
    }
}
