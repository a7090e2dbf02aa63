//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: EMA[period-1] = SMA of the first `period` values.
//! Warm-up: the first `period - 1` values are absent.

/// EMA of an arbitrary value series.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        let next = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = Some(next);
        prev = next;
    }

    result
}
