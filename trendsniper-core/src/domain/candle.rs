//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single instrument on a single timeframe.
///
/// Immutable once produced. Series are ordered by `timestamp` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Midpoint of the candle's range, `(high + low) / 2`.
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Bounded rolling window of candles for one instrument/timeframe.
///
/// Holds at most `capacity` candles in ascending timestamp order; the oldest
/// are dropped as new ones arrive.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    capacity: usize,
    candles: Vec<Candle>,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            candles: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Merge freshly fetched candles into the window.
    ///
    /// A candle whose timestamp matches one already held replaces it (the
    /// still-forming candle gets revised by the source); newer candles are
    /// appended; older ones that are not held are ignored. Returns the number
    /// of candles appended.
    pub fn merge(&mut self, fetched: &[Candle]) -> usize {
        let mut appended = 0;
        for candle in fetched {
            match self.candles.last() {
                Some(last) if candle.timestamp <= last.timestamp => {
                    if let Ok(pos) = self
                        .candles
                        .binary_search_by(|c| c.timestamp.cmp(&candle.timestamp))
                    {
                        self.candles[pos] = candle.clone();
                    }
                }
                _ => {
                    self.candles.push(candle.clone());
                    appended += 1;
                }
            }
        }

        if self.candles.len() > self.capacity {
            let excess = self.candles.len() - self.capacity;
            self.candles.drain(..excess);
        }
        appended
    }
}
