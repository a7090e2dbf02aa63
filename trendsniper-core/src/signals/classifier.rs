//! Trend-flip signal classifier.
//!
//! - `buy_signal[i]`: trend flipped from Down to Up at `i`
//! - `sell_signal[i]`: trend flipped from Up to Down at `i`
//! - `sniper_buy[i]`: buy signal with close above the EMA and a bullish body
//! - `sniper_sell[i]`: sell signal with close below the EMA and a bearish body
//!
//! The first candle has no prior trend to compare against and never carries
//! a signal.

use crate::domain::{Candle, Side};
use crate::indicators::{TrendDirection, TrendPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which signals are allowed to open positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// Only EMA/body-confirmed ("sniper") signals.
    #[default]
    Sniper,
    /// Any trend flip, confirmed or not.
    Any,
}

/// Labeled signal state at one candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub buy_signal: bool,
    pub sell_signal: bool,
    pub sniper_buy: bool,
    pub sniper_sell: bool,
    pub trend: TrendDirection,
}

impl Signal {
    /// Entry side for this signal under `mode`, plus whether it is sniper-confirmed.
    pub fn entry(&self, mode: EntryMode) -> Option<(Side, bool)> {
        if self.sniper_buy {
            return Some((Side::Long, true));
        }
        if self.sniper_sell {
            return Some((Side::Short, true));
        }
        match mode {
            EntryMode::Sniper => None,
            EntryMode::Any if self.buy_signal => Some((Side::Long, false)),
            EntryMode::Any if self.sell_signal => Some((Side::Short, false)),
            EntryMode::Any => None,
        }
    }

    /// True if this signal calls for exiting a position on `side`.
    pub fn opposes(&self, side: Side, mode: EntryMode) -> bool {
        matches!(self.entry(mode), Some((entry_side, _)) if entry_side == side.opposite())
    }

    pub fn is_flip(&self) -> bool {
        self.buy_signal || self.sell_signal
    }
}

/// Label every candle. Output is parallel to `candles`; index 0 is `None`.
///
/// `trend` and `ema` must be parallel to `candles`; indices past their end
/// count as absent (no trend → no signal, no EMA → no sniper confirmation).
pub fn classify(candles: &[Candle], trend: &[TrendPoint], ema: &[Option<f64>]) -> Vec<Option<Signal>> {
    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            if i == 0 {
                return None;
            }
            let cur = trend.get(i)?.direction;
            let prev = trend.get(i - 1)?.direction;

            let buy_signal = cur == TrendDirection::Up && prev == TrendDirection::Down;
            let sell_signal = cur == TrendDirection::Down && prev == TrendDirection::Up;

            let ema = ema.get(i).copied().flatten();
            let sniper_buy = buy_signal
                && ema.is_some_and(|e| candle.close > e)
                && candle.is_bullish();
            let sniper_sell = sell_signal
                && ema.is_some_and(|e| candle.close < e)
                && candle.is_bearish();

            Some(Signal {
                timestamp: candle.timestamp,
                price: candle.close,
                buy_signal,
                sell_signal,
                sniper_buy,
                sniper_sell,
                trend: cur,
            })
        })
        .collect()
}
