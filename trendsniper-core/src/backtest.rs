//! Batch replay of a signal series.
//!
//! A simpler model than the live lifecycle manager: one position at a time,
//! sniper signals only, take-profit at `atr * tp_multiplier` measured with
//! the ATR of the candle being evaluated, exit on an opposing sniper signal,
//! no stop. Whatever is still open at the end is closed at the last price.

use crate::domain::Side;
use crate::signals::Signal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub side: Side,
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub pnl: f64,
}

impl BacktestTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub trades: usize,
    pub winners: usize,
    pub losers: usize,
    /// Fraction of trades with positive P/L; 0 when there are no trades.
    pub win_rate: f64,
    pub total_pnl: f64,
}

impl BacktestSummary {
    pub fn from_trades(trades: &[BacktestTrade]) -> Self {
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        let losers = trades.iter().filter(|t| t.pnl < 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            winners as f64 / trades.len() as f64
        };
        Self {
            trades: trades.len(),
            winners,
            losers,
            win_rate,
            total_pnl: trades.iter().map(|t| t.pnl).sum(),
        }
    }
}

struct OpenTrade {
    side: Side,
    index: usize,
    time: DateTime<Utc>,
    price: f64,
}

impl OpenTrade {
    fn close(self, index: usize, signal: &Signal) -> BacktestTrade {
        let pnl = match self.side {
            Side::Long => signal.price - self.price,
            Side::Short => self.price - signal.price,
        };
        BacktestTrade {
            side: self.side,
            entry_index: self.index,
            entry_time: self.time,
            entry_price: self.price,
            exit_index: index,
            exit_time: signal.timestamp,
            exit_price: signal.price,
            pnl,
        }
    }
}

/// Replay `signals` (parallel to `atr`) and return the completed trades.
pub fn simulate_trades(signals: &[Option<Signal>], atr: &[Option<f64>], tp_multiplier: f64) -> Vec<BacktestTrade> {
    let mut trades = Vec::new();
    let mut open: Option<OpenTrade> = None;
    let mut last: Option<(usize, &Signal)> = None;

    for (i, signal) in signals.iter().enumerate() {
        let Some(signal) = signal else { continue };
        last = Some((i, signal));

        if let Some(trade) = open.take() {
            let reach = atr.get(i).copied().flatten().unwrap_or(0.0) * tp_multiplier;
            let exit = match trade.side {
                Side::Long => signal.price >= trade.price + reach || signal.sniper_sell,
                Side::Short => signal.price <= trade.price - reach || signal.sniper_buy,
            };
            if exit {
                trades.push(trade.close(i, signal));
            } else {
                open = Some(trade);
            }
        }

        if open.is_none() {
            let side = if signal.sniper_buy {
                Some(Side::Long)
            } else if signal.sniper_sell {
                Some(Side::Short)
            } else {
                None
            };
            open = side.map(|side| OpenTrade {
                side,
                index: i,
                time: signal.timestamp,
                price: signal.price,
            });
        }
    }

    if let (Some(trade), Some((i, signal))) = (open, last) {
        trades.push(trade.close(i, signal));
    }
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::TrendDirection;
    use chrono::{Duration, TimeZone};

    fn sig(i: i64, price: f64, buy: bool, sell: bool) -> Option<Signal> {
        Some(Signal {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(i),
            price,
            buy_signal: buy,
            sell_signal: sell,
            sniper_buy: buy,
            sniper_sell: sell,
            trend: if sell { TrendDirection::Down } else { TrendDirection::Up },
        })
    }

    #[test]
    fn long_closes_at_take_profit() {
        let signals = vec![None, sig(1, 100.0, true, false), sig(2, 101.0, false, false), sig(3, 103.0, false, false)];
        let atr = vec![None, Some(1.0), Some(1.0), Some(1.0)];
        let trades = simulate_trades(&signals, &atr, 2.0);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, Side::Long);
        assert_eq!(trades[0].exit_index, 3);
        assert_eq!(trades[0].pnl, 3.0);
    }

    #[test]
    fn opposite_sniper_closes_and_reverses() {
        let signals = vec![None, sig(1, 100.0, true, false), sig(2, 99.0, false, true), sig(3, 97.0, false, false)];
        let atr = vec![None, Some(5.0), Some(5.0), Some(5.0)];
        let trades = simulate_trades(&signals, &atr, 1.0);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].pnl, -1.0);
        assert_eq!(trades[1].side, Side::Short);
        // closed at the last price
        assert_eq!(trades[1].exit_index, 3);
        assert_eq!(trades[1].pnl, 2.0);
    }

    #[test]
    fn no_signals_no_trades() {
        let signals = vec![None, sig(1, 100.0, false, false)];
        assert!(simulate_trades(&signals, &[None, Some(1.0)], 1.0).is_empty());
        assert!(simulate_trades(&[], &[], 1.0).is_empty());
    }

    #[test]
    fn summary_counts_winners_and_losers() {
        let signals = vec![None, sig(1, 100.0, true, false), sig(2, 99.0, false, true), sig(3, 97.0, false, false)];
        let atr = vec![None, Some(5.0), Some(5.0), Some(5.0)];
        let summary = BacktestSummary::from_trades(&simulate_trades(&signals, &atr, 1.0));
        assert_eq!(summary.trades, 2);
        assert_eq!(summary.winners, 1);
        assert_eq!(summary.losers, 1);
        assert_eq!(summary.win_rate, 0.5);
        assert_eq!(summary.total_pnl, 1.0);
    }

    #[test]
    fn empty_summary_has_zero_win_rate() {
        assert_eq!(BacktestSummary::from_trades(&[]).win_rate, 0.0);
    }
}
