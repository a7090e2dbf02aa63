//! TrendSniper Core: candles, indicators, signals, and the trade lifecycle.
//!
//! Everything in this crate is synchronous and deterministic:
//! - Domain types (candles, timeframes, positions, closed trades, ids)
//! - ATR (simple or Wilder smoothing), EMA, and the ATR-banded trend
//! - Signal classification (trend flips, EMA/body-confirmed "sniper" entries)
//! - Per-instrument trade lifecycle state machine and its event stream
//! - Batch backtest over a signal series
//!
//! Fetching candles, scheduling ticks, and delivering events live in
//! `trendsniper-runner`.

pub mod backtest;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod lifecycle;
pub mod signals;

pub use error::CoreError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: state and events can cross task boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::CandleWindow>();
        require_sync::<domain::CandleWindow>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::ClosedTrade>();
        require_sync::<domain::ClosedTrade>();

        require_send::<signals::Signal>();
        require_sync::<signals::Signal>();
        require_send::<signals::Analysis>();
        require_sync::<signals::Analysis>();

        require_send::<lifecycle::InstrumentState>();
        require_sync::<lifecycle::InstrumentState>();
        require_send::<lifecycle::TradeEvent>();
        require_sync::<lifecycle::TradeEvent>();
        require_send::<lifecycle::TradeManager>();
        require_sync::<lifecycle::TradeManager>();

        require_send::<CoreError>();
        require_sync::<CoreError>();
    }
}
