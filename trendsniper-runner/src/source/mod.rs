//! Candle source trait and structured error types.
//!
//! The `CandleSource` trait abstracts over where candles come from (demo
//! generator, CSV files, an exchange API) so the coordinator can be driven
//! by any of them and mocked in tests.

pub mod csv;
pub mod demo;
pub mod memory;

pub use self::csv::{load_csv_candles, read_csv_candles, CsvCandleSource};
pub use demo::DemoCandleSource;
pub use memory::StaticCandleSource;

use async_trait::async_trait;
use thiserror::Error;
use trendsniper_core::domain::{Candle, InstrumentId, Timeframe};

/// Structured candle-source errors.
///
/// Every variant is contained to one (instrument, timeframe) for one tick:
/// the coordinator logs it and treats the timeframe as having no new data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("candle source unavailable: {0}")]
    Unavailable(String),

    #[error("no candles for {instrument} {timeframe}")]
    InstrumentNotFound {
        instrument: InstrumentId,
        timeframe: Timeframe,
    },

    #[error("malformed candle data in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches the most recent candles for one instrument on one timeframe.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Up to `limit` newest candles, ascending by timestamp.
    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError>;
}

/// Keep only the newest `limit` candles.
pub(crate) fn tail(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}
