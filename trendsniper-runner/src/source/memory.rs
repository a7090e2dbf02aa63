//! In-memory candle source for tests and embedders.

use super::{tail, CandleSource, DataError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use trendsniper_core::domain::{Candle, InstrumentId, Timeframe};

type SeriesKey = (InstrumentId, Timeframe);

/// Serves whatever candles were last stored for each (instrument, timeframe).
///
/// Series can be marked as failing to exercise fetch-failure handling.
#[derive(Debug, Default)]
pub struct StaticCandleSource {
    series: RwLock<HashMap<SeriesKey, Vec<Candle>>>,
    failing: RwLock<HashSet<SeriesKey>>,
}

impl StaticCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole series.
    pub fn set(&self, instrument: &InstrumentId, timeframe: Timeframe, candles: Vec<Candle>) {
        self.series
            .write()
            .insert((instrument.clone(), timeframe), candles);
    }

    /// Append one candle to the series.
    pub fn push(&self, instrument: &InstrumentId, timeframe: Timeframe, candle: Candle) {
        self.series
            .write()
            .entry((instrument.clone(), timeframe))
            .or_default()
            .push(candle);
    }

    /// Make fetches for this series fail with `DataError::Unavailable` until `recover`.
    pub fn fail(&self, instrument: &InstrumentId, timeframe: Timeframe) {
        self.failing.write().insert((instrument.clone(), timeframe));
    }

    pub fn recover(&self, instrument: &InstrumentId, timeframe: Timeframe) {
        self.failing
            .write()
            .remove(&(instrument.clone(), timeframe));
    }
}

#[async_trait]
impl CandleSource for StaticCandleSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let key = (instrument.clone(), timeframe);
        if self.failing.read().contains(&key) {
            return Err(DataError::Unavailable(format!(
                "{instrument} {timeframe} marked as failing"
            )));
        }
        let candles = self
            .series
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| DataError::InstrumentNotFound {
                instrument: instrument.clone(),
                timeframe,
            })?;
        Ok(tail(candles, limit))
    }
}
