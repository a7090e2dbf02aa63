//! Deterministic random-walk candle generator.
//!
//! Each (instrument, timeframe) series owns an RNG seeded from the master
//! seed via BLAKE3, so series are independent of fetch order and reproducible
//! across runs. Every fetch appends one new candle.

use super::{tail, CandleSource, DataError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use trendsniper_core::domain::{Candle, InstrumentId, Timeframe};

const START_PRICE: f64 = 100.0;
const DEMO_VOLUME: f64 = 1000.0;

#[derive(Debug)]
struct DemoSeries {
    rng: StdRng,
    candles: Vec<Candle>,
    next_timestamp: DateTime<Utc>,
}

impl DemoSeries {
    fn next_candle(&mut self, timeframe: Timeframe) -> Candle {
        let open = self.candles.last().map_or(START_PRICE, |c| c.close);
        let close = open + self.rng.gen_range(-1.0..1.0);
        let high = open.max(close) + self.rng.gen::<f64>();
        let low = open.min(close) - self.rng.gen::<f64>();
        let candle = Candle {
            timestamp: self.next_timestamp,
            open,
            high,
            low,
            close,
            volume: DEMO_VOLUME,
        };
        self.next_timestamp += timeframe.duration();
        candle
    }
}

#[derive(Debug)]
pub struct DemoCandleSource {
    master_seed: u64,
    start: DateTime<Utc>,
    backfill: usize,
    series: Mutex<HashMap<(InstrumentId, Timeframe), DemoSeries>>,
}

impl DemoCandleSource {
    /// Series start at `start` and advance one timeframe per fetch.
    pub fn new(master_seed: u64, start: DateTime<Utc>) -> Self {
        Self {
            master_seed,
            start,
            backfill: 0,
            series: Mutex::new(HashMap::new()),
        }
    }

    /// Pre-generate `candles` history on the first fetch of each series.
    pub fn with_backfill(mut self, candles: usize) -> Self {
        self.backfill = candles;
        self
    }

    /// Deterministic seed for one series, independent of derivation order.
    pub fn series_seed(&self, instrument: &InstrumentId, timeframe: Timeframe) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(instrument.as_str().as_bytes());
        hasher.update(timeframe.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

#[async_trait]
impl CandleSource for DemoCandleSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let seed = self.series_seed(instrument, timeframe);
        let mut all = self.series.lock();
        let series = all
            .entry((instrument.clone(), timeframe))
            .or_insert_with(|| {
                let mut series = DemoSeries {
                    rng: StdRng::seed_from_u64(seed),
                    candles: Vec::with_capacity(self.backfill + 1),
                    next_timestamp: self.start,
                };
                for _ in 0..self.backfill {
                    let candle = series.next_candle(timeframe);
                    series.candles.push(candle);
                }
                series
            });

        let candle = series.next_candle(timeframe);
        series.candles.push(candle);
        let keep = limit.max(1);
        if series.candles.len() > keep {
            let excess = series.candles.len() - keep;
            series.candles.drain(..excess);
        }
        Ok(tail(series.candles.clone(), limit))
    }
}
