//! Multi-timeframe coordinator.
//!
//! Per instrument per tick:
//! 1. Fetch every configured timeframe (no lock held while awaiting the source)
//! 2. Merge the fetched candles into the cached windows
//! 3. Analyze each fetched timeframe (ATR → trend → EMA → signals)
//! 4. Gate entry-timeframe signals on the reference timeframes' trend
//! 5. Hand the latest signal per entry timeframe to the lifecycle manager
//!
//! Steps 2–5 are `Coordinator::process`, a synchronous function of the state
//! and the fetched candles.

use crate::config::{EngineConfig, InstrumentConfig};
use crate::sink::EventSink;
use crate::source::CandleSource;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trendsniper_core::domain::{Candle, Side, Timeframe};
use trendsniper_core::indicators::TrendDirection;
use trendsniper_core::lifecycle::{InstrumentState, TimeframeUpdate, TradeConfig, TradeEvent, TradeManager};
use trendsniper_core::signals::{analyze, Analysis, SignalParams};

/// Candles returned by one successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSeries {
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
}

/// True if every reference trend agrees with `side`.
///
/// A reference with no trend this tick (`None`) fails the gate. No references
/// means the instrument is ungated.
pub fn gate_allows(side: Side, references: &[Option<TrendDirection>]) -> bool {
    let wanted = match side {
        Side::Long => TrendDirection::Up,
        Side::Short => TrendDirection::Down,
    };
    references.iter().all(|trend| *trend == Some(wanted))
}

#[derive(Debug, Clone)]
pub struct Coordinator {
    params: SignalParams,
    manager: TradeManager,
    candle_limit: usize,
}

impl Coordinator {
    pub fn new(params: SignalParams, trade: TradeConfig, candle_limit: usize) -> Self {
        Self {
            params,
            manager: TradeManager::new(trade),
            candle_limit,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.indicator, config.trade, config.candle_limit)
    }

    pub fn params(&self) -> &SignalParams {
        &self.params
    }

    pub fn candle_limit(&self) -> usize {
        self.candle_limit
    }

    /// Fetch all of the instrument's timeframes. Failed or empty fetches are
    /// logged and left out.
    pub async fn fetch(&self, source: &dyn CandleSource, instrument: &InstrumentConfig) -> Vec<FetchedSeries> {
        let mut fetched = Vec::new();
        for timeframe in instrument.timeframes() {
            match source
                .fetch_candles(&instrument.id, timeframe, self.candle_limit)
                .await
            {
                Ok(candles) if candles.is_empty() => {
                    debug!(instrument = %instrument.id, %timeframe, "source returned no candles");
                }
                Ok(candles) => fetched.push(FetchedSeries { timeframe, candles }),
                Err(e) => {
                    warn!(
                        instrument = %instrument.id,
                        %timeframe,
                        source = source.name(),
                        error = %e,
                        "candle fetch failed, timeframe skipped this tick"
                    );
                }
            }
        }
        fetched
    }

    /// Apply one tick's fetched candles to `state` and return the resulting events.
    pub fn process(
        &self,
        instrument: &InstrumentConfig,
        state: &mut InstrumentState,
        fetched: &[FetchedSeries],
    ) -> Vec<TradeEvent> {
        for series in fetched {
            let added = state.candles_mut(series.timeframe).merge(&series.candles);
            debug!(
                instrument = %instrument.id,
                timeframe = %series.timeframe,
                added,
                "candles merged"
            );
        }

        let mut analyses: BTreeMap<Timeframe, Analysis> = BTreeMap::new();
        for series in fetched {
            if analyses.contains_key(&series.timeframe) {
                continue;
            }
            let Some(window) = state.candles(series.timeframe) else {
                continue;
            };
            match analyze(window.as_slice(), &self.params) {
                Ok(analysis) => {
                    analyses.insert(series.timeframe, analysis);
                }
                Err(e) if e.is_insufficient_data() => {
                    debug!(instrument = %instrument.id, timeframe = %series.timeframe, "{e}");
                }
                Err(e) => {
                    warn!(instrument = %instrument.id, timeframe = %series.timeframe, error = %e, "analysis failed");
                }
            }
        }

        let references: Vec<Option<TrendDirection>> = instrument
            .trend_timeframes
            .iter()
            .map(|tf| analyses.get(tf).and_then(Analysis::latest_trend))
            .collect();
        let entry_mode = self.manager.config().entry_mode;

        let updates: Vec<TimeframeUpdate> = instrument
            .entry_timeframes
            .iter()
            .filter_map(|tf| {
                let analysis = analyses.get(tf)?;
                let signal = analysis.latest_signal()?.clone();
                let entry_allowed = signal
                    .entry(entry_mode)
                    .map_or(true, |(side, _)| gate_allows(side, &references));
                Some(TimeframeUpdate {
                    timeframe: *tf,
                    atr: analysis.latest_atr(),
                    signal,
                    entry_allowed,
                })
            })
            .collect();

        self.manager.on_tick(state, &updates)
    }

    /// Fetch, then lock, process, and emit. Returns the emitted events.
    pub async fn tick_instrument(
        &self,
        source: &dyn CandleSource,
        instrument: &InstrumentConfig,
        state: &Mutex<InstrumentState>,
        sink: &dyn EventSink,
    ) -> Vec<TradeEvent> {
        let fetched = self.fetch(source, instrument).await;
        let mut state = state.lock().await;
        let events = self.process(instrument, &mut state, &fetched);
        for event in &events {
            sink.emit(event);
        }
        events
    }
}
