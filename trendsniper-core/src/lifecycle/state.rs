//! Per-instrument trade state.

use crate::domain::{CandleWindow, ClosedTrade, InstrumentId, Position, PositionId, Timeframe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Order in which closed-trade history is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// Everything one instrument owns: candle cache, open set, history.
///
/// Lives for the process lifetime. Only the lifecycle manager mutates the
/// open set and history; callers get read-only views.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    instrument: InstrumentId,
    window_capacity: usize,
    candles: BTreeMap<Timeframe, CandleWindow>,
    pub(crate) open: Vec<Position>,
    pub(crate) history: Vec<ClosedTrade>,
    /// Timestamp of the last signal candle acted on, per timeframe.
    pub(crate) last_entry_signal: HashMap<Timeframe, DateTime<Utc>>,
    next_position_seq: u64,
}

impl InstrumentState {
    pub fn new(instrument: InstrumentId, window_capacity: usize) -> Self {
        Self {
            instrument,
            window_capacity,
            candles: BTreeMap::new(),
            open: Vec::new(),
            history: Vec::new(),
            last_entry_signal: HashMap::new(),
            next_position_seq: 1,
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open
    }

    /// Closed trades, oldest first.
    pub fn history(&self) -> &[ClosedTrade] {
        &self.history
    }

    pub fn history_ordered(&self, order: HistoryOrder) -> Vec<ClosedTrade> {
        match order {
            HistoryOrder::OldestFirst => self.history.clone(),
            HistoryOrder::NewestFirst => self.history.iter().rev().cloned().collect(),
        }
    }

    /// Cached candles for a timeframe, if any were ever received.
    pub fn candles(&self, timeframe: Timeframe) -> Option<&CandleWindow> {
        self.candles.get(&timeframe)
    }

    /// Cached candle window for a timeframe, created empty on first use.
    pub fn candles_mut(&mut self, timeframe: Timeframe) -> &mut CandleWindow {
        let capacity = self.window_capacity;
        self.candles
            .entry(timeframe)
            .or_insert_with(|| CandleWindow::new(capacity))
    }

    pub(crate) fn allocate_position_id(&mut self) -> PositionId {
        let id = PositionId(self.next_position_seq);
        self.next_position_seq += 1;
        id
    }
}
