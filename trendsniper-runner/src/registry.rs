//! Instrument registry: one independently locked `InstrumentState` per instrument.
//!
//! The map itself is fixed at construction; only the per-instrument states
//! mutate, each behind its own async mutex.

use crate::config::{EngineConfig, InstrumentConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use trendsniper_core::domain::{ClosedTrade, InstrumentId, Position};
use trendsniper_core::lifecycle::{HistoryOrder, InstrumentState};

#[derive(Debug)]
pub struct InstrumentSlot {
    pub config: InstrumentConfig,
    pub state: Arc<Mutex<InstrumentState>>,
}

#[derive(Debug)]
pub struct InstrumentRegistry {
    slots: BTreeMap<InstrumentId, InstrumentSlot>,
}

impl InstrumentRegistry {
    pub fn new(config: &EngineConfig) -> Self {
        let slots = config
            .instruments
            .iter()
            .map(|instrument| {
                let state = InstrumentState::new(instrument.id.clone(), config.candle_limit);
                (
                    instrument.id.clone(),
                    InstrumentSlot {
                        config: instrument.clone(),
                        state: Arc::new(Mutex::new(state)),
                    },
                )
            })
            .collect();
        Self { slots }
    }

    /// Registered instrument ids, sorted.
    pub fn instruments(&self) -> Vec<InstrumentId> {
        self.slots.keys().cloned().collect()
    }

    pub fn slot(&self, id: &InstrumentId) -> Option<&InstrumentSlot> {
        self.slots.get(id)
    }

    pub fn slots(&self) -> impl Iterator<Item = &InstrumentSlot> {
        self.slots.values()
    }

    /// Snapshot of the open positions, or `None` for an unknown instrument.
    pub async fn open_positions(&self, id: &InstrumentId) -> Option<Vec<Position>> {
        let state = self.slot(id)?.state.lock().await;
        Some(state.open_positions().to_vec())
    }

    /// Snapshot of the closed-trade log, or `None` for an unknown instrument.
    pub async fn history(&self, id: &InstrumentId, order: HistoryOrder) -> Option<Vec<ClosedTrade>> {
        let state = self.slot(id)?.state.lock().await;
        Some(state.history_ordered(order))
    }
}
