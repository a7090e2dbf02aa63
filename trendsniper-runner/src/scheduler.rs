//! Fixed-interval tick loop over every registered instrument.
//!
//! Each tick spawns one task per instrument. An instrument whose previous
//! task is still running is skipped for that tick, so ticks never overlap for
//! the same instrument while different instruments run concurrently.

use crate::config::{ConfigError, EngineConfig};
use crate::coordinator::Coordinator;
use crate::registry::{InstrumentRegistry, InstrumentSlot};
use crate::sink::EventSink;
use crate::source::CandleSource;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use trendsniper_core::domain::InstrumentId;
use trendsniper_core::lifecycle::TradeEvent;

/// Counters for one `Engine::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    /// Instrument ticks skipped because the previous one was still running.
    pub skipped: u64,
    pub events: u64,
}

pub struct Engine {
    tick_interval: Duration,
    registry: Arc<InstrumentRegistry>,
    coordinator: Arc<Coordinator>,
    source: Arc<dyn CandleSource>,
    sink: Arc<dyn EventSink>,
}

impl Engine {
    /// Validate the configuration and build one state per instrument.
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn CandleSource>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tick_interval: config.tick_interval(),
            registry: Arc::new(InstrumentRegistry::new(&config)),
            coordinator: Arc::new(Coordinator::from_config(&config)),
            source,
            sink,
        })
    }

    pub fn registry(&self) -> Arc<InstrumentRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    fn spawn_tick(&self, slot: &InstrumentSlot) -> JoinHandle<Vec<TradeEvent>> {
        let coordinator = Arc::clone(&self.coordinator);
        let source = Arc::clone(&self.source);
        let sink = Arc::clone(&self.sink);
        let instrument = slot.config.clone();
        let state = Arc::clone(&slot.state);
        tokio::spawn(async move {
            coordinator
                .tick_instrument(source.as_ref(), &instrument, &state, sink.as_ref())
                .await
        })
    }

    /// Run a single tick for every instrument concurrently and wait for all
    /// of them. Events are returned grouped by instrument, in id order.
    pub async fn tick_once(&self) -> Vec<TradeEvent> {
        let handles: Vec<(InstrumentId, JoinHandle<Vec<TradeEvent>>)> = self
            .registry
            .slots()
            .map(|slot| (slot.config.id.clone(), self.spawn_tick(slot)))
            .collect();

        let mut events = Vec::new();
        for (id, handle) in handles {
            if let Some(batch) = reap(&id, handle).await {
                events.extend(batch);
            }
        }
        events
    }

    /// Tick on the configured interval until `shutdown` resolves or
    /// `max_ticks` ticks have fired, then wait for in-flight instrument tasks.
    pub async fn run<F>(&self, shutdown: F, max_ticks: Option<u64>) -> RunStats
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut in_flight: HashMap<InstrumentId, JoinHandle<Vec<TradeEvent>>> = HashMap::new();
        let mut stats = RunStats::default();

        info!(
            instruments = self.registry.instruments().len(),
            interval_ms = self.tick_interval.as_millis() as u64,
            source = self.source.name(),
            "engine started"
        );

        loop {
            if max_ticks.is_some_and(|max| stats.ticks >= max) {
                break;
            }
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    stats.ticks += 1;
                    for slot in self.registry.slots() {
                        let id = &slot.config.id;
                        if in_flight.get(id).is_some_and(|h| !h.is_finished()) {
                            debug!(instrument = %id, "previous tick still running, skipped");
                            stats.skipped += 1;
                            continue;
                        }
                        if let Some(done) = in_flight.remove(id) {
                            if let Some(events) = reap(id, done).await {
                                stats.events += events.len() as u64;
                            }
                        }
                        in_flight.insert(id.clone(), self.spawn_tick(slot));
                    }
                }
            }
        }

        for (id, handle) in in_flight {
            if let Some(events) = reap(&id, handle).await {
                stats.events += events.len() as u64;
            }
        }
        info!(
            ticks = stats.ticks,
            skipped = stats.skipped,
            events = stats.events,
            "engine stopped"
        );
        stats
    }
}

async fn reap(id: &InstrumentId, handle: JoinHandle<Vec<TradeEvent>>) -> Option<Vec<TradeEvent>> {
    match handle.await {
        Ok(events) => Some(events),
        Err(e) => {
            error!(instrument = %id, error = %e, "instrument tick task failed");
            None
        }
    }
}
