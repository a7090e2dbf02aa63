//! Event sinks: where `TradeEvent`s go after the lifecycle emits them.
//!
//! Delivery is fire-and-forget. A sink must not block the tick; slow
//! consumers hang off a `BroadcastSink` and fall behind on their own.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use trendsniper_core::lifecycle::TradeEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &TradeEvent);
}

/// Renders every event as one structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &TradeEvent) {
        info!(
            instrument = %event.instrument(),
            kind = event.kind(),
            "{event}"
        );
    }
}

/// Publishes events on a `tokio::sync::broadcast` channel (dashboards, sockets).
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<TradeEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TradeEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: &TradeEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(kind = event.kind(), "no broadcast subscribers, event dropped");
        }
    }
}

/// Forwards every event to each inner sink, in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &TradeEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TradeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TradeEvent> {
        self.events.lock().clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<TradeEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &TradeEvent) {
        self.events.lock().push(event.clone());
    }
}
