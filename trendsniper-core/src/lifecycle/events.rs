//! Events emitted by the lifecycle manager, in causal order per instrument.

use crate::domain::{ClosedTrade, InstrumentId, Position, Side, Timeframe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outbound event. Delivery is fire-and-forget from the engine's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeEvent {
    SignalDetected {
        instrument: InstrumentId,
        timeframe: Timeframe,
        side: Side,
        price: f64,
        target: f64,
        stop: f64,
        time: DateTime<Utc>,
        confirmed: bool,
    },
    PositionOpened(Position),
    PositionUpdated(Position),
    PositionClosed(ClosedTrade),
}

impl TradeEvent {
    pub fn instrument(&self) -> &InstrumentId {
        match self {
            TradeEvent::SignalDetected { instrument, .. } => instrument,
            TradeEvent::PositionOpened(p) | TradeEvent::PositionUpdated(p) => &p.instrument,
            TradeEvent::PositionClosed(t) => &t.position.instrument,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TradeEvent::SignalDetected { .. } => "signal_detected",
            TradeEvent::PositionOpened(_) => "position_opened",
            TradeEvent::PositionUpdated(_) => "position_updated",
            TradeEvent::PositionClosed(_) => "position_closed",
        }
    }
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeEvent::SignalDetected {
                instrument,
                timeframe,
                side,
                price,
                target,
                stop,
                time,
                confirmed,
            } => write!(
                f,
                "new {}signal {instrument} {timeframe} {side} @ {price:.2} target {target:.2} stop {stop:.2} ({})",
                if *confirmed { "sniper " } else { "" },
                time.to_rfc3339()
            ),
            TradeEvent::PositionOpened(p) => write!(
                f,
                "opened {} {} {} {} @ {:.2} target {:.2} stop {:.2}",
                p.instrument, p.id, p.timeframe, p.side, p.open_price, p.target_price, p.stop_price
            ),
            TradeEvent::PositionUpdated(p) => write!(
                f,
                "update {} {} {} open {:.2} unrealized {:.2}",
                p.instrument, p.id, p.side, p.open_price, p.unrealized_pnl
            ),
            TradeEvent::PositionClosed(t) => write!(
                f,
                "closed {} {} {} open {:.2} close {:.2} {} {:.2} ({:?})",
                t.position.instrument,
                t.position.id,
                t.position.side,
                t.position.open_price,
                t.close_price,
                if t.realized_pnl >= 0.0 { "profit" } else { "loss" },
                t.realized_pnl,
                t.reason
            ),
        }
    }
}
