//! Trade lifecycle state machine.
//!
//! One call to [`TradeManager::on_tick`] per instrument per tick:
//! 1. Mark every open position at the latest price of its own timeframe,
//!    emitting `PositionUpdated`, then `PositionClosed` if the target, the
//!    stop, or (optionally) an opposite signal was hit.
//! 2. Consider each timeframe's latest signal for entry, emitting
//!    `SignalDetected` and, if the position policy allows, `PositionOpened`.
//!
//! Closing before opening lets a reversal signal close and re-enter on the
//! same tick under the single-position policy.

use crate::domain::{CloseReason, ClosedTrade, Position, Side, Timeframe};
use crate::lifecycle::events::TradeEvent;
use crate::lifecycle::policy::TradeConfig;
use crate::lifecycle::state::InstrumentState;
use crate::signals::Signal;
use tracing::{debug, info};

/// The newest evaluated candle of one timeframe, as seen by this tick.
///
/// Timeframes with no data this tick are simply absent from the tick input.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeframeUpdate {
    pub timeframe: Timeframe,
    pub signal: Signal,
    pub atr: Option<f64>,
    /// Entry gate verdict (higher-timeframe trend alignment).
    pub entry_allowed: bool,
}

/// Target and stop for an entry at `price`.
///
/// Stop sits one ATR against the position; target `tp_multiplier` ATRs in favor.
pub fn entry_levels(side: Side, price: f64, atr: f64, tp_multiplier: f64) -> (f64, f64) {
    match side {
        Side::Long => (price + atr * tp_multiplier, price - atr),
        Side::Short => (price - atr * tp_multiplier, price + atr),
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradeManager {
    config: TradeConfig,
}

impl TradeManager {
    pub fn new(config: TradeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TradeConfig {
        &self.config
    }

    /// Apply one tick to `state`, returning the events in causal order.
    pub fn on_tick(&self, state: &mut InstrumentState, updates: &[TimeframeUpdate]) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        self.mark_positions(state, updates, &mut events);
        for update in updates {
            self.consider_entry(state, update, &mut events);
        }
        events
    }

    fn mark_positions(
        &self,
        state: &mut InstrumentState,
        updates: &[TimeframeUpdate],
        events: &mut Vec<TradeEvent>,
    ) {
        let positions = std::mem::take(&mut state.open);
        let mut still_open = Vec::with_capacity(positions.len());

        for mut position in positions {
            let Some(update) = updates.iter().find(|u| u.timeframe == position.timeframe) else {
                // No price for this timeframe this tick: leave the position untouched.
                still_open.push(position);
                continue;
            };

            let price = update.signal.price;
            position.unrealized_pnl = position.pnl_at(price);
            events.push(TradeEvent::PositionUpdated(position.clone()));

            match self.close_reason(&position, update) {
                Some(reason) => {
                    let closed = ClosedTrade {
                        realized_pnl: position.unrealized_pnl,
                        close_price: price,
                        closed_at: update.signal.timestamp,
                        reason,
                        position,
                    };
                    info!(
                        instrument = %closed.position.instrument,
                        position_id = %closed.position.id,
                        reason = ?reason,
                        realized_pnl = closed.realized_pnl,
                        "position closed"
                    );
                    state.history.push(closed.clone());
                    events.push(TradeEvent::PositionClosed(closed));
                }
                None => still_open.push(position),
            }
        }

        state.open = still_open;
    }

    fn close_reason(&self, position: &Position, update: &TimeframeUpdate) -> Option<CloseReason> {
        if let Some(reason) = position.level_hit(update.signal.price) {
            return Some(reason);
        }
        let fresh_signal = update.signal.timestamp > position.opened_at;
        if self.config.close_on_opposite_signal
            && fresh_signal
            && update.signal.opposes(position.side, self.config.entry_mode)
        {
            return Some(CloseReason::OppositeSignal);
        }
        None
    }

    fn consider_entry(
        &self,
        state: &mut InstrumentState,
        update: &TimeframeUpdate,
        events: &mut Vec<TradeEvent>,
    ) {
        let Some((side, confirmed)) = update.signal.entry(self.config.entry_mode) else {
            return;
        };
        let timeframe = update.timeframe;

        if state.last_entry_signal.get(&timeframe) == Some(&update.signal.timestamp) {
            return;
        }
        if !update.entry_allowed {
            debug!(
                instrument = %state.instrument(),
                %timeframe,
                %side,
                "entry signal rejected by trend gate"
            );
            return;
        }
        state
            .last_entry_signal
            .insert(timeframe, update.signal.timestamp);

        let Some(atr) = update.atr.filter(|a| a.is_finite() && *a > 0.0) else {
            debug!(instrument = %state.instrument(), %timeframe, "entry signal without ATR, skipped");
            return;
        };

        let price = update.signal.price;
        let (target, stop) = entry_levels(side, price, atr, self.config.tp_multiplier(confirmed));

        events.push(TradeEvent::SignalDetected {
            instrument: state.instrument().clone(),
            timeframe,
            side,
            price,
            target,
            stop,
            time: update.signal.timestamp,
            confirmed,
        });

        if !self.config.position_policy.allows_open(state.open.len()) {
            debug!(
                instrument = %state.instrument(),
                open = state.open.len(),
                "position policy blocks new entry"
            );
            return;
        }

        let position = Position {
            id: state.allocate_position_id(),
            instrument: state.instrument().clone(),
            timeframe,
            opened_at: update.signal.timestamp,
            side,
            open_price: price,
            target_price: target,
            stop_price: stop,
            lot_size: self.config.lot_size,
            unrealized_pnl: 0.0,
        };
        info!(
            instrument = %position.instrument,
            position_id = %position.id,
            %timeframe,
            %side,
            price,
            "position opened"
        );
        state.open.push(position.clone());
        events.push(TradeEvent::PositionOpened(position));
    }
}
