//! Trade lifecycle driven through full ticks.

use chrono::{DateTime, Duration, TimeZone, Utc};
use trendsniper_core::domain::{CloseReason, InstrumentId, Side, Timeframe};
use trendsniper_core::indicators::TrendDirection;
use trendsniper_core::lifecycle::{
    HistoryOrder, InstrumentState, PositionPolicy, TimeframeUpdate, TradeConfig, TradeEvent,
    TradeManager,
};
use trendsniper_core::signals::Signal;

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
}

fn flat(minute: i64, price: f64) -> Signal {
    Signal {
        timestamp: at(minute),
        price,
        buy_signal: false,
        sell_signal: false,
        sniper_buy: false,
        sniper_sell: false,
        trend: TrendDirection::Up,
    }
}

fn buy(minute: i64, price: f64) -> Signal {
    Signal {
        buy_signal: true,
        sniper_buy: true,
        ..flat(minute, price)
    }
}

fn tick(timeframe: Timeframe, signal: Signal, atr: f64) -> TimeframeUpdate {
    TimeframeUpdate {
        timeframe,
        signal,
        atr: Some(atr),
        entry_allowed: true,
    }
}

#[test]
fn sniper_buy_then_target_cross() {
    let manager = TradeManager::new(TradeConfig::default());
    let mut state = InstrumentState::new(InstrumentId::new("BTCUSD"), 200);

    let events = manager.on_tick(&mut state, &[tick(Timeframe::M5, buy(0, 100.0), 2.0)]);
    let opened = events
        .iter()
        .find_map(|e| match e {
            TradeEvent::PositionOpened(p) => Some(p.clone()),
            _ => None,
        })
        .expect("position opened");
    assert_eq!(opened.side, Side::Long);
    assert_eq!(opened.open_price, 100.0);
    assert_eq!(opened.stop_price, 98.0);
    assert_eq!(opened.target_price, 104.0);

    let events = manager.on_tick(&mut state, &[tick(Timeframe::M5, flat(5, 105.0), 2.0)]);
    let closed = events
        .iter()
        .find_map(|e| match e {
            TradeEvent::PositionClosed(t) => Some(t.clone()),
            _ => None,
        })
        .expect("position closed");
    assert_eq!(closed.realized_pnl, 5.0);
    assert_eq!(closed.close_price, 105.0);
    assert_eq!(closed.reason, CloseReason::Target);
    assert_eq!(closed.id(), opened.id);
}

#[test]
fn closing_exactly_at_target_realizes_two_atr() {
    let manager = TradeManager::default();
    let mut state = InstrumentState::new(InstrumentId::new("ETHUSD"), 200);
    let (p, a) = (2500.0, 12.5);
    manager.on_tick(&mut state, &[tick(Timeframe::M15, buy(0, p), a)]);
    assert_eq!(state.open_positions()[0].target_price, p + 2.0 * a);
    assert_eq!(state.open_positions()[0].stop_price, p - a);

    manager.on_tick(&mut state, &[tick(Timeframe::M15, flat(15, p + 2.0 * a), a)]);
    assert_eq!(state.history()[0].realized_pnl, 2.0 * a);
}

#[test]
fn positions_are_marked_by_their_own_timeframe() {
    let manager = TradeManager::new(TradeConfig {
        position_policy: PositionPolicy::Unbounded,
        ..TradeConfig::default()
    });
    let mut state = InstrumentState::new(InstrumentId::new("XAUUSD"), 200);
    manager.on_tick(
        &mut state,
        &[
            tick(Timeframe::M1, buy(0, 100.0), 1.0),
            tick(Timeframe::M5, buy(0, 100.0), 5.0),
        ],
    );
    assert_eq!(state.open_positions().len(), 2);

    // M1 price reaches its target (102); M5 target (110) is untouched.
    let events = manager.on_tick(
        &mut state,
        &[
            tick(Timeframe::M1, flat(1, 102.5), 1.0),
            tick(Timeframe::M5, flat(1, 101.0), 5.0),
        ],
    );
    let closed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            TradeEvent::PositionClosed(t) => Some(t.position.timeframe),
            _ => None,
        })
        .collect();
    assert_eq!(closed, vec![Timeframe::M1]);
    assert_eq!(state.open_positions().len(), 1);
    assert_eq!(state.open_positions()[0].timeframe, Timeframe::M5);
    assert_eq!(state.open_positions()[0].unrealized_pnl, 1.0);
}

#[test]
fn history_is_append_only_and_orderable() {
    let manager = TradeManager::default();
    let mut state = InstrumentState::new(InstrumentId::new("BTCUSD"), 200);

    for round in 0..3 {
        let t = round * 10;
        manager.on_tick(&mut state, &[tick(Timeframe::M5, buy(t, 100.0), 1.0)]);
        manager.on_tick(&mut state, &[tick(Timeframe::M5, flat(t + 5, 97.0), 1.0)]);
    }

    let ids: Vec<u64> = state.history().iter().map(|t| t.id().0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(state.history().iter().all(|t| t.reason == CloseReason::Stop));

    let newest: Vec<u64> = state
        .history_ordered(HistoryOrder::NewestFirst)
        .iter()
        .map(|t| t.id().0)
        .collect();
    assert_eq!(newest, vec![3, 2, 1]);
}

#[test]
fn events_serialize_for_external_consumers() {
    let manager = TradeManager::default();
    let mut state = InstrumentState::new(InstrumentId::new("BTCUSD"), 200);
    let events = manager.on_tick(&mut state, &[tick(Timeframe::H1, buy(0, 100.0), 2.0)]);

    let json: Vec<serde_json::Value> = events
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect();
    assert_eq!(json[0]["type"], "signal_detected");
    assert_eq!(json[0]["target"], 104.0);
    assert_eq!(json[1]["type"], "position_opened");
    assert_eq!(json[1]["timeframe"], "1h");
    assert_eq!(json[1]["id"], 1);
}
