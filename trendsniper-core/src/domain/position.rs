//! Simulated positions and their closed-trade records.

use super::ids::{InstrumentId, PositionId};
use super::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Price reached the take-profit level.
    Target,
    /// Price reached the stop level.
    Stop,
    /// A confirmed signal in the opposite direction fired on the position's timeframe.
    OppositeSignal,
}

/// An open simulated position.
///
/// Owned by the instrument's trade state; only the lifecycle manager mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub instrument: InstrumentId,
    pub timeframe: Timeframe,
    pub opened_at: DateTime<Utc>,
    pub side: Side,
    pub open_price: f64,
    pub target_price: f64,
    pub stop_price: f64,
    pub lot_size: f64,
    pub unrealized_pnl: f64,
}

impl Position {
    /// P/L per unit if the position were marked at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => price - self.open_price,
            Side::Short => self.open_price - price,
        }
    }

    /// Which price level, if any, `price` has crossed.
    ///
    /// Long: `price >= target` or `price <= stop`. Short mirrors.
    pub fn level_hit(&self, price: f64) -> Option<CloseReason> {
        match self.side {
            Side::Long if price >= self.target_price => Some(CloseReason::Target),
            Side::Long if price <= self.stop_price => Some(CloseReason::Stop),
            Side::Short if price <= self.target_price => Some(CloseReason::Target),
            Side::Short if price >= self.stop_price => Some(CloseReason::Stop),
            _ => None,
        }
    }
}

/// A position after close, archived in the instrument's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    #[serde(flatten)]
    pub position: Position,
    pub close_price: f64,
    pub realized_pnl: f64,
    pub closed_at: DateTime<Utc>,
    pub reason: CloseReason,
}

impl ClosedTrade {
    pub fn id(&self) -> PositionId {
        self.position.id
    }

    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_position(side: Side) -> Position {
        let (target, stop) = match side {
            Side::Long => (104.0, 98.0),
            Side::Short => (96.0, 102.0),
        };
        Position {
            id: PositionId(1),
            instrument: InstrumentId::new("BTCUSD"),
            timeframe: Timeframe::M5,
            opened_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            side,
            open_price: 100.0,
            target_price: target,
            stop_price: stop,
            lot_size: 1.0,
            unrealized_pnl: 0.0,
        }
    }

    #[test]
    fn long_pnl() {
        let p = sample_position(Side::Long);
        assert_eq!(p.pnl_at(105.0), 5.0);
        assert_eq!(p.pnl_at(97.0), -3.0);
    }

    #[test]
    fn short_pnl() {
        let p = sample_position(Side::Short);
        assert_eq!(p.pnl_at(95.0), 5.0);
        assert_eq!(p.pnl_at(103.0), -3.0);
    }

    #[test]
    fn long_levels() {
        let p = sample_position(Side::Long);
        assert_eq!(p.level_hit(104.0), Some(CloseReason::Target));
        assert_eq!(p.level_hit(98.0), Some(CloseReason::Stop));
        assert_eq!(p.level_hit(101.0), None);
    }

    #[test]
    fn short_levels() {
        let p = sample_position(Side::Short);
        assert_eq!(p.level_hit(95.5), Some(CloseReason::Target));
        assert_eq!(p.level_hit(102.0), Some(CloseReason::Stop));
        assert_eq!(p.level_hit(99.0), None);
    }

    #[test]
    fn closed_trade_flattens_position_fields() {
        let trade = ClosedTrade {
            position: sample_position(Side::Long),
            close_price: 105.0,
            realized_pnl: 5.0,
            closed_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 10, 0).unwrap(),
            reason: CloseReason::Target,
        };
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["open_price"], 100.0);
        assert_eq!(json["realized_pnl"], 5.0);
        assert_eq!(json["reason"], "target");
        let deser: ClosedTrade = serde_json::from_value(json).unwrap();
        assert_eq!(deser, trade);
        assert!(deser.is_winner());
    }
}
