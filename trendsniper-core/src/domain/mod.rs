//! Domain types for TrendSniper

pub mod candle;
pub mod ids;
pub mod position;
pub mod timeframe;

pub use candle::{Candle, CandleWindow};
pub use ids::{InstrumentId, PositionId};
pub use position::{CloseReason, ClosedTrade, Position, Side};
pub use timeframe::{ParseTimeframeError, Timeframe};
