//! Trade lifecycle: Flat → Open → Closed per simulated position.
//!
//! **Key invariants:**
//! 1. Positions are only created by an entry signal (never Flat → Closed)
//! 2. A closed position is archived once and never re-opened
//! 3. History is append-only, ordered by close
//! 4. A missing price for a timeframe is a no-op for positions on it
//!
//! **Module Structure:**
//! - `policy`: position multiplicity and trade parameters
//! - `events`: tagged events emitted per transition
//! - `state`: per-instrument owned state (open set, history, candle cache)
//! - `manager`: the state machine itself

pub mod events;
pub mod manager;
pub mod policy;
pub mod state;

pub use events::TradeEvent;
pub use manager::{TimeframeUpdate, TradeManager};
pub use policy::{PositionPolicy, TradeConfig};
pub use state::{HistoryOrder, InstrumentState};
