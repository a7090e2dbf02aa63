//! Signal classification: trend flips confirmed by EMA side and candle body.
//!
//! `classify` labels each candle; `analyze` runs the whole pipeline
//! (ATR → trend → EMA → classify) for one candle series.

pub mod analysis;
pub mod classifier;

pub use analysis::{analyze, Analysis, SignalParams};
pub use classifier::{classify, EntryMode, Signal};
