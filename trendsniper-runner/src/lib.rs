//! TrendSniper Runner: live orchestration around `trendsniper-core`.
//!
//! This crate provides:
//! - TOML engine configuration with validation
//! - Candle sources (demo random walk, CSV files, in-memory)
//! - Event sinks (tracing log lines, broadcast channel, fan-out, recording)
//! - Instrument registry with the read-only query surface
//! - Multi-timeframe coordinator (analysis per timeframe, trend gate, lifecycle)
//! - Fixed-interval tick scheduler

pub mod config;
pub mod coordinator;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod source;

pub use config::{ConfigError, EngineConfig, InstrumentConfig};
pub use coordinator::{gate_allows, Coordinator, FetchedSeries};
pub use registry::InstrumentRegistry;
pub use scheduler::{Engine, RunStats};
pub use sink::{BroadcastSink, EventSink, FanoutSink, RecordingSink, TracingSink};
pub use source::{CandleSource, CsvCandleSource, DataError, DemoCandleSource, StaticCandleSource};
