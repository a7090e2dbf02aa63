//! Core error types.

use thiserror::Error;

/// Errors raised by indicator, signal and lifecycle computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Fewer candles than the computation needs. Not fatal: the series is
    /// simply not actionable yet.
    #[error("insufficient data: need at least {needed} candles, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Input series that must run in parallel have different lengths.
    #[error("series length mismatch: highs={highs}, lows={lows}, closes={closes}")]
    LengthMismatch {
        highs: usize,
        lows: usize,
        closes: usize,
    },

    /// Parameters that can never produce a valid result (fatal at construction).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl CoreError {
    /// True for errors that only mean "not enough history yet".
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, CoreError::InsufficientData { .. })
    }
}
