//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building or loading return series.
#[derive(Debug, Error)]
pub enum DataError {
    /// Observations are not strictly increasing by date
    #[error("Unordered observations for {instrument}: {date} does not follow {previous}")]
    UnorderedDates {
        /// Instrument identifier
        instrument: String,
        /// Offending date
        date: String,
        /// Date of the preceding observation
        previous: String,
    },

    /// Not enough prices to form a single return
    #[error("Insufficient prices for {instrument}: need at least {required}, got {actual}")]
    InsufficientPrices {
        /// Instrument identifier
        instrument: String,
        /// Required number of prices
        required: usize,
        /// Actual number of prices
        actual: usize,
    },

    /// Instrument not present in a price file
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
