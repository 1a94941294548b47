use thiserror::Error;

use crate::Timeframe;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Market data unavailable for {symbol} {timeframe}: {reason}")]
    DataUnavailable {
        symbol: String,
        timeframe: Timeframe,
        reason: String,
    },

    #[error("Insufficient history for {what}: need {needed} candles, have {available}")]
    InsufficientHistory {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach an instrument/timeframe context to a transport-level failure.
    pub fn unavailable(symbol: &str, timeframe: Timeframe, reason: impl ToString) -> Self {
        Error::DataUnavailable {
            symbol: symbol.to_string(),
            timeframe,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
