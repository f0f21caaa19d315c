//! Domain error types.

use chrono::NaiveDate;

/// Why a two-day classification could not be made.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("insufficient data: have {rows} rows, need {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("indicator {field} undefined on {date}")]
    UndefinedIndicator {
        date: NaiveDate,
        field: &'static str,
    },
}

/// Top-level error type for kdtrader.
#[derive(Debug, thiserror::Error)]
pub enum KdtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data provider failure: {reason}")]
    Provider { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("subscriber store error: {reason}")]
    Subscribers { reason: String },

    #[error("notification error: {reason}")]
    Notification { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&KdtraderError> for std::process::ExitCode {
    fn from(err: &KdtraderError) -> Self {
        let code: u8 = match err {
            KdtraderError::Io(_) => 1,
            KdtraderError::ConfigParse { .. }
            | KdtraderError::ConfigMissing { .. }
            | KdtraderError::ConfigInvalid { .. } => 2,
            KdtraderError::Provider { .. } | KdtraderError::Subscribers { .. } => 3,
            KdtraderError::Signal(_) => 4,
            KdtraderError::NoData { .. } | KdtraderError::InsufficientHistory { .. } => 5,
            KdtraderError::Notification { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
