//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for valuedca.
#[derive(Debug, thiserror::Error)]
pub enum DcaError {
    #[error("invalid input for {ticker}: {reason}")]
    InvalidInput { ticker: String, reason: String },

    #[error("degenerate allocation: scores sum to {total}")]
    DegenerateAllocation { total: f64 },

    #[error("no price for {ticker} on {date}: {reason}")]
    PriceUnavailable {
        ticker: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("failed to submit {identifier}: {reason}")]
    Submission { identifier: String, reason: String },

    #[error("brokerage API error: {reason}")]
    Api { reason: String },

    #[error("CSV error: {reason}")]
    Csv { reason: String },

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DcaError {
    pub fn invalid_input(ticker: &str, reason: impl Into<String>) -> Self {
        DcaError::InvalidInput {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&DcaError> for std::process::ExitCode {
    fn from(err: &DcaError) -> Self {
        let code: u8 = match err {
            DcaError::Io(_) => 1,
            DcaError::ConfigParse { .. }
            | DcaError::ConfigMissing { .. }
            | DcaError::ConfigInvalid { .. } => 2,
            DcaError::Api { .. } | DcaError::Submission { .. } => 3,
            DcaError::InvalidInput { .. } | DcaError::DegenerateAllocation { .. } => 4,
            DcaError::PriceUnavailable { .. }
            | DcaError::Csv { .. }
            | DcaError::DuplicateTicker(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
