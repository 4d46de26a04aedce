use thiserror::Error;

/// Everything that can stop an ingestion run.
///
/// Configuration errors are fatal and surface to the caller. The rest are
/// turned into a [`crate::pipeline::RunOutcome`] and only logged.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingConfiguration(Vec<&'static str>),

    #[error("invalid configuration value for {name}: {reason}")]
    InvalidConfiguration { name: &'static str, reason: String },

    #[error("weather fetch failed: {0}")]
    FetchFailed(String),

    #[error("provider returned no records for {start} → {end}")]
    NoDataForRange { start: String, end: String },

    #[error("expected exactly one record, provider returned {0}")]
    UnexpectedRecordCount(usize),

    #[error("warehouse insert failed: {0}")]
    InsertFailed(String),
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the API key in its query string.
        IngestError::FetchFailed(e.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
