use thiserror::Error;

/// Failure talking to the structured-extraction service.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to reach extraction service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("extraction service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("extraction service reported an error: {0}")]
    Service(String),

    #[error("extraction payload does not match schema: {reason}")]
    Schema {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("extracted data point {index} is invalid: {reason}")]
    InvalidPoint { index: usize, reason: String },
}

impl ExtractionError {
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn schema_from(reason: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Schema {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts, connection failures, rate limiting and 5xx responses are
    /// transient; malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Error surfaced by an [`crate::Extractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no numeric data found in text")]
    NoDataFound,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
