//! Error types for the expiry-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the expiry library.
///
/// Only configuration handling returns this. Extraction itself never fails
/// on input data; it degrades to a safe default result instead.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Extraction error that escaped to a caller.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Internal extraction conditions.
///
/// These are logged and converted into the degraded result, never surfaced
/// through `extract()`.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Date-like text that failed calendar validation.
    #[error("invalid date token {token:?}: {reason}")]
    InvalidDateToken { token: String, reason: String },

    /// Empty or whitespace-only input.
    #[error("no text provided")]
    NoTextProvided,

    /// The enrichment collaborator produced nothing.
    #[error("enrichment unavailable: {0}")]
    EnrichmentUnavailable(#[from] EnrichmentError),
}

impl ExtractionError {
    pub(crate) fn invalid_date(token: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDateToken {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures of the optional enrichment collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    /// The call did not complete within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with HTTP 429 or equivalent.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Authentication or authorization failed.
    #[error("unauthorized")]
    Unauthorized,

    /// The provider answered, but not with a usable candidate.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Transport failure or provider not reachable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl EnrichmentError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }
}

/// Result type for the expiry library.
pub type Result<T> = std::result::Result<T, EngineError>;
