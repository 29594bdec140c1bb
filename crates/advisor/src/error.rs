//! Typed error enum for the advisor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("all retries exhausted, last error: {0}")]
    RetriesExhausted(Box<AdvisorError>),
}

impl AdvisorError {
    /// Whether this error is transient and worth a retry (429 and 5xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 529),
            Self::RetriesExhausted(_) => false,
        }
    }
}
