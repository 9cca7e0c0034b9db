//! Error taxonomy for ranking retrieval.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankingError>;

/// Failures surfaced by ranking and index sources.
#[derive(Error, Debug)]
pub enum RankingError {
    /// The requested school, year, phase or course is not published.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Retrieval failed at the network level; the caller may retry.
    #[error("Transient retrieval error: {0}")]
    Transient(String),

    /// The payload was retrieved but could not be decoded.
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl RankingError {
    /// Only transient failures are worth retrying. Nothing in this crate
    /// retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RankingError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RankingError::NotFound(_))
    }
}

impl From<std::io::Error> for RankingError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => RankingError::NotFound(err.to_string()),
            _ => RankingError::Io(err),
        }
    }
}

impl From<reqwest::Error> for RankingError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            RankingError::NotFound(err.to_string())
        } else {
            RankingError::Transient(err.to_string())
        }
    }
}
