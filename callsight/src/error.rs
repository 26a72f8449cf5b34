use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallsightError {
    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Malformed history: {0}")]
    MalformedHistory(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<regex::Error> for CallsightError {
    fn from(error: regex::Error) -> Self {
        CallsightError::Internal(format!("Invalid pattern: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, CallsightError>;
