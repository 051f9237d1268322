use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote call failed or returned data we could not use.
    /// Recoverable on the next scheduled poll.
    #[error("transient fetch error: {0}")]
    TransientFetch(String),
    #[error("config file not found: {0}")]
    ConfigMissing(PathBuf),
    #[error("malformed config: {0}")]
    ConfigMalformed(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("could not resolve home directory")]
    HomeDir,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::TransientFetch(err.to_string())
    }
}

impl ApiError {
    /// True for failures that the poll loop should log and retry next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::TransientFetch(_))
    }
}
