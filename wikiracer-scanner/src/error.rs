use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("No article content found on {0}")]
    MissingContent(String),

    #[error("Fetching {url} timed out after {elapsed:?}")]
    Timeout { url: String, elapsed: Duration },
}

pub type Result<T> = std::result::Result<T, FetchError>;
