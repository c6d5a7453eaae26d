use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Embedding request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding service returned {got} vectors for {expected} inputs")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Query used index generation {handle} but the active index is {active:?}")]
    StaleIndex { handle: u64, active: Option<u64> },

    #[error("Oracle not ready: {0}")]
    NotReady(String),

    #[error("Invalid oracle configuration: {0}")]
    Config(String),

    #[error("Similarity search timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum RaceError {
    #[error("Invalid page locator: {0}")]
    InvalidLocator(String),
}

pub type Result<T> = std::result::Result<T, OracleError>;
