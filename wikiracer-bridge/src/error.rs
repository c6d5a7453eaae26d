use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("No viewer connected within {0:?}")]
    StartupTimeout(Duration),

    #[error("Failed to launch display '{command}': {source}")]
    Display {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Event hub closed")]
    Closed,

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
