use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Search engine returned {status}: {reason}")]
    Search {
        status: u16,
        reason: String,
        body: Option<serde_json::Value>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Status code reported by the search engine, if the failure came from it.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Search { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
