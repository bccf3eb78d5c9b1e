use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (connection refused, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status. `detail` is FastAPI's
    /// `detail` field when present, else the raw body.
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The listing agent reported something other than success.
    #[error("listing generation failed: {0}")]
    Listing(String),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Setup(reqwest::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}
