//! Error taxonomy for the discovery pipeline.
//!
//! Only [`NewsError::Config`] is fatal. Everything else is reported per call
//! and the caller decides whether to skip the source or the country.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsError {
    /// The curated dataset or another startup input could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// No tier of the resolver chain knows this country name.
    #[error("country not found: {0}")]
    NotFound(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("feed parse error: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NewsError {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NewsError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            NewsError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
