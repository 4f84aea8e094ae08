//! Catalog error types

use thiserror::Error;

use crate::source::Dataset;

/// Catalog error type
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the data host
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Local file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetch did not complete in time
    #[error("Fetching {dataset} timed out after {timeout_ms}ms")]
    Timeout { dataset: Dataset, timeout_ms: u64 },

    /// Dataset text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Every fallback strategy failed or was rejected
    #[error("All fallback strategies exhausted: {0}")]
    Exhausted(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
