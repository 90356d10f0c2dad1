//! Error types for data providers

use thiserror::Error;

/// Errors that can occur while fetching from an upstream data provider
///
/// Every variant is transient from the chain's point of view: the chain moves
/// on to the next provider, and the poller retries on its next tick.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Request did not complete within the provider's timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Response body did not match the expected schema
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Response was well-formed but carried no usable data
    #[error("Provider returned no usable data")]
    Empty,

    /// Every provider in a chain failed
    #[error("All providers failed for '{chain}': {}", .attempts.join("; "))]
    AllProvidersFailed { chain: String, attempts: Vec<String> },

    /// HTTP client could not be built
    #[error("Client setup failed: {0}")]
    Client(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
