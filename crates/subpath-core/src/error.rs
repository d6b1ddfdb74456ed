//! Error types shared by the transport and cache-storage seams.

use thiserror::Error;

/// Failure to obtain a response from the network.
///
/// Never surfaced to page code directly by the offline worker: strategies
/// turn it into a cached fallback or `Response::error()`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("network failure for {url}: {message}")]
    Network { url: String, message: String },
    #[error("transport task failed: {0}")]
    Task(String),
}

impl TransportError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Network {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Every candidate of a multi-URL fetch failed.
#[derive(Debug, Error)]
#[error("fetch failed for all of {attempted:?}: {last}")]
pub struct FetchChainError {
    /// Absolute URLs tried, in order.
    pub attempted: Vec<String>,
    /// Why the last candidate failed.
    pub last: String,
}

/// Failure of the cache storage backend. Treated as best-effort everywhere.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("corrupt cache entry for {url}: {reason}")]
    Corrupt { url: String, reason: String },
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache location: {0}")]
    Location(#[from] xdg::BaseDirectoriesError),
}
