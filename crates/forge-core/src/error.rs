//! Error types for funnelforge.

use thiserror::Error;

/// Result type alias using funnelforge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for funnelforge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// State-store operation failed (wraps redis errors)
    #[error("Store error: {0}")]
    Store(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No job record exists for the given token
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Chat completion failed
    #[error("Completion error: {0}")]
    Completion(String),

    /// Relevance ranking failed
    #[error("Ranking error: {0}")]
    Ranking(String),

    /// Embedding vectors have different lengths
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Background job error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (surfaced as HTTP 400 before any token is issued)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transient collaborator faults (network, store, upstream model hiccups)
    /// are retried up to the configured bound; permanent faults (missing
    /// resources, bad input, auth failures) short-circuit the retry loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Store(_)
            | Error::Request(_)
            | Error::Embedding(_)
            | Error::Completion(_)
            | Error::Io(_)
            | Error::Internal(_) => true,
            Error::NotFound(_)
            | Error::RequestNotFound(_)
            | Error::Ranking(_)
            | Error::DimensionMismatch { .. }
            | Error::Job(_)
            | Error::Serialization(_)
            | Error::Config(_)
            | Error::InvalidInput(_)
            | Error::Unauthorized(_) => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Store(e.to_string())
    }
}
