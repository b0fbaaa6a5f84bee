//! Error types for the embedding client

use thiserror::Error;

use crate::core::RateLimitExceeded;

/// Result type for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors that can occur while embedding text
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Rejected before any remote call
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Transport or remote-service failure
    #[error("Embedding service failed: {reason}")]
    ServiceFailed { reason: String },

    /// Remote call did not finish in time
    #[error("Embedding request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Remote service or local limiter refused the call
    #[error("Embedding rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Service answered with a vector of the wrong length
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Service answered with NaN or infinite components
    #[error("Embedding contains a non-finite value at position {position}")]
    NonFiniteVector { position: usize },
}

impl From<RateLimitExceeded> for EmbeddingError {
    fn from(err: RateLimitExceeded) -> Self {
        EmbeddingError::RateLimited {
            retry_after_secs: err.retry_after_secs,
        }
    }
}

impl EmbeddingError {
    /// Everything except malformed caller input counts as a service error;
    /// a non-finite vector is not expected to change on a second call
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            EmbeddingError::InvalidInput { .. } | EmbeddingError::NonFiniteVector { .. }
        )
    }

    /// Get suggested retry delay in milliseconds
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            EmbeddingError::RateLimited { retry_after_secs } => Some(retry_after_secs * 1000),
            EmbeddingError::InvalidInput { .. } | EmbeddingError::NonFiniteVector { .. } => None,
            _ => Some(500),
        }
    }
}
