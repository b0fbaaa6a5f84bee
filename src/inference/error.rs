//! Error types for the generation client

use thiserror::Error;

use crate::core::RateLimitExceeded;

/// Errors from the generative-model service
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Request was malformed before it was sent
    #[error("Invalid generation request: {reason}")]
    InvalidRequest { reason: String },

    /// Cloud API answered with an error status or unreadable body
    #[error("Cloud API error: {reason}")]
    CloudApiError { reason: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Network error
    #[error("Network error: {reason}")]
    NetworkError { reason: String },

    /// Timeout error
    #[error("Inference timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Model returned no text
    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl InferenceError {
    /// Check if the error is worth retrying later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceError::NetworkError { .. }
                | InferenceError::Timeout { .. }
                | InferenceError::RateLimitExceeded { .. }
                | InferenceError::CloudApiError { .. }
        )
    }
}

impl From<RateLimitExceeded> for InferenceError {
    fn from(err: RateLimitExceeded) -> Self {
        InferenceError::RateLimitExceeded {
            retry_after_secs: err.retry_after_secs,
        }
    }
}

/// Result type for inference operations
pub type InferenceResult<T> = Result<T, InferenceError>;
