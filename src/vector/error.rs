//! Vector index error types

use thiserror::Error;

/// Result type for vector index operations
pub type VectorResult<T> = Result<T, VectorError>;

/// Vector index specific errors
#[derive(Error, Debug)]
pub enum VectorError {
    /// Backing store could not be reached; never reported as an empty result
    #[error("Vector index unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Index {index} exists with vector dimension {actual}, expected {expected}")]
    SchemaConflict {
        index: String,
        expected: usize,
        actual: usize,
    },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid result limit: {k}")]
    InvalidLimit { k: usize },

    #[error("Failed to upsert document {id}: {reason}")]
    UpsertFailed { id: String, reason: String },

    #[error("Failed to search vectors: {reason}")]
    SearchFailed { reason: String },

    #[error("Index request {operation} failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl VectorError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VectorError::Unavailable { .. }
                | VectorError::UpsertFailed { .. }
                | VectorError::SearchFailed { .. }
        )
    }

    /// Get suggested retry delay in milliseconds
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            VectorError::Unavailable { .. } => Some(1000),
            VectorError::UpsertFailed { .. } => Some(500),
            VectorError::SearchFailed { .. } => Some(200),
            _ => None,
        }
    }
}
