//! Error types for the retrieval module

use std::fmt;

use thiserror::Error;

use crate::inference::InferenceError;

/// Step of `answer` that produced the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    /// Embedding the question
    Embedding,
    /// k-NN query against the index
    Query,
}

impl fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStage::Embedding => write!(f, "embedding"),
            RetrievalStage::Query => write!(f, "query"),
        }
    }
}

/// Terminal failures of a question. Nothing here is retried internally.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Context could not be determined; distinct from an empty match set
    #[error("Retrieval failed at {stage} stage: {reason}")]
    RetrievalFailed {
        stage: RetrievalStage,
        reason: String,
        retryable: bool,
    },

    #[error("Narrative generation failed: {0}")]
    GenerationFailed(#[source] InferenceError),
}

impl RetrievalError {
    /// Check if a caller may retry the same question later
    pub fn is_retryable(&self) -> bool {
        match self {
            RetrievalError::InvalidInput { .. } => false,
            RetrievalError::RetrievalFailed { retryable, .. } => *retryable,
            RetrievalError::GenerationFailed(e) => e.is_retryable(),
        }
    }

    /// Stage that failed, if the failure came before generation
    pub fn stage(&self) -> Option<RetrievalStage> {
        match self {
            RetrievalError::RetrievalFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;
