//! Error types for ffp-insight
//!
//! Each module owns its error enum; `FfpError` aggregates them for callers
//! that drive more than one stage (the binary and the wiring in `app`).

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::core::config::ConfigError;
use crate::embeddings::EmbeddingError;
use crate::indexer::IndexerError;
use crate::inference::InferenceError;
use crate::logging::LoggingError;
use crate::records::RecordError;
use crate::retrieval::RetrievalError;
use crate::vector::VectorError;

/// Result type alias for crate-level operations
pub type Result<T> = std::result::Result<T, FfpError>;

/// Main error type for ffp-insight
#[derive(Error, Debug)]
pub enum FfpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record store error: {0}")]
    Records(#[from] RecordError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),

    #[error("Indexing error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Generation error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Whether retrying the same call later may succeed.
///
/// Nothing in the crate retries on this signal except the indexing pipeline;
/// it is exposed so callers can build their own backoff.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for FfpError {
    fn is_retryable(&self) -> bool {
        match self {
            FfpError::Embedding(e) => e.is_retryable(),
            FfpError::Vector(e) => e.is_retryable(),
            FfpError::Inference(e) => e.is_retryable(),
            FfpError::Retrieval(e) => e.is_retryable(),
            FfpError::Config(_)
            | FfpError::Records(_)
            | FfpError::Indexer(_)
            | FfpError::Analysis(_)
            | FfpError::Logging(_) => false,
        }
    }
}
