//! Error types for the analysis module

use thiserror::Error;

use super::AnalysisKind;
use crate::inference::InferenceError;
use crate::records::RecordError;

/// Analysis run failures; any one of them aborts the whole run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Snapshot for period {period} is empty")]
    EmptySnapshot { period: i32 },

    #[error("{kind} analysis failed: {source}")]
    GenerationFailed {
        kind: AnalysisKind,
        #[source]
        source: InferenceError,
    },

    #[error("Failed to serialize records: {reason}")]
    SerializationError { reason: String },

    #[error("Failed to persist analysis: {0}")]
    Store(#[from] RecordError),
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
