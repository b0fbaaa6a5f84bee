//! Record store error types

use thiserror::Error;

/// Record store errors
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Snapshot not found: {path}")]
    SnapshotNotFound { path: String },

    #[error("Record for {club} belongs to period {actual}, expected {expected}")]
    PeriodMismatch {
        club: String,
        expected: i32,
        actual: i32,
    },

    #[error("Duplicate record for {club} in period {period}")]
    DuplicateRecord { club: String, period: i32 },

    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("Failed to parse {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;
