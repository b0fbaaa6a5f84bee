//! Error types for the indexer module

use thiserror::Error;

use super::report::IndexReport;
use crate::vector::VectorError;

/// Run-level indexing failures.
///
/// Per-record failures never show up here; they are collected in the
/// `IndexReport` and the run carries on.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Index could not be prepared; nothing was embedded or written
    #[error("Failed to prepare index: {0}")]
    Schema(#[source] VectorError),

    /// Records were processed but the final refresh failed, so some may not
    /// be visible to queries yet
    #[error("Index refresh failed after indexing period {}: {source}", .report.period)]
    RefreshFailed {
        #[source]
        source: VectorError,
        report: Box<IndexReport>,
    },

    /// The run was cancelled and a caller needs the full snapshot indexed
    #[error("Indexing cancelled: {report}")]
    Cancelled { report: Box<IndexReport> },
}

impl IndexerError {
    /// Partial report, when records were processed before the failure
    pub fn report(&self) -> Option<&IndexReport> {
        match self {
            IndexerError::Schema(_) => None,
            IndexerError::RefreshFailed { report, .. } | IndexerError::Cancelled { report } => {
                Some(report)
            }
        }
    }
}

/// Result type for indexer operations
pub type IndexerResult<T> = Result<T, IndexerError>;
