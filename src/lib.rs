//! ffp-insight - Financial Fair Play retrieval and narrative analysis
//!
//! This crate provides:
//! - Per-period club financial snapshots with a canonical text rendering
//! - Embedding and k-NN indexing of every club record
//! - A batch indexer tolerant of per-record failures
//! - Question answering grounded on the most similar clubs
//! - Batch narrative analyses persisted next to the snapshots

pub mod analysis;
pub mod app;
pub mod core;
pub mod embeddings;
pub mod indexer;
pub mod inference;
pub mod logging;
pub mod records;
pub mod retrieval;
pub mod vector;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use app::{AnalysisOutcome, App};
pub use core::config::AppConfig;
pub use core::error::{FfpError, Result, Retryable};
pub use core::types::{ClubRecord, Compliance, Snapshot};
pub use indexer::{IndexReport, IndexerError, IndexingPipeline};
pub use retrieval::{Answer, NarrativeService};
pub use vector::{VectorError, VectorIndex};
