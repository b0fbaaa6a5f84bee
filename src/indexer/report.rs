//! Batch indexing report

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Pipeline stage a record failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStage {
    /// Record could not be rendered into a document
    Render,
    Embedding,
    Upsert,
}

impl fmt::Display for IndexStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexStage::Render => write!(f, "render"),
            IndexStage::Embedding => write!(f, "embedding"),
            IndexStage::Upsert => write!(f, "upsert"),
        }
    }
}

/// One record that could not be indexed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexFailure {
    pub entity_id: String,
    pub stage: IndexStage,
    /// Calls made for the failing stage, including retries
    pub attempts: u32,
    pub reason: String,
}

/// Outcome of one record, produced by a worker
#[derive(Debug)]
pub(crate) enum RecordOutcome {
    Indexed(String),
    Failed(IndexFailure),
    Skipped(String),
}

/// What happened to every record in one run.
///
/// A run with failures is still a completed run: callers inspect `failed`
/// and `skipped` rather than receiving an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexReport {
    pub period: i32,
    /// Records embedded and upserted
    pub succeeded: Vec<String>,
    pub failed: Vec<IndexFailure>,
    /// Records not upserted because the run was cancelled
    pub skipped: Vec<String>,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl IndexReport {
    pub(crate) fn new(period: i32) -> Self {
        Self {
            period,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            cancelled: false,
            elapsed_ms: 0,
        }
    }

    pub(crate) fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Indexed(id) => self.succeeded.push(id),
            RecordOutcome::Failed(failure) => self.failed.push(failure),
            RecordOutcome::Skipped(id) => self.skipped.push(id),
        }
    }

    /// Sort every list by entity id so reports compare deterministically
    pub(crate) fn finish(&mut self, cancelled: bool, elapsed: Duration) {
        self.succeeded.sort();
        self.skipped.sort();
        self.failed.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        self.cancelled = cancelled;
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    /// Every record indexed, none failed or skipped
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && !self.cancelled
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.entity_id.as_str()).collect()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "period {}: {} succeeded, {} failed, {} skipped in {}ms",
            self.period,
            self.succeeded.len(),
            self.failed.len(),
            self.skipped.len(),
            self.elapsed_ms
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}
