//! Pluggable record sources

use async_trait::async_trait;

use super::error::{RecordError, RecordResult};
use crate::core::types::{ClubRecord, Snapshot};

/// Anything that can produce the snapshot for a reporting period.
///
/// Implementations decide where records live (files, a database, an
/// upstream feed); the pipeline only sees validated snapshots.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load every record for `period`
    async fn load(&self, period: i32) -> RecordResult<Snapshot>;
}

/// Fixed in-memory records, filtered by period on load
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<ClubRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<ClubRecord>) -> Self {
        Self { records }
    }

    pub fn with_record(mut self, record: ClubRecord) -> Self {
        self.records.push(record);
        self
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn load(&self, period: i32) -> RecordResult<Snapshot> {
        let records: Vec<ClubRecord> = self
            .records
            .iter()
            .filter(|r| r.year == period)
            .cloned()
            .collect();

        if records.is_empty() {
            return Err(RecordError::SnapshotNotFound {
                path: format!("static:{}", period),
            });
        }

        Snapshot::new(period, records)
    }
}
