//! Snapshot: every club record for one reporting period

use std::collections::HashSet;

use serde::Serialize;

use super::record::ClubRecord;
use crate::records::{RecordError, RecordResult};

/// The full, validated set of records for one period.
///
/// Construction enforces that each record belongs to `period`, has a
/// non-blank club id, and that `(club, year)` appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    period: i32,
    records: Vec<ClubRecord>,
}

impl Snapshot {
    pub fn new(period: i32, records: Vec<ClubRecord>) -> RecordResult<Self> {
        let mut seen = HashSet::with_capacity(records.len());

        for record in &records {
            if record.club.trim().is_empty() {
                return Err(RecordError::InvalidRecord {
                    reason: format!("record for period {} has a blank club id", record.year),
                });
            }
            if record.year != period {
                return Err(RecordError::PeriodMismatch {
                    club: record.club.clone(),
                    expected: period,
                    actual: record.year,
                });
            }
            if !seen.insert((record.club.as_str(), record.year)) {
                return Err(RecordError::DuplicateRecord {
                    club: record.club.clone(),
                    period,
                });
            }
        }

        Ok(Self { period, records })
    }

    pub fn period(&self) -> i32 {
        self.period
    }

    pub fn records(&self) -> &[ClubRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by club id
    pub fn get(&self, club: &str) -> Option<&ClubRecord> {
        self.records.iter().find(|r| r.club == club)
    }

    pub fn into_records(self) -> Vec<ClubRecord> {
        self.records
    }
}
