//! File-backed snapshot store
//!
//! Layout under `data_dir`:
//! - `ffp_data_<period>.json`: pretty JSON array of club records
//! - `ffp_analysis_<period>.json`: one analysis run object
//!
//! Writes go to a temp file first and are renamed into place, so a reader
//! never sees a half-written snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{RecordError, RecordResult};
use super::source::RecordSource;
use crate::core::types::{ClubRecord, Snapshot};

/// Reads and writes snapshot files in one directory
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    data_dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the records file for `period`
    pub fn data_path(&self, period: i32) -> PathBuf {
        self.data_dir.join(format!("ffp_data_{}.json", period))
    }

    /// Path of the analysis file for `period`
    pub fn analysis_path(&self, period: i32) -> PathBuf {
        self.data_dir.join(format!("ffp_analysis_{}.json", period))
    }

    /// Persist a snapshot, replacing any existing file for its period
    pub async fn save_snapshot(&self, snapshot: &Snapshot) -> RecordResult<PathBuf> {
        let path = self.data_path(snapshot.period());
        write_json_atomic(&path, snapshot.records()).await?;
        tracing::info!(
            period = snapshot.period(),
            records = snapshot.len(),
            path = %path.display(),
            "Saved snapshot"
        );
        Ok(path)
    }

    /// Persist an analysis run for `period`
    pub async fn save_analysis<T: Serialize + Sync>(&self, period: i32, run: &T) -> RecordResult<PathBuf> {
        let path = self.analysis_path(period);
        write_json_atomic(&path, run).await?;
        tracing::info!(period, path = %path.display(), "Saved analysis run");
        Ok(path)
    }

    /// Load a previously saved analysis run
    pub async fn load_analysis<T: DeserializeOwned>(&self, period: i32) -> RecordResult<T> {
        let path = self.analysis_path(period);
        read_json(&path).await
    }
}

#[async_trait]
impl RecordSource for JsonSnapshotStore {
    async fn load(&self, period: i32) -> RecordResult<Snapshot> {
        let path = self.data_path(period);
        let records: Vec<ClubRecord> = read_json(&path).await?;
        tracing::debug!(period, records = records.len(), "Loaded snapshot file");
        Snapshot::new(period, records)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> RecordResult<T> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RecordError::SnapshotNotFound {
                path: path.display().to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| RecordError::ParseFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> RecordResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| RecordError::SerializationError {
        reason: e.to_string(),
    })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &content).await?;
    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}
