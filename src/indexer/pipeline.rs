//! Indexing pipeline
//!
//! Brings the vector index into agreement with one snapshot: prepare the
//! schema, embed and upsert every record with bounded concurrency, then
//! refresh once. A record that fails is reported and the batch continues.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{IndexerError, IndexerResult};
use super::report::{IndexFailure, IndexReport, IndexStage, RecordOutcome};
use super::IndexerConfig;
use crate::core::types::{ClubRecord, Snapshot};
use crate::embeddings::{EmbeddingClient, EmbeddingError};
use crate::vector::{PendingDocument, VectorError, VectorIndex};

/// Record store to vector index synchronizer
pub struct IndexingPipeline {
    embedder: EmbeddingClient,
    index: Arc<dyn VectorIndex>,
    config: IndexerConfig,
}

impl IndexingPipeline {
    pub fn new(embedder: EmbeddingClient, index: Arc<dyn VectorIndex>, config: IndexerConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index every record of `snapshot`
    pub async fn run(&self, snapshot: &Snapshot) -> IndexerResult<IndexReport> {
        self.run_with_cancel(snapshot, CancellationToken::new()).await
    }

    /// Index `snapshot`, stopping new work once `cancel` fires.
    ///
    /// An in-flight embedding call finishes on its own but its record is
    /// not upserted; that record and every record not yet started are
    /// reported as skipped. The index is still refreshed so completed
    /// upserts become visible.
    pub async fn run_with_cancel(
        &self,
        snapshot: &Snapshot,
        cancel: CancellationToken,
    ) -> IndexerResult<IndexReport> {
        let started = Instant::now();
        info!(
            period = snapshot.period(),
            records = snapshot.len(),
            index = self.index.name(),
            max_concurrent = self.config.max_concurrent,
            "Starting indexing run"
        );

        self.index.ensure_schema().await.map_err(IndexerError::Schema)?;

        let outcomes: Vec<RecordOutcome> = stream::iter(snapshot.records())
            .map(|record| self.index_record(record, &cancel))
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut report = IndexReport::new(snapshot.period());
        for outcome in outcomes {
            report.record(outcome);
        }
        report.finish(cancel.is_cancelled(), started.elapsed());

        if let Err(source) = self.index.refresh().await {
            warn!(period = snapshot.period(), error = %source, "Index refresh failed");
            return Err(IndexerError::RefreshFailed {
                source,
                report: Box::new(report),
            });
        }

        info!("Indexing run finished: {}", report);
        Ok(report)
    }

    async fn index_record(&self, record: &ClubRecord, cancel: &CancellationToken) -> RecordOutcome {
        let entity_id = record.entity_id().to_string();
        if cancel.is_cancelled() {
            debug!(entity_id = %entity_id, "Skipping record, run cancelled");
            return RecordOutcome::Skipped(entity_id);
        }

        let pending = match PendingDocument::from_record(record) {
            Ok(pending) => pending,
            Err(e) => {
                warn!(entity_id = %entity_id, error = %e, "Failed to render record");
                return RecordOutcome::Failed(IndexFailure {
                    entity_id,
                    stage: IndexStage::Render,
                    attempts: 0,
                    reason: e.to_string(),
                });
            }
        };

        let vector = match self
            .with_retry(
                &entity_id,
                IndexStage::Embedding,
                cancel,
                || self.embedder.embed(pending.text()),
                EmbeddingError::is_retryable,
            )
            .await
        {
            Ok(vector) => vector,
            Err(failure) => return RecordOutcome::Failed(failure),
        };

        if cancel.is_cancelled() {
            debug!(entity_id = %entity_id, "Skipping upsert, run cancelled after embedding");
            return RecordOutcome::Skipped(entity_id);
        }

        let document = pending.with_vector(vector);
        match self
            .with_retry(
                &entity_id,
                IndexStage::Upsert,
                cancel,
                || self.index.upsert(document.clone()),
                VectorError::is_retryable,
            )
            .await
        {
            Ok(()) => {
                info!(entity_id = %entity_id, "Indexed record");
                RecordOutcome::Indexed(entity_id)
            }
            Err(failure) => RecordOutcome::Failed(failure),
        }
    }

    /// Run `op`, retrying retryable errors per the configured policy.
    /// Cancellation interrupts the backoff wait, not an in-flight call.
    async fn with_retry<T, E, F, Fut>(
        &self,
        entity_id: &str,
        stage: IndexStage,
        cancel: &CancellationToken,
        mut op: F,
        is_retryable: fn(&E) -> bool,
    ) -> Result<T, IndexFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let policy = &self.config.retry;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let retry_count = attempts - 1;
            if !policy.should_retry(retry_count, is_retryable(&error)) {
                warn!(
                    entity_id = %entity_id,
                    stage = %stage,
                    attempts,
                    error = %error,
                    "Failed to index record"
                );
                return Err(IndexFailure {
                    entity_id: entity_id.to_string(),
                    stage,
                    attempts,
                    reason: error.to_string(),
                });
            }

            let delay = policy.calculate_delay(retry_count);
            debug!(
                entity_id = %entity_id,
                stage = %stage,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after failure"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(entity_id = %entity_id, stage = %stage, "Run cancelled during retry backoff");
                    return Err(IndexFailure {
                        entity_id: entity_id.to_string(),
                        stage,
                        attempts,
                        reason: format!("cancelled before retry: {}", error),
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
