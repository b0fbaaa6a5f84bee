//! Analysis runner

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use super::error::{AnalysisError, AnalysisResult};
use super::{AnalysisEntry, AnalysisKind, AnalysisRun};
use crate::core::types::Snapshot;
use crate::inference::{GenerationRequest, TextGenerator};
use crate::records::JsonSnapshotStore;
use crate::retrieval::NarrativeConfig;

/// Sends every `AnalysisKind` over a full snapshot, one request each
pub struct AnalysisRunner {
    generator: Arc<dyn TextGenerator>,
    config: NarrativeConfig,
}

impl AnalysisRunner {
    pub fn new(generator: Arc<dyn TextGenerator>, config: NarrativeConfig) -> Self {
        Self { generator, config }
    }

    /// Generate all analyses for `snapshot`. The first failure aborts the run.
    pub async fn run(&self, snapshot: &Snapshot) -> AnalysisResult<AnalysisRun> {
        if snapshot.is_empty() {
            return Err(AnalysisError::EmptySnapshot {
                period: snapshot.period(),
            });
        }

        let data = serde_json::to_string_pretty(snapshot.records()).map_err(|e| {
            AnalysisError::SerializationError {
                reason: e.to_string(),
            }
        })?;

        let mut analyses = Vec::with_capacity(AnalysisKind::ALL.len());
        for kind in AnalysisKind::ALL {
            let started = Instant::now();
            let prompt = format!("{}\n\nData: {}", kind.instruction(snapshot.period()), data);
            let request = GenerationRequest::new(prompt)
                .with_max_tokens(self.config.max_tokens)
                .with_temperature(self.config.temperature);

            let generation = self.generator.generate(&request).await.map_err(|source| {
                warn!(kind = %kind, error = %source, "Analysis failed");
                AnalysisError::GenerationFailed { kind, source }
            })?;

            info!(
                kind = %kind,
                period = snapshot.period(),
                truncated = generation.truncated,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analysis complete"
            );
            analyses.push(AnalysisEntry {
                kind,
                analysis: generation.text,
            });
        }

        Ok(AnalysisRun {
            timestamp: Utc::now(),
            analyses,
            raw_data: snapshot.records().to_vec(),
        })
    }

    /// Run and persist to `ffp_analysis_<period>.json` in `store`
    pub async fn run_and_save(
        &self,
        snapshot: &Snapshot,
        store: &JsonSnapshotStore,
    ) -> AnalysisResult<(AnalysisRun, PathBuf)> {
        let run = self.run(snapshot).await?;
        let path = store.save_analysis(snapshot.period(), &run).await?;
        info!(path = %path.display(), "Saved analysis");
        Ok((run, path))
    }
}
