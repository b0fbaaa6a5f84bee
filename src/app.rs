//! Service wiring
//!
//! Builds every service once from a validated `AppConfig` and hands each
//! one its collaborators explicitly. Tests use `App::with_services` to swap
//! in local doubles for the remote clients.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::analysis::{AnalysisRun, AnalysisRunner};
use crate::core::{AppConfig, Result};
use crate::embeddings::{EmbeddingBackend, EmbeddingClient, HttpEmbeddingBackend};
use crate::indexer::{IndexReport, IndexerError, IndexingPipeline};
use crate::inference::{CloudGenerator, TextGenerator};
use crate::records::{JsonSnapshotStore, RecordSource};
use crate::retrieval::{Answer, NarrativeService};
use crate::vector::{IndexBackend, MemoryVectorIndex, OpenSearchIndex, VectorIndex};

/// Result of `App::analyze`
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: IndexReport,
    pub run: AnalysisRun,
    pub path: PathBuf,
}

/// Fully wired application
pub struct App {
    config: AppConfig,
    store: JsonSnapshotStore,
    source: Arc<dyn RecordSource>,
    index: Arc<dyn VectorIndex>,
    pipeline: IndexingPipeline,
    narrative: NarrativeService,
    analysis: AnalysisRunner,
}

impl App {
    /// Build the remote clients described by `config`
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let backend: Arc<dyn EmbeddingBackend> = Arc::new(HttpEmbeddingBackend::new(&config.embedding)?);
        let index: Arc<dyn VectorIndex> = match config.index.backend {
            IndexBackend::Memory => Arc::new(MemoryVectorIndex::new(config.index.clone())),
            IndexBackend::OpenSearch => Arc::new(OpenSearchIndex::new(config.index.clone())?),
        };
        let generator: Arc<dyn TextGenerator> = Arc::new(CloudGenerator::new(config.generation.clone())?);

        info!(
            index = index.name(),
            index_name = %config.index.index_name,
            dimension = config.index.dimension,
            model = generator.model(),
            "Services configured"
        );

        Ok(Self::with_services(config, backend, index, generator))
    }

    /// Wire the given backends; records come from `config.data_dir`
    pub fn with_services(
        config: AppConfig,
        embedding_backend: Arc<dyn EmbeddingBackend>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let store = JsonSnapshotStore::new(&config.data_dir);
        let embedder = EmbeddingClient::from_config(embedding_backend, &config.embedding);

        let pipeline = IndexingPipeline::new(embedder.clone(), index.clone(), config.indexer.clone());
        let narrative = NarrativeService::new(
            embedder,
            index.clone(),
            generator.clone(),
            config.narrative.clone(),
        );
        let analysis = AnalysisRunner::new(generator, config.narrative.clone());

        Self {
            source: Arc::new(store.clone()),
            store,
            index,
            pipeline,
            narrative,
            analysis,
            config,
        }
    }

    /// Load snapshots from `source` instead of the data directory
    pub fn with_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &JsonSnapshotStore {
        &self.store
    }

    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn narrative(&self) -> &NarrativeService {
        &self.narrative
    }

    /// Load the snapshot for `period` and index it
    pub async fn index(&self, period: i32, cancel: CancellationToken) -> Result<IndexReport> {
        let snapshot = self.source.load(period).await?;
        Ok(self.pipeline.run_with_cancel(&snapshot, cancel).await?)
    }

    /// Answer a question from whatever is currently indexed
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        Ok(self.narrative.answer(question).await?)
    }

    /// Index `period`, generate every analysis, and persist the run.
    ///
    /// A cancelled indexing run stops here with `IndexerError::Cancelled`;
    /// no generation call is made and nothing is written.
    pub async fn analyze(&self, period: i32, cancel: CancellationToken) -> Result<AnalysisOutcome> {
        let snapshot = self.source.load(period).await?;
        let report = self.pipeline.run_with_cancel(&snapshot, cancel).await?;
        if report.cancelled {
            warn!(period, "Indexing cancelled, skipping analysis");
            return Err(IndexerError::Cancelled {
                report: Box::new(report),
            }
            .into());
        }
        let (run, path) = self.analysis.run_and_save(&snapshot, &self.store).await?;

        Ok(AnalysisOutcome { report, run, path })
    }
}
