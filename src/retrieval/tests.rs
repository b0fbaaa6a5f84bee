//! Tests for the retrieval + narrative layer

use super::*;
use crate::embeddings::EmbeddingClient;
use crate::indexer::{IndexerConfig, IndexingPipeline};
use crate::test_support::{arsenal_and_brighton, numbered_clubs, BagOfWordsBackend, RecordingGenerator};
use crate::vector::{MemoryVectorIndex, VectorIndex, VectorIndexConfig};
use std::sync::Arc;
use std::time::Duration;

const DIM: usize = 64;

struct Fixture {
    backend: Arc<BagOfWordsBackend>,
    index: Arc<MemoryVectorIndex>,
    generator: Arc<RecordingGenerator>,
    service: NarrativeService,
}

fn fixture(backend: BagOfWordsBackend, generator: RecordingGenerator, config: NarrativeConfig) -> Fixture {
    let backend = Arc::new(backend);
    let index = Arc::new(MemoryVectorIndex::new(VectorIndexConfig::memory("clubs", DIM)));
    let generator = Arc::new(generator);
    let embedder = EmbeddingClient::new(backend.clone(), DIM, Duration::from_secs(2));
    let service = NarrativeService::new(embedder, index.clone(), generator.clone(), config);
    Fixture {
        backend,
        index,
        generator,
        service,
    }
}

async fn index_snapshot(fixture: &Fixture, snapshot: &crate::core::types::Snapshot) {
    let embedder = EmbeddingClient::new(fixture.backend.clone(), DIM, Duration::from_secs(2));
    let report = IndexingPipeline::new(embedder, fixture.index.clone(), IndexerConfig::default())
        .run(snapshot)
        .await
        .unwrap();
    assert!(report.is_complete());
}

#[test]
fn test_narrative_config_defaults() {
    let config = NarrativeConfig::default();
    assert_eq!(config.top_k, 3);
    assert_eq!(config.max_tokens, 2000);
    assert!((config.temperature - 0.3).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_lower_debt_question_cites_both_clubs() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::replying("Brighton carries less debt (£20.0M vs £100.0M)."),
        NarrativeConfig::default(),
    );
    index_snapshot(&fx, &arsenal_and_brighton(2024)).await;

    let answer = fx.service.answer("which club has lower debt?").await.unwrap();

    assert_eq!(answer.question, "which club has lower debt?");
    assert_eq!(answer.answer_text, "Brighton carries less debt (£20.0M vs £100.0M).");
    assert_eq!(answer.cited_entity_ids.len(), 2);
    assert!(answer.cited_entity_ids.contains(&"brighton".to_string()));
    assert!(answer.cited_entity_ids.contains(&"arsenal".to_string()));

    // Question and both clubs' metadata go out in one request
    let requests = fx.generator.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    assert!(prompt.contains("\"which club has lower debt?\""));
    assert!(prompt.contains("brighton: {"));
    assert!(prompt.contains("arsenal: {"));
    assert!(prompt.contains("\"debt\": 20000000.0"));
    assert_eq!(requests[0].max_tokens, 2000);
}

#[tokio::test]
async fn test_citations_follow_search_order_and_top_k() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::replying("ok"),
        NarrativeConfig::default().with_top_k(3),
    );
    index_snapshot(&fx, &numbered_clubs(2024, 6)).await;

    let question = "Club: club-4 revenue";
    let hits = fx.service.search_similar(question, 3).await.unwrap();
    let answer = fx.service.answer(question).await.unwrap();

    let expected: Vec<String> = hits.iter().map(|h| h.entity_id.clone()).collect();
    assert_eq!(answer.cited_entity_ids, expected);
    assert_eq!(answer.cited_entity_ids.len(), 3);

    // Context entries appear in the same order as the citations
    let prompt = &fx.generator.requests()[0].prompt;
    let positions: Vec<usize> = expected
        .iter()
        .map(|id| prompt.find(&format!("{}: {{", id)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_blank_question_makes_no_remote_calls() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::replying("unused"),
        NarrativeConfig::default(),
    );

    let err = fx.service.answer("").await.unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidInput { .. }));
    let err = fx.service.answer("   ").await.unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidInput { .. }));
    assert!(!err.is_retryable());

    assert_eq!(fx.backend.calls(), 0);
    assert_eq!(fx.generator.calls(), 0);
}

#[tokio::test]
async fn test_zero_k_is_invalid_input() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::replying("unused"),
        NarrativeConfig::default(),
    );

    let err = fx.service.search_similar("debt", 0).await.unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidInput { .. }));
    assert_eq!(fx.backend.calls(), 0);
}

#[tokio::test]
async fn test_empty_index_is_no_matches_not_failure() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::replying("unused"),
        NarrativeConfig::default(),
    );
    fx.index.ensure_schema().await.unwrap();

    let hits = fx.service.search_similar("which club has lower debt?", 3).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_unavailable_index_fails_at_query_stage() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::replying("unused"),
        NarrativeConfig::default(),
    );
    index_snapshot(&fx, &arsenal_and_brighton(2024)).await;
    fx.index.backing().set_available(false);

    let err = fx.service.answer("which club has lower debt?").await.unwrap_err();

    assert_eq!(err.stage(), Some(RetrievalStage::Query));
    assert!(err.is_retryable());
    assert_eq!(fx.generator.calls(), 0);
}

#[tokio::test]
async fn test_embedding_failure_fails_at_embedding_stage() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM).failing_on("debt"),
        RecordingGenerator::replying("unused"),
        NarrativeConfig::default(),
    );

    let err = fx.service.answer("which club has lower debt?").await.unwrap_err();

    assert_eq!(err.stage(), Some(RetrievalStage::Embedding));
    assert!(err.to_string().contains("embedding stage"));
    assert_eq!(fx.backend.calls(), 1);
    assert_eq!(fx.generator.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_is_terminal() {
    let fx = fixture(
        BagOfWordsBackend::new(DIM),
        RecordingGenerator::failing(),
        NarrativeConfig::default(),
    );
    index_snapshot(&fx, &arsenal_and_brighton(2024)).await;

    let err = fx.service.answer("which club has lower debt?").await.unwrap_err();

    assert!(matches!(err, RetrievalError::GenerationFailed(_)));
    assert_eq!(err.stage(), None);
    // One attempt only
    assert_eq!(fx.generator.calls(), 1);
}
