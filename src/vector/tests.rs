//! Tests for the vector index module

use super::*;
use crate::core::types::ClubRecord;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn document(club: &str, vector: Vec<f32>) -> Document {
    let record = ClubRecord::new(club, 2024).with_revenue(100_000_000.0);
    PendingDocument::from_record(&record).unwrap().with_vector(vector)
}

async fn memory_index(dimension: usize) -> MemoryVectorIndex {
    let index = MemoryVectorIndex::new(VectorIndexConfig::memory("test-index", dimension));
    index.ensure_schema().await.unwrap();
    index
}

// ============================================================================
// Document Tests
// ============================================================================

#[test]
fn test_document_pairs_text_and_vector() {
    let record = ClubRecord::new("arsenal", 2024).with_debt(100_000_000.0);
    let pending = PendingDocument::from_record(&record).unwrap();
    assert_eq!(pending.id(), "arsenal");
    assert_eq!(pending.text(), record.rendered_text());

    let doc = pending.with_vector(vec![1.0, 0.0]);
    assert_eq!(doc.id(), "arsenal");
    assert_eq!(doc.period(), 2024);
    assert_eq!(doc.rendered_text(), record.rendered_text());
    assert_eq!(doc.metadata()["club"], "arsenal");
    assert_eq!(
        doc.content_hash(),
        blake3::hash(record.rendered_text().as_bytes()).to_hex().to_string()
    );
}

// ============================================================================
// Memory Index Tests
// ============================================================================

#[tokio::test]
async fn test_ensure_schema_idempotent() {
    let index = memory_index(4).await;
    index.ensure_schema().await.unwrap();
    index.ensure_schema().await.unwrap();
    assert_eq!(index.count().await.unwrap(), 0);
    assert_eq!(index.backing().collection_names().await, vec!["test-index".to_string()]);
}

#[tokio::test]
async fn test_ensure_schema_conflict() {
    let backing = MemoryBacking::new();
    let first = MemoryVectorIndex::with_backing(VectorIndexConfig::memory("shared", 4), backing.clone());
    first.ensure_schema().await.unwrap();

    let second = MemoryVectorIndex::with_backing(VectorIndexConfig::memory("shared", 8), backing);
    let err = second.ensure_schema().await.unwrap_err();
    assert!(matches!(
        err,
        VectorError::SchemaConflict { expected: 8, actual: 4, .. }
    ));
}

#[tokio::test]
async fn test_upsert_without_schema_fails() {
    let index = MemoryVectorIndex::new(VectorIndexConfig::memory("missing", 2));
    let err = index.upsert(document("arsenal", vec![1.0, 0.0])).await.unwrap_err();
    assert!(matches!(err, VectorError::CollectionNotFound { .. }));
}

#[tokio::test]
async fn test_upsert_and_get() {
    let index = memory_index(2).await;
    let doc = document("arsenal", vec![1.0, 0.0]);

    index.upsert(doc.clone()).await.unwrap();
    assert_eq!(index.get("arsenal").await.unwrap(), Some(doc));
    assert_eq!(index.get("chelsea").await.unwrap(), None);
}

#[tokio::test]
async fn test_upsert_replaces_whole_document() {
    let index = memory_index(2).await;
    index.upsert(document("arsenal", vec![1.0, 0.0])).await.unwrap();

    let updated = PendingDocument::from_record(&ClubRecord::new("arsenal", 2024).with_debt(5.0))
        .unwrap()
        .with_vector(vec![0.0, 1.0]);
    index.upsert(updated.clone()).await.unwrap();

    let stored = index.get("arsenal").await.unwrap().unwrap();
    assert_eq!(stored, updated);
    assert_eq!(index.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_rejects_wrong_dimension() {
    let index = memory_index(3).await;
    let err = index.upsert(document("arsenal", vec![1.0, 0.0])).await.unwrap_err();
    assert!(matches!(err, VectorError::InvalidDimension { expected: 3, actual: 2 }));
}

#[tokio::test]
async fn test_query_orders_by_score() {
    let index = memory_index(2).await;
    index.upsert(document("far", vec![0.0, 1.0])).await.unwrap();
    index.upsert(document("near", vec![1.0, 0.1])).await.unwrap();
    index.upsert(document("exact", vec![1.0, 0.0])).await.unwrap();

    let results = index.query(&[1.0, 0.0], 3).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["exact", "near", "far"]);
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(results[0].metadata["club"], "exact");
}

#[tokio::test]
async fn test_query_ties_keep_insertion_order() {
    let index = memory_index(2).await;
    for club in ["charlie", "alpha", "bravo"] {
        index.upsert(document(club, vec![1.0, 1.0])).await.unwrap();
    }
    // Replacing keeps the original position
    index.upsert(document("charlie", vec![1.0, 1.0])).await.unwrap();

    let results = index.query(&[1.0, 1.0], 10).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["charlie", "alpha", "bravo"]);
}

#[tokio::test]
async fn test_query_limit_validation() {
    let index = memory_index(2).await;
    assert!(matches!(
        index.query(&[1.0, 0.0], 0).await,
        Err(VectorError::InvalidLimit { k: 0 })
    ));
    assert!(matches!(
        index.query(&[1.0], 1).await,
        Err(VectorError::InvalidDimension { .. })
    ));
}

#[tokio::test]
async fn test_empty_index_returns_no_matches() {
    let index = memory_index(2).await;
    assert!(index.query(&[1.0, 0.0], 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_on_refresh_visibility() {
    let config = VectorIndexConfig::memory("staged", 2).with_visibility(Visibility::OnRefresh);
    let index = MemoryVectorIndex::new(config);
    index.ensure_schema().await.unwrap();

    index.upsert(document("arsenal", vec![1.0, 0.0])).await.unwrap();
    assert!(index.query(&[1.0, 0.0], 1).await.unwrap().is_empty());
    assert_eq!(index.count().await.unwrap(), 0);

    index.refresh().await.unwrap();
    assert_eq!(index.query(&[1.0, 0.0], 1).await.unwrap().len(), 1);
    assert_eq!(index.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_offline_backing_is_unavailable_not_empty() {
    let index = memory_index(2).await;
    index.upsert(document("arsenal", vec![1.0, 0.0])).await.unwrap();
    index.backing().set_available(false);

    assert!(matches!(
        index.query(&[1.0, 0.0], 3).await,
        Err(VectorError::Unavailable { .. })
    ));
    assert!(matches!(
        index.upsert(document("brighton", vec![0.0, 1.0])).await,
        Err(VectorError::Unavailable { .. })
    ));
    assert!(matches!(index.refresh().await, Err(VectorError::Unavailable { .. })));

    index.backing().set_available(true);
    assert_eq!(index.query(&[1.0, 0.0], 3).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_distance_metrics_rank_closest_first() {
    for distance in [Distance::Cosine, Distance::Euclidean, Distance::Dot] {
        let config = VectorIndexConfig::memory("metrics", 2).with_distance(distance);
        let index = MemoryVectorIndex::new(config);
        index.ensure_schema().await.unwrap();
        index.upsert(document("close", vec![0.9, 0.1])).await.unwrap();
        index.upsert(document("away", vec![-0.9, 0.1])).await.unwrap();

        let results = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].entity_id, "close", "metric {:?}", distance);
    }
}

#[tokio::test]
async fn test_handles_share_backing() {
    let backing = MemoryBacking::new();
    let writer = MemoryVectorIndex::with_backing(VectorIndexConfig::memory("shared", 2), backing.clone());
    let reader = MemoryVectorIndex::with_backing(VectorIndexConfig::memory("shared", 2), backing);
    writer.ensure_schema().await.unwrap();
    writer.upsert(document("arsenal", vec![1.0, 0.0])).await.unwrap();

    assert_eq!(reader.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_upserts_distinct_ids() {
    let index = Arc::new(memory_index(2).await);
    let mut handles = Vec::new();
    for i in 0..20 {
        let index = index.clone();
        handles.push(tokio::spawn(async move {
            index
                .upsert(document(&format!("club-{}", i), vec![i as f32, 1.0]))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(index.count().await.unwrap(), 20);
}

// ============================================================================
// Property Tests
// ============================================================================

fn vector_strategy(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, dim)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_query_respects_k_and_order(
        vectors in prop::collection::vec(vector_strategy(4), 0..20),
        query in vector_strategy(4),
        k in 1usize..10,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let index = memory_index(4).await;
            for (i, v) in vectors.iter().enumerate() {
                index.upsert(document(&format!("club-{}", i), v.clone())).await.unwrap();
            }

            let results = index.query(&query, k).await.unwrap();
            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(vectors.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_upsert_is_idempotent(
        vectors in prop::collection::vec(vector_strategy(3), 1..10),
        query in vector_strategy(3),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let once = memory_index(3).await;
            let twice = memory_index(3).await;
            for (i, v) in vectors.iter().enumerate() {
                let doc = document(&format!("club-{}", i), v.clone());
                once.upsert(doc.clone()).await.unwrap();
                twice.upsert(doc.clone()).await.unwrap();
                twice.upsert(doc).await.unwrap();
            }

            prop_assert_eq!(once.count().await.unwrap(), twice.count().await.unwrap());
            let a = once.query(&query, vectors.len()).await.unwrap();
            let b = twice.query(&query, vectors.len()).await.unwrap();
            prop_assert_eq!(a, b);
            Ok(())
        })?;
    }
}

// ============================================================================
// OpenSearch Tests
// ============================================================================

fn opensearch_index(server: &MockServer, dimension: usize) -> OpenSearchIndex {
    let config = VectorIndexConfig::opensearch(server.uri(), "ffp-vectors", dimension)
        .with_credentials("admin", "admin")
        .with_timeout_ms(2_000);
    OpenSearchIndex::new(config).unwrap()
}

#[tokio::test]
async fn test_opensearch_creates_missing_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ffp-vectors/_mapping"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "index_not_found_exception"}, "status": 404
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/ffp-vectors"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({
            "mappings": {"properties": {"vector": {
                "type": "knn_vector",
                "dimension": 3,
                "method": {"name": "hnsw", "space_type": "cosinesimil"}
            }}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;

    opensearch_index(&server, 3).ensure_schema().await.unwrap();
}

#[tokio::test]
async fn test_opensearch_existing_index_dimension_checked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ffp-vectors/_mapping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ffp-vectors": {"mappings": {"properties": {"vector": {"type": "knn_vector", "dimension": 1536}}}}
        })))
        .mount(&server)
        .await;

    opensearch_index(&server, 1536).ensure_schema().await.unwrap();

    let err = opensearch_index(&server, 3).ensure_schema().await.unwrap_err();
    assert!(matches!(
        err,
        VectorError::SchemaConflict { expected: 3, actual: 1536, .. }
    ));
}

#[tokio::test]
async fn test_opensearch_upsert_uses_club_as_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/ffp-vectors/_doc/Manchester%20City"))
        .and(body_partial_json(json!({"club": "Manchester City", "year": 2024})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
        .expect(1)
        .mount(&server)
        .await;

    let index = opensearch_index(&server, 2);
    index
        .upsert(document("Manchester City", vec![0.5, 0.5]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_opensearch_query_parses_hits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ffp-vectors/_search"))
        .and(body_partial_json(json!({"size": 2, "query": {"knn": {"vector": {"k": 2}}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {"hits": [
                {"_id": "brighton", "_score": 0.7, "_source": {"metadata": {"club": "brighton"}}},
                {"_id": "arsenal", "_score": 0.9, "_source": {"metadata": {"club": "arsenal"}}}
            ]}
        })))
        .mount(&server)
        .await;

    let results = opensearch_index(&server, 2).query(&[1.0, 0.0], 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].entity_id, "arsenal");
    assert_eq!(results[1].metadata["club"], "brighton");
}

#[tokio::test]
async fn test_opensearch_gateway_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let index = opensearch_index(&server, 2);
    assert!(matches!(
        index.query(&[1.0, 0.0], 3).await,
        Err(VectorError::Unavailable { .. })
    ));
    assert!(matches!(index.refresh().await, Err(VectorError::Unavailable { .. })));
}

#[tokio::test]
async fn test_opensearch_unreachable_is_unavailable() {
    let config = VectorIndexConfig::opensearch("http://127.0.0.1:1", "ffp-vectors", 2).with_timeout_ms(1_000);
    let index = OpenSearchIndex::new(config).unwrap();

    assert!(matches!(
        index.query(&[1.0, 0.0], 3).await,
        Err(VectorError::Unavailable { .. })
    ));
    assert!(matches!(
        index.upsert(document("arsenal", vec![1.0, 0.0])).await,
        Err(VectorError::Unavailable { .. })
    ));
    assert!(matches!(index.ensure_schema().await, Err(VectorError::Unavailable { .. })));
}

#[tokio::test]
async fn test_opensearch_get_and_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ffp-vectors/_doc/arsenal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "arsenal",
            "found": true,
            "_source": {
                "club": "arsenal",
                "year": 2024,
                "text_content": "Club: arsenal",
                "vector": [1.0, 0.0],
                "metadata": {"club": "arsenal"},
                "content_hash": "abc"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ffp-vectors/_doc/chelsea"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"_id": "chelsea", "found": false})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ffp-vectors/_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 20})))
        .mount(&server)
        .await;

    let index = opensearch_index(&server, 2);
    let doc = index.get("arsenal").await.unwrap().unwrap();
    assert_eq!(doc.rendered_text(), "Club: arsenal");
    assert_eq!(doc.vector(), &[1.0, 0.0]);
    assert!(index.get("chelsea").await.unwrap().is_none());
    assert_eq!(index.count().await.unwrap(), 20);
}

#[tokio::test]
async fn test_opensearch_malformed_count_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ffp-vectors/_count"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = opensearch_index(&server, 2).count().await.unwrap_err();
    assert!(matches!(err, VectorError::Serialization { .. }));
    assert!(!err.is_retryable());
}
