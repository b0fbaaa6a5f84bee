//! OpenSearch k-NN backed vector index
//!
//! Talks to the cluster's REST API directly. Documents are stored with the
//! club id as `_id`, so re-indexing a record replaces it in place.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::config::VectorIndexConfig;
use super::document::{Document, QueryResult};
use super::error::{VectorError, VectorResult};
use super::index::VectorIndex;

/// Vector index stored in an OpenSearch cluster
pub struct OpenSearchIndex {
    client: Client,
    base: Url,
    config: VectorIndexConfig,
    username: Option<String>,
    password: Option<SecretString>,
}

/// `_source` layout of an indexed document
#[derive(Serialize, Deserialize)]
struct SourceDocument {
    club: String,
    year: i32,
    text_content: String,
    vector: Vec<f32>,
    metadata: Value,
    content_hash: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: f32,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Deserialize)]
struct HitSource {
    #[serde(default)]
    metadata: Value,
}

#[derive(Deserialize)]
struct GetResponse {
    found: bool,
    #[serde(rename = "_source")]
    source: Option<SourceDocument>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

impl OpenSearchIndex {
    pub fn new(config: VectorIndexConfig) -> VectorResult<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| VectorError::Unavailable {
            reason: "no OpenSearch endpoint configured".to_string(),
        })?;
        let base = Url::parse(&endpoint).map_err(|e| VectorError::Unavailable {
            reason: format!("invalid OpenSearch endpoint {}: {}", endpoint, e),
        })?;
        if base.cannot_be_a_base() {
            return Err(VectorError::Unavailable {
                reason: format!("invalid OpenSearch endpoint {}", endpoint),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| VectorError::Unavailable {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            config,
        })
    }

    pub fn config(&self) -> &VectorIndexConfig {
        &self.config
    }

    /// `{endpoint}/{index}/{segments..}` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.config.index_name).extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(
                username,
                self.password.as_ref().map(|p| p.expose_secret().to_string()),
            ),
            None => request,
        }
    }

    /// Send a request; transport failures and gateway errors mean the
    /// cluster is unavailable
    async fn send(&self, request: RequestBuilder) -> VectorResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| VectorError::Unavailable {
                reason: if e.is_timeout() {
                    format!("request timed out after {}ms", self.config.timeout_ms)
                } else {
                    format!("request failed: {}", e)
                },
            })?;

        match response.status() {
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                Err(VectorError::Unavailable {
                    reason: format!("HTTP {}", response.status()),
                })
            }
            _ => Ok(response),
        }
    }

    fn missing_collection(&self) -> VectorError {
        VectorError::CollectionNotFound {
            name: self.config.index_name.clone(),
        }
    }

    /// Dimension of the existing index, or `None` if it does not exist.
    /// An index without a `vector` field reports dimension 0.
    async fn existing_dimension(&self) -> VectorResult<Option<usize>> {
        let response = self.send(self.client.get(self.url(&["_mapping"]))).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = read_body(response).await?;
        if !status.is_success() {
            return Err(request_failed("get mapping", status, &body));
        }

        let mapping: Value = serde_json::from_str(&body).map_err(|e| VectorError::Serialization {
            reason: format!("invalid mapping response: {}", e),
        })?;
        let dimension = mapping
            .as_object()
            .and_then(|indices| indices.values().next())
            .and_then(|index| index.pointer("/mappings/properties/vector/dimension"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(Some(dimension as usize))
    }

    fn check_dimension(&self, actual: usize) -> VectorResult<()> {
        if actual == self.config.dimension {
            Ok(())
        } else {
            Err(VectorError::SchemaConflict {
                index: self.config.index_name.clone(),
                expected: self.config.dimension,
                actual,
            })
        }
    }

    fn index_body(&self) -> Value {
        json!({
            "settings": { "index": { "knn": true } },
            "mappings": {
                "properties": {
                    "club": { "type": "keyword" },
                    "year": { "type": "integer" },
                    "text_content": { "type": "text" },
                    "vector": {
                        "type": "knn_vector",
                        "dimension": self.config.dimension,
                        "method": {
                            "name": "hnsw",
                            "space_type": self.config.distance.space_type()
                        }
                    },
                    "metadata": { "type": "object", "enabled": false },
                    "content_hash": { "type": "keyword" }
                }
            }
        })
    }
}

#[async_trait]
impl VectorIndex for OpenSearchIndex {
    async fn ensure_schema(&self) -> VectorResult<()> {
        if let Some(actual) = self.existing_dimension().await? {
            return self.check_dimension(actual);
        }

        let response = self
            .send(self.client.put(self.url(&[])).json(&self.index_body()))
            .await?;
        let status = response.status();
        let body = read_body(response).await?;

        if status.is_success() {
            info!(index = %self.config.index_name, dimension = self.config.dimension, "Created OpenSearch index");
            return Ok(());
        }

        // Lost a creation race: validate whatever the winner created
        if body.contains("resource_already_exists_exception") {
            return match self.existing_dimension().await? {
                Some(actual) => self.check_dimension(actual),
                None => Err(self.missing_collection()),
            };
        }

        Err(request_failed("create index", status, &body))
    }

    async fn upsert(&self, document: Document) -> VectorResult<()> {
        if document.vector().len() != self.config.dimension {
            return Err(VectorError::InvalidDimension {
                expected: self.config.dimension,
                actual: document.vector().len(),
            });
        }

        let source = SourceDocument {
            club: document.id().to_string(),
            year: document.period(),
            text_content: document.rendered_text().to_string(),
            vector: document.vector().to_vec(),
            metadata: document.metadata().clone(),
            content_hash: document.content_hash().to_string(),
        };

        let response = self
            .send(self.client.put(self.url(&["_doc", document.id()])).json(&source))
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!(index = %self.config.index_name, id = %document.id(), "Upserted document");
            return Ok(());
        }

        let body = read_body(response).await?;
        if status == StatusCode::NOT_FOUND && body.contains("index_not_found_exception") {
            return Err(self.missing_collection());
        }
        Err(VectorError::UpsertFailed {
            id: document.id().to_string(),
            reason: format!("HTTP {}: {}", status, body),
        })
    }

    async fn query(&self, vector: &[f32], k: usize) -> VectorResult<Vec<QueryResult>> {
        if k == 0 {
            return Err(VectorError::InvalidLimit { k });
        }
        if vector.len() != self.config.dimension {
            return Err(VectorError::InvalidDimension {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }

        let search_body = json!({
            "size": k,
            "query": { "knn": { "vector": { "vector": vector, "k": k } } },
            "_source": { "excludes": ["vector"] }
        });

        let response = self
            .send(self.client.post(self.url(&["_search"])).json(&search_body))
            .await?;
        let status = response.status();
        let body = read_body(response).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(self.missing_collection());
        }
        if !status.is_success() {
            return Err(VectorError::SearchFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| VectorError::SearchFailed {
            reason: format!("Failed to parse search response: {}", e),
        })?;

        // Stable sort keeps the cluster's order for equal scores
        let mut results: Vec<QueryResult> = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| QueryResult {
                score: hit.score,
                entity_id: hit.id,
                metadata: hit.source.metadata,
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        debug!("Search returned {} results (limit: {})", results.len(), k);
        Ok(results)
    }

    async fn refresh(&self) -> VectorResult<()> {
        let response = self.send(self.client.post(self.url(&["_refresh"]))).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(self.missing_collection());
        }

        let body = read_body(response).await?;
        Err(request_failed("refresh", status, &body))
    }

    async fn get(&self, id: &str) -> VectorResult<Option<Document>> {
        let response = self.send(self.client.get(self.url(&["_doc", id]))).await?;
        let status = response.status();
        let body = read_body(response).await?;

        if status == StatusCode::NOT_FOUND && body.contains("index_not_found_exception") {
            return Err(self.missing_collection());
        }
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(request_failed("get document", status, &body));
        }

        let parsed: GetResponse = serde_json::from_str(&body).map_err(|e| VectorError::Serialization {
            reason: format!("invalid document response: {}", e),
        })?;

        Ok(match (parsed.found, parsed.source) {
            (true, Some(source)) => Some(Document::restore(
                source.club,
                source.year,
                source.text_content,
                source.vector,
                source.metadata,
                source.content_hash,
            )),
            _ => None,
        })
    }

    async fn count(&self) -> VectorResult<u64> {
        let response = self.send(self.client.get(self.url(&["_count"]))).await?;
        let status = response.status();
        let body = read_body(response).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(self.missing_collection());
        }
        if !status.is_success() {
            return Err(request_failed("count", status, &body));
        }

        let parsed: CountResponse = serde_json::from_str(&body).map_err(|e| VectorError::Serialization {
            reason: format!("invalid count response: {}", e),
        })?;
        Ok(parsed.count)
    }

    fn name(&self) -> &str {
        "opensearch"
    }
}

async fn read_body(response: Response) -> VectorResult<String> {
    response.text().await.map_err(|e| VectorError::Unavailable {
        reason: format!("failed to read response body: {}", e),
    })
}

fn request_failed(operation: &str, status: StatusCode, body: &str) -> VectorError {
    VectorError::RequestFailed {
        operation: operation.to_string(),
        reason: format!("HTTP {}: {}", status, body),
    }
}
