//! In-process vector index with exact search
//!
//! Collections live in a `MemoryBacking` that several index handles can
//! share, the way several clients share one remote cluster. The backing can
//! be switched offline to exercise outage handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::config::{Distance, VectorIndexConfig, Visibility};
use super::document::{Document, QueryResult};
use super::error::{VectorError, VectorResult};
use super::index::VectorIndex;

/// Shared storage for in-memory collections
#[derive(Debug)]
pub struct MemoryBacking {
    collections: RwLock<HashMap<String, Collection>>,
    available: AtomicBool,
}

#[derive(Debug)]
struct Collection {
    dimension: usize,
    next_seq: u64,
    visible: HashMap<String, StoredDocument>,
    pending: HashMap<String, StoredDocument>,
}

/// Document plus the order in which its id was first inserted
#[derive(Debug, Clone)]
struct StoredDocument {
    seq: u64,
    document: Document,
}

impl Default for MemoryBacking {
    fn default() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryBacking {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate the store going down (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Names of existing collections
    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    fn check_available(&self) -> VectorResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(VectorError::Unavailable {
                reason: "in-memory backing is offline".to_string(),
            })
        }
    }
}

/// Vector index over a `MemoryBacking`
pub struct MemoryVectorIndex {
    config: VectorIndexConfig,
    backing: Arc<MemoryBacking>,
}

impl MemoryVectorIndex {
    /// Index with its own private backing
    pub fn new(config: VectorIndexConfig) -> Self {
        Self::with_backing(config, MemoryBacking::new())
    }

    /// Index over a shared backing
    pub fn with_backing(config: VectorIndexConfig, backing: Arc<MemoryBacking>) -> Self {
        Self { config, backing }
    }

    pub fn config(&self) -> &VectorIndexConfig {
        &self.config
    }

    pub fn backing(&self) -> &Arc<MemoryBacking> {
        &self.backing
    }

    fn missing_collection(&self) -> VectorError {
        VectorError::CollectionNotFound {
            name: self.config.index_name.clone(),
        }
    }

    /// Validate that a vector has the correct dimension
    fn validate_vector_dimension(&self, vector: &[f32]) -> VectorResult<()> {
        let expected = self.config.dimension;
        let actual = vector.len();

        if actual != expected {
            return Err(VectorError::InvalidDimension { expected, actual });
        }

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_schema(&self) -> VectorResult<()> {
        self.backing.check_available()?;

        let mut collections = self.backing.collections.write().await;
        match collections.get(&self.config.index_name) {
            Some(existing) if existing.dimension != self.config.dimension => {
                Err(VectorError::SchemaConflict {
                    index: self.config.index_name.clone(),
                    expected: self.config.dimension,
                    actual: existing.dimension,
                })
            }
            Some(_) => Ok(()),
            None => {
                collections.insert(
                    self.config.index_name.clone(),
                    Collection {
                        dimension: self.config.dimension,
                        next_seq: 0,
                        visible: HashMap::new(),
                        pending: HashMap::new(),
                    },
                );
                debug!(index = %self.config.index_name, dimension = self.config.dimension, "Created collection");
                Ok(())
            }
        }
    }

    async fn upsert(&self, document: Document) -> VectorResult<()> {
        self.backing.check_available()?;
        self.validate_vector_dimension(document.vector())?;

        let mut collections = self.backing.collections.write().await;
        let collection = collections
            .get_mut(&self.config.index_name)
            .ok_or_else(|| self.missing_collection())?;

        let id = document.id().to_string();
        let existing_seq = collection
            .pending
            .get(&id)
            .or_else(|| collection.visible.get(&id))
            .map(|existing| existing.seq);
        let seq = match existing_seq {
            Some(seq) => seq,
            None => {
                let seq = collection.next_seq;
                collection.next_seq += 1;
                seq
            }
        };

        let stored = StoredDocument { seq, document };
        match self.config.visibility {
            Visibility::Immediate => {
                collection.visible.insert(id.clone(), stored);
            }
            Visibility::OnRefresh => {
                collection.pending.insert(id.clone(), stored);
            }
        }

        debug!(index = %self.config.index_name, id = %id, "Upserted document");
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> VectorResult<Vec<QueryResult>> {
        self.backing.check_available()?;
        if k == 0 {
            return Err(VectorError::InvalidLimit { k });
        }
        self.validate_vector_dimension(vector)?;

        let collections = self.backing.collections.read().await;
        let collection = collections
            .get(&self.config.index_name)
            .ok_or_else(|| self.missing_collection())?;

        let mut scored: Vec<(f32, &StoredDocument)> = collection
            .visible
            .values()
            .map(|stored| (similarity(self.config.distance, vector, stored.document.vector()), stored))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.seq.cmp(&b.1.seq)));

        let results: Vec<QueryResult> = scored
            .into_iter()
            .take(k)
            .map(|(score, stored)| QueryResult {
                score,
                entity_id: stored.document.id().to_string(),
                metadata: stored.document.metadata().clone(),
            })
            .collect();

        debug!("Search returned {} results (limit: {})", results.len(), k);
        Ok(results)
    }

    async fn refresh(&self) -> VectorResult<()> {
        self.backing.check_available()?;

        let mut collections = self.backing.collections.write().await;
        let collection = collections
            .get_mut(&self.config.index_name)
            .ok_or_else(|| self.missing_collection())?;

        let staged = collection.pending.len();
        let pending = std::mem::take(&mut collection.pending);
        collection.visible.extend(pending);

        debug!(index = %self.config.index_name, staged, "Refreshed collection");
        Ok(())
    }

    async fn get(&self, id: &str) -> VectorResult<Option<Document>> {
        self.backing.check_available()?;

        let collections = self.backing.collections.read().await;
        let collection = collections
            .get(&self.config.index_name)
            .ok_or_else(|| self.missing_collection())?;

        Ok(collection.visible.get(id).map(|stored| stored.document.clone()))
    }

    async fn count(&self) -> VectorResult<u64> {
        self.backing.check_available()?;

        let collections = self.backing.collections.read().await;
        let collection = collections
            .get(&self.config.index_name)
            .ok_or_else(|| self.missing_collection())?;

        Ok(collection.visible.len() as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Similarity under `distance`; higher always means closer
pub(crate) fn similarity(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Euclidean => euclidean_similarity(a, b),
        Distance::Dot => dot_product(a, b),
    }
}

/// Returns a value between -1 and 1, where 1 means identical direction
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Converts L2 distance to similarity: 1 / (1 + distance)
fn euclidean_similarity(a: &[f32], b: &[f32]) -> f32 {
    let distance: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt();

    1.0 / (1.0 + distance)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
