//! The vector index contract

use async_trait::async_trait;

use super::document::{Document, QueryResult};
use super::error::VectorResult;

/// Searchable collection of documents keyed by id.
///
/// An unreachable backing store must surface as `VectorError::Unavailable`
/// from every operation; an empty `query` result always means "no matches".
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if absent; fail with `SchemaConflict` if it
    /// exists with another vector dimension.
    async fn ensure_schema(&self) -> VectorResult<()>;

    /// Insert or fully replace the document with the same id
    async fn upsert(&self, document: Document) -> VectorResult<()>;

    /// At most `k` results, score descending, ties in insertion order
    async fn query(&self, vector: &[f32], k: usize) -> VectorResult<Vec<QueryResult>>;

    /// Make every prior upsert visible to queries
    async fn refresh(&self) -> VectorResult<()>;

    /// Fetch a visible document by id
    async fn get(&self, id: &str) -> VectorResult<Option<Document>>;

    /// Number of visible documents
    async fn count(&self) -> VectorResult<u64>;

    /// Short name for logs
    fn name(&self) -> &str;
}
