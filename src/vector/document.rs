//! Documents stored in the vector index

use serde::Serialize;
use serde_json::Value;

use super::error::{VectorError, VectorResult};
use crate::core::types::ClubRecord;

/// A record rendered to text, waiting for its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDocument {
    id: String,
    period: i32,
    rendered_text: String,
    metadata: Value,
}

impl PendingDocument {
    /// Render `record` and capture it verbatim as metadata
    pub fn from_record(record: &ClubRecord) -> VectorResult<Self> {
        let metadata = record.to_metadata().map_err(|e| VectorError::Serialization {
            reason: format!("record {}: {}", record.entity_id(), e),
        })?;

        Ok(Self {
            id: record.entity_id().to_string(),
            period: record.period(),
            rendered_text: record.rendered_text(),
            metadata,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Text the vector must be computed from
    pub fn text(&self) -> &str {
        &self.rendered_text
    }

    /// Attach the vector computed for `text()`
    pub fn with_vector(self, vector: Vec<f32>) -> Document {
        let content_hash = blake3::hash(self.rendered_text.as_bytes()).to_hex().to_string();
        Document {
            id: self.id,
            period: self.period,
            rendered_text: self.rendered_text,
            vector,
            metadata: self.metadata,
            content_hash,
        }
    }
}

/// Unit of storage in the index: one record's text, vector and metadata.
///
/// Only obtainable through `PendingDocument::with_vector` (or by reading
/// back what an index stored), so the vector always belongs to the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    period: i32,
    rendered_text: String,
    vector: Vec<f32>,
    metadata: Value,
    content_hash: String,
}

impl Document {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn period(&self) -> i32 {
        self.period
    }

    pub fn rendered_text(&self) -> &str {
        &self.rendered_text
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// The full source record as JSON
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// blake3 hex digest of `rendered_text`
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Reassemble a document read back from a backing store
    pub(crate) fn restore(
        id: String,
        period: i32,
        rendered_text: String,
        vector: Vec<f32>,
        metadata: Value,
        content_hash: String,
    ) -> Self {
        Self {
            id,
            period,
            rendered_text,
            vector,
            metadata,
            content_hash,
        }
    }
}

/// One hit from a similarity query; higher score means more similar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub score: f32,
    pub entity_id: String,
    pub metadata: Value,
}
