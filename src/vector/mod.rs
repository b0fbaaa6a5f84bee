//! Vector index module
//!
//! Stores one document per club (rendered text, embedding, full record as
//! metadata) and answers k-nearest-neighbor queries. Two backends implement
//! the `VectorIndex` contract: exact in-process search and OpenSearch k-NN.

mod config;
mod document;
mod error;
mod index;
mod memory;
mod opensearch;

#[cfg(test)]
mod tests;

pub use config::{Distance, IndexBackend, VectorIndexConfig, Visibility};
pub use document::{Document, PendingDocument, QueryResult};
pub use error::{VectorError, VectorResult};
pub use index::VectorIndex;
pub use memory::{MemoryBacking, MemoryVectorIndex};
pub use opensearch::OpenSearchIndex;
