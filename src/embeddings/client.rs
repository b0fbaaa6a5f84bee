//! Embedding client
//!
//! Validates input, bounds each remote call with a timeout, and checks that
//! the returned vector has the deployment's dimension and only finite
//! components. Vectors are returned
//! as produced; nothing here normalizes or caches them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::config::EmbeddingConfig;
use super::error::{EmbeddingError, EmbeddingResult};

/// Raw access to an embedding model
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed one text; input has already been validated
    async fn embed_raw(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Text to fixed-length vector, D fixed per deployment
#[derive(Clone)]
pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
    dimension: usize,
    timeout: Duration,
}

impl EmbeddingClient {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, dimension: usize, timeout: Duration) -> Self {
        Self {
            backend,
            dimension,
            timeout,
        }
    }

    /// Build a client over `backend` using dimension and timeout from `config`
    pub fn from_config(backend: Arc<dyn EmbeddingBackend>, config: &EmbeddingConfig) -> Self {
        Self::new(backend, config.dimension, Duration::from_millis(config.timeout_ms))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `text`, rejecting blank input before any remote call
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput {
                reason: "text to embed is empty".to_string(),
            });
        }

        let vector = tokio::time::timeout(self.timeout, self.backend.embed_raw(text))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        if let Some(position) = vector.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFiniteVector { position });
        }

        tracing::trace!(backend = self.backend.name(), chars = text.len(), "Embedded text");
        Ok(vector)
    }
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("backend", &self.backend.name())
            .field("dimension", &self.dimension)
            .field("timeout", &self.timeout)
            .finish()
    }
}
