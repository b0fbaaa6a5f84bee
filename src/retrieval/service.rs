//! Question answering over the vector index
//!
//! `answer` embeds the question, pulls the top-k club documents, and sends
//! their metadata with the question to the generator in one request. Any
//! failure ends the question; partial results are never returned.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{RetrievalError, RetrievalResult, RetrievalStage};
use super::prompt::{context_block, question_prompt};
use super::NarrativeConfig;
use crate::embeddings::EmbeddingClient;
use crate::inference::{GenerationRequest, TextGenerator};
use crate::vector::{QueryResult, VectorIndex};

/// A narrative answer and the clubs it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    /// Model output, verbatim
    pub answer_text: String,
    /// Context entity ids in retrieval order
    pub cited_entity_ids: Vec<String>,
}

/// Retrieval + narrative service
pub struct NarrativeService {
    embedder: EmbeddingClient,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn TextGenerator>,
    config: NarrativeConfig,
}

impl NarrativeService {
    pub fn new(
        embedder: EmbeddingClient,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn TextGenerator>,
        config: NarrativeConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    /// Documents most similar to `question`, best first.
    ///
    /// An empty vec means the index holds nothing close; an unreachable
    /// index is always an error.
    pub async fn search_similar(&self, question: &str, k: usize) -> RetrievalResult<Vec<QueryResult>> {
        if question.trim().is_empty() {
            return Err(RetrievalError::InvalidInput {
                reason: "question is empty".to_string(),
            });
        }
        if k == 0 {
            return Err(RetrievalError::InvalidInput {
                reason: "result limit must be greater than zero".to_string(),
            });
        }

        let vector = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| RetrievalError::RetrievalFailed {
                stage: RetrievalStage::Embedding,
                retryable: e.is_retryable(),
                reason: e.to_string(),
            })?;

        let results = self
            .index
            .query(&vector, k)
            .await
            .map_err(|e| RetrievalError::RetrievalFailed {
                stage: RetrievalStage::Query,
                retryable: e.is_retryable(),
                reason: e.to_string(),
            })?;

        debug!(
            index = self.index.name(),
            k,
            hits = results.len(),
            "Similarity search complete"
        );
        Ok(results)
    }

    /// Answer `question` from the `top_k` closest clubs
    pub async fn answer(&self, question: &str) -> RetrievalResult<Answer> {
        let results = self.search_similar(question, self.config.top_k).await?;
        if results.is_empty() {
            warn!("No indexed clubs matched the question, generating without context");
        }

        let context = context_block(&results).map_err(|e| RetrievalError::RetrievalFailed {
            stage: RetrievalStage::Query,
            retryable: false,
            reason: e.to_string(),
        })?;

        let request = GenerationRequest::new(question_prompt(question, &context))
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        let generation = self
            .generator
            .generate(&request)
            .await
            .map_err(RetrievalError::GenerationFailed)?;

        let cited_entity_ids: Vec<String> = results.into_iter().map(|r| r.entity_id).collect();
        info!(
            model = self.generator.model(),
            cited = ?cited_entity_ids,
            truncated = generation.truncated,
            "Answered question"
        );

        Ok(Answer {
            question: question.to_string(),
            answer_text: generation.text,
            cited_entity_ids,
        })
    }
}
