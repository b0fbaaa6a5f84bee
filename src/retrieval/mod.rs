//! Retrieval + narrative layer
//!
//! Turns a free-text question into a grounded answer: similarity search over
//! indexed clubs, then one generation request carrying their metadata.

mod error;
mod prompt;
mod service;

#[cfg(test)]
mod tests;

pub use error::{RetrievalError, RetrievalResult, RetrievalStage};
pub use service::{Answer, NarrativeService};

use serde::Deserialize;

/// Narrative settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Documents pulled into the context
    pub top_k: usize,
    /// Output cap for the generated answer
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_tokens: 2000,
            temperature: 0.3,
        }
    }
}

impl NarrativeConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
