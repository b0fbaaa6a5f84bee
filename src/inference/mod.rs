//! Generative-model client
//!
//! `TextGenerator` is the seam the narrative and analysis layers depend on;
//! `CloudGenerator` implements it over HTTP.

mod cloud;
mod error;
mod types;


pub use cloud::{CloudGenerator, GenerationConfig};
pub use error::{InferenceError, InferenceResult};
pub use types::{ApiFormat, Generation, GenerationRequest};

use async_trait::async_trait;

/// Produces free text from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> InferenceResult<Generation>;

    /// Model identifier, for logs and reports
    fn model(&self) -> &str;
}
