//! Embedding client configuration

use secrecy::SecretString;
use serde::Deserialize;

/// Request/response shape spoken by the embedding endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFormat {
    /// `{model, input}` -> `data[0].embedding`
    #[default]
    OpenAi,
    /// `{inputText}` -> `embedding`
    Titan,
}

/// Remote embedding service settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Full URL the embedding request is posted to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token, if the endpoint needs one
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Model name sent with OpenAI-format requests
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub format: EmbeddingFormat,

    /// Vector length the model produces
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

pub(crate) fn default_dimension() -> usize {
    1536
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_rpm() -> u32 {
    600
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            format: EmbeddingFormat::default(),
            dimension: default_dimension(),
            timeout_ms: default_timeout_ms(),
            requests_per_minute: default_rpm(),
        }
    }
}

impl EmbeddingConfig {
    /// Titan-style endpoints encode the model in the URL
    pub fn requires_model(&self) -> bool {
        self.format == EmbeddingFormat::OpenAi
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_format(mut self, format: EmbeddingFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }
}
