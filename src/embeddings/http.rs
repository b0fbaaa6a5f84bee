//! HTTP embedding backend
//!
//! Speaks either the OpenAI embeddings format or the Titan `inputText`
//! format. One request per call; retrying is left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::client::EmbeddingBackend;
use super::config::{EmbeddingConfig, EmbeddingFormat};
use super::error::{EmbeddingError, EmbeddingResult};
use crate::core::RateLimiter;

/// Embedding backend calling a remote HTTP endpoint
pub struct HttpEmbeddingBackend {
    client: Client,
    endpoint: String,
    model: String,
    format: EmbeddingFormat,
    api_key: Option<SecretString>,
    timeout_ms: u64,
    rate_limiter: RateLimiter,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiData>,
}

#[derive(Deserialize)]
struct OpenAiData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanRequest<'a> {
    input_text: &'a str,
}

#[derive(Deserialize)]
struct TitanResponse {
    embedding: Vec<f32>,
}

impl HttpEmbeddingBackend {
    pub fn new(config: &EmbeddingConfig) -> EmbeddingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EmbeddingError::ServiceFailed {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            format: config.format,
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
            rate_limiter: RateLimiter::new(config.requests_per_minute),
        })
    }

    fn request_body(&self, text: &str) -> EmbeddingResult<serde_json::Value> {
        let body = match self.format {
            EmbeddingFormat::OpenAi => serde_json::to_value(OpenAiRequest {
                model: &self.model,
                input: text,
            }),
            EmbeddingFormat::Titan => serde_json::to_value(TitanRequest {
                input_text: text,
            }),
        };

        body.map_err(|e| EmbeddingError::ServiceFailed {
            reason: format!("Failed to encode request: {}", e),
        })
    }

    fn parse_body(&self, body: &str) -> EmbeddingResult<Vec<f32>> {
        let parsed = match self.format {
            EmbeddingFormat::OpenAi => serde_json::from_str::<OpenAiResponse>(body)
                .map(|r| r.data.into_iter().next().map(|d| d.embedding)),
            EmbeddingFormat::Titan => {
                serde_json::from_str::<TitanResponse>(body).map(|r| Some(r.embedding))
            }
        };

        match parsed {
            Ok(Some(vector)) => Ok(vector),
            Ok(None) => Err(EmbeddingError::ServiceFailed {
                reason: "response contained no embeddings".to_string(),
            }),
            Err(e) => Err(EmbeddingError::ServiceFailed {
                reason: format!("Failed to parse response: {}", e),
            }),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed_raw(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.rate_limiter.acquire().await?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&self.request_body(text)?);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                EmbeddingError::ServiceFailed {
                    reason: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response.text().await.map_err(|e| EmbeddingError::ServiceFailed {
            reason: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(EmbeddingError::ServiceFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        self.parse_body(&body)
    }

    fn name(&self) -> &str {
        match self.format {
            EmbeddingFormat::OpenAi => "openai",
            EmbeddingFormat::Titan => "titan",
        }
    }
}
