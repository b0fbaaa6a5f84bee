//! Cloud text generation
//!
//! HTTP client for hosted language models. Supports the Anthropic messages
//! API and OpenAI-style chat completions. Each call is a single request:
//! failures are returned to the caller, who decides whether to try again.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::{InferenceError, InferenceResult};
use super::types::{ApiFormat, Generation, GenerationRequest};
use super::TextGenerator;
use crate::core::RateLimiter;

/// Cloud generation settings
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub format: ApiFormat,

    /// Full URL of the messages / chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Sent as `anthropic-version` with Anthropic-format requests
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Requests per minute limit
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
}

fn default_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_rpm() -> u32 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            format: ApiFormat::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            anthropic_version: default_anthropic_version(),
            timeout_ms: default_timeout_ms(),
            requests_per_minute: default_rpm(),
        }
    }
}

impl GenerationConfig {
    /// Create a new config for OpenAI chat completions
    pub fn openai(api_key: String) -> Self {
        Self {
            format: ApiFormat::OpenAi,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: Some(SecretString::new(api_key)),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        }
    }

    /// Create a new config for the Anthropic messages API
    pub fn anthropic(api_key: String) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key)),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Generative model reached over HTTP
pub struct CloudGenerator {
    /// HTTP client
    client: Client,

    config: GenerationConfig,

    /// Rate limiter
    rate_limiter: RateLimiter,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    total_tokens: u32,
}

impl CloudGenerator {
    pub fn new(config: GenerationConfig) -> InferenceResult<Self> {
        let rate_limiter = RateLimiter::new(config.requests_per_minute);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::NetworkError {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Get current configuration
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Get rate limiter reference
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn build_request(&self, request: &GenerationRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json");

        match self.config.format {
            ApiFormat::Anthropic => {
                let body = AnthropicRequest {
                    model: &self.config.model,
                    max_tokens: request.max_tokens,
                    temperature: request.temperature,
                    system: request.system.as_deref(),
                    messages: vec![ChatMessage {
                        role: "user",
                        content: &request.prompt,
                    }],
                };
                let builder = builder
                    .header("anthropic-version", &self.config.anthropic_version)
                    .json(&body);
                match &self.config.api_key {
                    Some(key) => builder.header("x-api-key", key.expose_secret()),
                    None => builder,
                }
            }
            ApiFormat::OpenAi => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = &request.system {
                    messages.push(ChatMessage {
                        role: "system",
                        content: system,
                    });
                }
                messages.push(ChatMessage {
                    role: "user",
                    content: &request.prompt,
                });
                let body = OpenAiRequest {
                    model: &self.config.model,
                    messages,
                    max_tokens: request.max_tokens,
                    temperature: request.temperature,
                };
                let builder = builder.json(&body);
                match &self.config.api_key {
                    Some(key) => builder.bearer_auth(key.expose_secret()),
                    None => builder,
                }
            }
        }
    }

    fn parse_response(&self, body: &str) -> InferenceResult<Generation> {
        let generation = match self.config.format {
            ApiFormat::Anthropic => {
                let parsed: AnthropicResponse = serde_json::from_str(body).map_err(|e| {
                    InferenceError::CloudApiError {
                        reason: format!("Failed to parse response: {}", e),
                    }
                })?;
                let text: String = parsed
                    .content
                    .iter()
                    .filter(|c| c.kind == "text")
                    .map(|c| c.text.as_str())
                    .collect();
                Generation {
                    text,
                    truncated: parsed.stop_reason.as_deref() == Some("max_tokens"),
                    tokens_used: parsed
                        .usage
                        .map(|u| u.input_tokens + u.output_tokens)
                        .unwrap_or(0),
                }
            }
            ApiFormat::OpenAi => {
                let parsed: OpenAiResponse = serde_json::from_str(body).map_err(|e| {
                    InferenceError::CloudApiError {
                        reason: format!("Failed to parse response: {}", e),
                    }
                })?;
                let choice = parsed.choices.into_iter().next();
                let truncated = choice
                    .as_ref()
                    .and_then(|c| c.finish_reason.as_deref())
                    == Some("length");
                Generation {
                    text: choice.and_then(|c| c.message.content).unwrap_or_default(),
                    truncated,
                    tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
                }
            }
        };

        if generation.text.trim().is_empty() {
            return Err(InferenceError::EmptyResponse);
        }
        Ok(generation)
    }
}

#[async_trait]
impl TextGenerator for CloudGenerator {
    async fn generate(&self, request: &GenerationRequest) -> InferenceResult<Generation> {
        if request.prompt.trim().is_empty() {
            return Err(InferenceError::InvalidRequest {
                reason: "prompt is empty".to_string(),
            });
        }

        // Acquire rate limit token
        self.rate_limiter.acquire().await?;

        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    InferenceError::NetworkError {
                        reason: format!("Request failed: {}", e),
                    }
                }
            })?;

        // Check for rate limit response - read Retry-After header
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(InferenceError::RateLimitExceeded {
                retry_after_secs: retry_after,
            });
        }

        let status = response.status();
        let body = response.text().await.map_err(|e| InferenceError::NetworkError {
            reason: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(InferenceError::CloudApiError {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let generation = self.parse_response(&body)?;
        if generation.truncated {
            tracing::warn!(
                max_tokens = request.max_tokens,
                "Generation stopped at the output token limit"
            );
        }
        tracing::debug!(
            "Cloud generation used {} tokens, model: {}",
            generation.tokens_used,
            self.config.model
        );

        Ok(generation)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
