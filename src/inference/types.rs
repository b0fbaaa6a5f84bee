//! Request and response types for text generation

use serde::{Deserialize, Serialize};

/// Wire format of the generation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// Messages API: `x-api-key`, `anthropic-version`, `content[].text`
    #[default]
    Anthropic,
    /// Chat completions: bearer auth, `choices[0].message.content`
    OpenAi,
}

/// One generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Optional system instruction
    pub system: Option<String>,
    /// User prompt, sent as a single message
    pub prompt: String,
    /// Output cap; the model may stop here and truncate
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 2000,
            temperature: 0.3,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Model output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    /// Text returned by the model, verbatim
    pub text: String,
    /// Model stopped because it hit `max_tokens`
    pub truncated: bool,
    /// Total tokens billed, when reported
    pub tokens_used: u32,
}
