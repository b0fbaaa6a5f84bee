//! Application configuration
//!
//! Settings are layered: built-in defaults, then an optional config file
//! (JSON or TOML, picked by extension), then `FFP__SECTION__KEY`
//! environment variables. `AppConfig::validate` runs once at startup so a
//! bad endpoint or dimension fails before any remote client is built.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::embeddings::EmbeddingConfig;
use crate::indexer::IndexerConfig;
use crate::inference::GenerationConfig;
use crate::logging::LoggingConfig;
use crate::retrieval::NarrativeConfig;
use crate::vector::{IndexBackend, VectorIndexConfig};

/// Prefix for environment overrides, e.g. `FFP__EMBEDDING__ENDPOINT`
pub const ENV_PREFIX: &str = "FFP";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required setting: {field}")]
    Missing { field: String },

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding `ffp_data_<period>.json` and analysis files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote embedding service
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index backend and schema
    #[serde(default)]
    pub index: VectorIndexConfig,

    /// Remote generative-model service
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Indexing pipeline tuning
    #[serde(default)]
    pub indexer: IndexerConfig,

    /// Retrieval and narrative settings
    #[serde(default)]
    pub narrative: NarrativeConfig,

    /// Logging setup
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            embedding: EmbeddingConfig::default(),
            index: VectorIndexConfig::default(),
            generation: GenerationConfig::default(),
            indexer: IndexerConfig::default(),
            narrative: NarrativeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file plus the environment.
    ///
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);

        let config = Self::layered(path, env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file only, ignoring the environment
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn layered(path: Option<&Path>, env: Environment) -> ConfigResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder.add_source(env).build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Fail fast on settings that would only surface later as remote errors
    pub fn validate(&self) -> ConfigResult<()> {
        check_endpoint("embedding.endpoint", &self.embedding.endpoint)?;
        check_endpoint("generation.endpoint", &self.generation.endpoint)?;

        if self.embedding.model.trim().is_empty() && self.embedding.requires_model() {
            return Err(ConfigError::Missing {
                field: "embedding.model".to_string(),
            });
        }
        if self.generation.model.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "generation.model".to_string(),
            });
        }

        if self.embedding.dimension == 0 {
            return Err(invalid("embedding.dimension", "must be greater than zero"));
        }
        if self.index.dimension == 0 {
            return Err(invalid("index.dimension", "must be greater than zero"));
        }
        if self.embedding.dimension != self.index.dimension {
            return Err(invalid(
                "index.dimension",
                format!(
                    "embedding model produces {} dimensions but the index expects {}",
                    self.embedding.dimension, self.index.dimension
                ),
            ));
        }
        if self.index.index_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "index.index_name".to_string(),
            });
        }

        if self.index.backend == IndexBackend::OpenSearch {
            match &self.index.endpoint {
                Some(endpoint) => check_endpoint("index.endpoint", endpoint)?,
                None => {
                    return Err(ConfigError::Missing {
                        field: "index.endpoint".to_string(),
                    })
                }
            }
        }

        if self.narrative.top_k == 0 {
            return Err(invalid("narrative.top_k", "must be greater than zero"));
        }
        if self.narrative.max_tokens == 0 {
            return Err(invalid("narrative.max_tokens", "must be greater than zero"));
        }
        if self.indexer.max_concurrent == 0 {
            return Err(invalid("indexer.max_concurrent", "must be greater than zero"));
        }
        if self.embedding.timeout_ms == 0 || self.generation.timeout_ms == 0 {
            return Err(invalid("timeout_ms", "remote call timeouts must be non-zero"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_endpoint(field: &str, endpoint: &str) -> ConfigResult<()> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::Missing {
            field: field.to_string(),
        });
    }

    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| invalid(field, format!("not a valid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(field, format!("unsupported scheme '{}'", other))),
    }
}
