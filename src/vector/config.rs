//! Vector index configuration

use secrecy::SecretString;
use serde::Deserialize;

use crate::embeddings::EmbeddingConfig;

/// Distance metric for vector similarity
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Cosine similarity (normalized dot product)
    #[default]
    Cosine,
    /// Euclidean distance (L2), reported as 1 / (1 + d)
    Euclidean,
    /// Dot product (inner product)
    Dot,
}

impl Distance {
    /// OpenSearch k-NN `space_type` for this metric
    pub fn space_type(&self) -> &'static str {
        match self {
            Distance::Cosine => "cosinesimil",
            Distance::Euclidean => "l2",
            Distance::Dot => "innerproduct",
        }
    }
}

/// When upserted documents become visible to queries
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible as soon as `upsert` returns
    #[default]
    Immediate,
    /// Staged until the next `refresh`
    OnRefresh,
}

/// Which backing store serves the index
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// In-process exact search
    #[default]
    Memory,
    /// Remote OpenSearch cluster with the k-NN plugin
    OpenSearch,
}

/// Vector index settings
#[derive(Debug, Clone, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Vector dimension; must match the embedding model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default)]
    pub distance: Distance,

    /// Only used by the memory backend; OpenSearch always needs a refresh
    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub backend: IndexBackend,

    /// Cluster URL for the OpenSearch backend
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<SecretString>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_index_name() -> String {
    "ffp-vectors".to_string()
}

fn default_dimension() -> usize {
    EmbeddingConfig::default().dimension
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            dimension: default_dimension(),
            distance: Distance::default(),
            visibility: Visibility::default(),
            backend: IndexBackend::default(),
            endpoint: None,
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl VectorIndexConfig {
    /// In-memory index named `index_name` with the given dimension
    pub fn memory(index_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            index_name: index_name.into(),
            dimension,
            ..Default::default()
        }
    }

    /// OpenSearch index at `endpoint`
    pub fn opensearch(endpoint: impl Into<String>, index_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            index_name: index_name.into(),
            dimension,
            backend: IndexBackend::OpenSearch,
            endpoint: Some(endpoint.into()),
            visibility: Visibility::OnRefresh,
            ..Default::default()
        }
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::new(password.into()));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
