//! Batch indexer for club records
//!
//! Embeds each record of a snapshot and upserts it into the vector index.
//! Per-record failures are retried with exponential backoff, then reported
//! without aborting the batch.

mod error;
mod pipeline;
mod report;


pub use error::{IndexerError, IndexerResult};
pub use pipeline::IndexingPipeline;
pub use report::{IndexFailure, IndexReport, IndexStage};

use serde::Deserialize;
use std::time::Duration;

/// Configuration for the indexing pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Records processed at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-record retry behaviour
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            retry: RetryPolicy::default(),
        }
    }
}

impl IndexerConfig {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Retry policy for per-record embedding and upsert calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff (milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay cap (milliseconds)
    pub max_delay_ms: u64,
    /// Whether to use jitter
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8000,
            use_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Retries without waiting, for tests and local backends
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
            use_jitter: false,
        }
    }

    /// Calculate exponential backoff delay
    ///
    /// Formula: base_delay * 2^retry_count, capped at max_delay, with
    /// ±25% jitter when enabled.
    pub fn calculate_delay(&self, retry_count: u32) -> Duration {
        self.calculate_delay_with_jitter(retry_count, rand::random::<f64>())
    }

    /// Same as `calculate_delay` with an explicit jitter sample in [0, 1)
    pub fn calculate_delay_with_jitter(&self, retry_count: u32, jitter_random: f64) -> Duration {
        let multiplier = 1u64 << retry_count.min(10); // Cap to prevent overflow
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        let capped_delay_ms = delay_ms.min(self.max_delay_ms);

        if self.use_jitter {
            let jitter_factor = 0.75 + jitter_random * 0.5;
            Duration::from_millis((capped_delay_ms as f64 * jitter_factor) as u64)
        } else {
            Duration::from_millis(capped_delay_ms)
        }
    }

    /// Check if retry should be attempted
    pub fn should_retry(&self, retry_count: u32, retryable: bool) -> bool {
        retryable && retry_count < self.max_retries
    }
}
