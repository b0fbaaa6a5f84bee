//! Deterministic test doubles shared by unit tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::types::{ClubRecord, Compliance, Snapshot};
use crate::embeddings::{EmbeddingBackend, EmbeddingError, EmbeddingResult};
use crate::inference::{Generation, GenerationRequest, InferenceError, InferenceResult, TextGenerator};

/// Hashes lower-cased words into buckets; texts sharing words score close
pub struct BagOfWordsBackend {
    dimension: usize,
    calls: AtomicUsize,
    failing_markers: Mutex<HashSet<String>>,
    flaky_failures: AtomicUsize,
    delay: Option<Duration>,
}

impl BagOfWordsBackend {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
            failing_markers: Mutex::new(HashSet::new()),
            flaky_failures: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Always fail for texts containing `marker`
    pub fn failing_on(self, marker: &str) -> Self {
        self.failing_markers.lock().insert(marker.to_string());
        self
    }

    /// Fail the next `count` calls, whatever the text
    pub fn flaky(self, count: usize) -> Self {
        self.flaky_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let hash = blake3::hash(word.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&hash.as_bytes()[..8]);
            let slot = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            vector[slot] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingBackend for BagOfWordsBackend {
    async fn embed_raw(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let flaky = self
            .flaky_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if flaky {
            return Err(EmbeddingError::ServiceFailed {
                reason: "transient failure".to_string(),
            });
        }

        let failing = self
            .failing_markers
            .lock()
            .iter()
            .find(|marker| text.contains(marker.as_str()))
            .cloned();
        if let Some(marker) = failing {
            return Err(EmbeddingError::ServiceFailed {
                reason: format!("model rejected text mentioning {}", marker),
            });
        }

        Ok(self.vector_for(text))
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

/// Records every request and answers with a fixed reply
pub struct RecordingGenerator {
    reply: String,
    fail: bool,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a cloud API error
    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> InferenceResult<Generation> {
        self.requests.lock().push(request.clone());

        if self.fail {
            return Err(InferenceError::CloudApiError {
                reason: "HTTP 500: model unavailable".to_string(),
            });
        }

        Ok(Generation {
            text: self.reply.clone(),
            truncated: false,
            tokens_used: 10,
        })
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// The two clubs used across end-to-end tests
pub fn arsenal_and_brighton(period: i32) -> Snapshot {
    Snapshot::new(
        period,
        vec![
            ClubRecord::new("arsenal", period)
                .with_revenue(500_000_000.0)
                .with_debt(100_000_000.0)
                .with_compliance(Compliance::Compliant),
            ClubRecord::new("brighton", period)
                .with_revenue(150_000_000.0)
                .with_debt(20_000_000.0)
                .with_compliance(Compliance::Compliant),
        ],
    )
    .expect("fixture snapshot is valid")
}

/// `count` distinct clubs with increasing revenue
pub fn numbered_clubs(period: i32, count: usize) -> Snapshot {
    let records = (0..count)
        .map(|i| ClubRecord::new(format!("club-{}", i), period).with_revenue((i as f64 + 1.0) * 10_000_000.0))
        .collect();
    Snapshot::new(period, records).expect("fixture snapshot is valid")
}
