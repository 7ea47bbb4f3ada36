//! Deterministic doubles for the embedding and generation capabilities.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use syllabus::types::{AppError, ChatMessage, Result};
use syllabus::{Embedder, LLMClient};

/// Width of the vectors produced by [`MockEmbedder`].
pub const MOCK_DIMENSIONS: usize = 64;

/// Bag-of-words embedder: every lowercase word is hashed into one of
/// [`MOCK_DIMENSIONS`] buckets and the result is L2-normalized. Texts that
/// share words therefore score higher under cosine similarity.
#[derive(Default)]
pub struct MockEmbedder {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th call (1-based) with an upstream error.
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::default()
        }
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % MOCK_DIMENSIONS;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        } else {
            vector[0] = 1.0;
        }
        vector
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

/// Counts a call as running until dropped, including when its future is
/// cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on_call == Some(call) {
            return Err(AppError::UpstreamEmbedding(format!(
                "mock embedder failed on call {}",
                call
            )));
        }
        Ok(Self::vector_for(text))
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }
}

/// Generation double that records every message list it receives.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    delay: Option<Duration>,
    seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            delay: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A client whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    /// The messages of the most recent call.
    pub fn last_messages(&self) -> Option<Vec<ChatMessage>> {
        self.seen.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String> {
        self.seen.lock().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(AppError::UpstreamGeneration("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}
