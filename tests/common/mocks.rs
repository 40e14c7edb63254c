//! Mock implementations for testing.
//!
//! Mock chat and embedding clients shared by the integration tests, so the
//! workflow can be exercised without any network access.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use ragcheck::llm::client::{LLMClient, TextStream};
use ragcheck::rag::embeddings::EmbeddingClient;
use ragcheck::types::{AppError, ChatMessage, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock chat model with scripted replies.
///
/// Replies are picked by the first rule whose needle occurs in any message;
/// otherwise the default response is used. Every request is recorded.
///
/// # Examples
///
/// ```ignore
/// // Always answers the same
/// let client = MockLLMClient::new("Hello, world!");
///
/// // Grades by looking at the prompt
/// let grader = MockLLMClient::new("GRADE: INCORRECT").reply_when("tracing", "GRADE: CORRECT");
///
/// // Fails for one question only
/// let client = MockLLMClient::new("ok").fail_when("broken question");
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    rules: Vec<(String, String)>,
    fail_on: Vec<String>,
    should_fail: bool,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            rules: vec![],
            fail_on: vec![],
            should_fail: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Reply with `reply` when `needle` appears in the request
    pub fn reply_when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    /// Fail when `needle` appears in the request
    pub fn fail_when(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Every message list received so far, in arrival order
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    fn reply_for(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().push(messages.to_vec());

        let contains = |needle: &str| messages.iter().any(|m| m.content.contains(needle));
        if self.should_fail || self.fail_on.iter().any(|n| contains(n)) {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| contains(needle))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.response.clone()))
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn stream_with_messages(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let response = self.reply_for(messages)?;
        // Split response into chunks for streaming simulation
        let chunks: Vec<String> = response
            .chars()
            .collect::<Vec<_>>()
            .chunks(5)
            .map(|c| c.iter().collect())
            .collect();

        let stream = stream::iter(chunks.into_iter().map(Ok));
        Ok(Box::new(stream.boxed()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Mock embedder: one dimension per keyword, counting its occurrences.
///
/// A constant trailing component keeps vectors of keyword-free texts non-zero.
pub struct MockEmbeddingClient {
    keywords: Vec<String>,
    calls: AtomicUsize,
}

impl MockEmbeddingClient {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` requests served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as f32)
            .collect();
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}
