//! Shared mocks for engine tests.

use async_trait::async_trait;
use parley_core::embedding::{Embedder, Embedding};
use parley_core::error::{EmbeddingError, ProviderError};
use parley_core::message::Message;
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use parley_memory::KnowledgeStore;
use parley_providers::HashingEmbedder;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PIRATE_FACTS: &[&str] = &[
    "The Black Pearl is the fastest ship in the Caribbean, with black sails.",
    "Jack's compass does not point north; it points to what you want most.",
    "The rum is always gone when Jack needs it most.",
    "Jack was marooned on an island and escaped on a raft of sea turtles.",
    "Davy Jones keeps the souls of drowned sailors aboard the Flying Dutchman.",
];

/// Knowledge store over [`PIRATE_FACTS`] with the hashing embedder.
pub async fn pirate_store() -> Arc<KnowledgeStore> {
    let embedder = Arc::new(HashingEmbedder::new(384));
    Arc::new(
        KnowledgeStore::load(PIRATE_FACTS.iter().copied(), embedder)
            .await
            .unwrap(),
    )
}

/// Knowledge store whose embedder works for loading and fails every query.
pub async fn failing_query_store() -> Arc<KnowledgeStore> {
    let embedder = Arc::new(FailingQueryEmbedder::default());
    Arc::new(
        KnowledgeStore::load(PIRATE_FACTS.iter().copied(), embedder)
            .await
            .unwrap(),
    )
}

/// Answers from a script, in order, and records every request.
pub struct ScriptedProvider {
    answers: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let answer = self.answers.lock().unwrap().pop_front().ok_or_else(|| ProviderError::ApiError {
            status_code: 500,
            message: "script exhausted".into(),
        })?;
        Ok(ProviderResponse {
            message: Message::assistant(answer),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// Always fails with the given error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// Never answers.
pub struct HangingProvider;

#[async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        std::future::pending().await
    }
}

/// Hashing embedder that only succeeds on its first call.
#[derive(Default)]
pub struct FailingQueryEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for FailingQueryEmbedder {
    fn name(&self) -> &str {
        "failing-query"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.embed(texts).await
        } else {
            Err(EmbeddingError::Network("connection reset".into()))
        }
    }
}
