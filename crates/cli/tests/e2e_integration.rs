//! End-to-end integration tests for Parley.
//!
//! These tests exercise the full pipeline from a knowledge file on disk to
//! the persona's reply, with scripted language models standing in for the
//! hosted API.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_agent::{FallbackReason, PersonaEngine, ReplyRoute, OFFLINE_MARKER};
use parley_config::AppConfig;
use parley_core::embedding::{Embedder, Embedding};
use parley_core::error::{EmbeddingError, KnowledgeError, ProviderError, ToolError};
use parley_core::message::{Message, Role};
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse};
use parley_memory::KnowledgeStore;
use parley_providers::{FallbackProvider, HashingEmbedder};
use parley_tools::calculator;

// ── Mocks ───────────────────────────────────────────────────────────────

/// Answers from a script in order and records every request.
struct ScriptedProvider {
    answers: Mutex<Vec<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().rev().map(|a| a.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider exhausted");
        Ok(ProviderResponse {
            message: Message::assistant(answer),
            usage: None,
            model,
        })
    }
}

/// Never answers.
struct HangingProvider;

#[async_trait::async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        std::future::pending().await
    }
}

/// Always rejects the credential.
struct UnauthorizedProvider;

#[async_trait::async_trait]
impl Provider for UnauthorizedProvider {
    fn name(&self) -> &str {
        "unauthorized"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::AuthenticationFailed("invalid key".into()))
    }
}

/// Hashing embedder that counts batch calls.
struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self {
            inner: HashingEmbedder::new(64),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Embedder for CountingEmbedder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(texts).await
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

const FACTS: &str = "\
The Black Pearl is the fastest ship in the Caribbean, with black sails.

Jack's compass does not point north; it points to what you want most.
   The rum is always gone when Jack needs it most.
Jack escaped a deserted island on a raft of sea turtles.
Davy Jones keeps the souls of drowned sailors aboard the Flying Dutchman.
";

fn knowledge_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn load_store() -> Arc<KnowledgeStore> {
    let file = knowledge_file(FACTS);
    let store = KnowledgeStore::from_file(file.path(), Arc::new(HashingEmbedder::default()), None)
        .await
        .unwrap();
    Arc::new(store)
}

// ── E2E: Knowledge loading ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_knowledge_file_loads_and_retrieves_itself() {
    let store = load_store().await;
    assert_eq!(store.len(), 5);
    assert_eq!(store.facts()[2].text, "The rum is always gone when Jack needs it most.");

    for fact in store.facts() {
        let top = store.retrieve(&fact.text, 1).await.unwrap();
        assert_eq!(top[0].fact.id, fact.id, "{}", fact.text);
    }

    for k in [0, 1, 3, 5, 9] {
        assert_eq!(store.retrieve("rum", k).await.unwrap().len(), k.min(5));
    }
}

#[tokio::test]
async fn e2e_knowledge_errors_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());

    let missing = KnowledgeStore::from_file(&dir.path().join("absent.txt"), embedder.clone(), None).await;
    assert!(matches!(missing, Err(KnowledgeError::Missing { .. })));

    let blank = knowledge_file("\n  \n");
    let empty = KnowledgeStore::from_file(blank.path(), embedder, None).await;
    assert!(matches!(empty, Err(KnowledgeError::Empty { .. })));
}

#[tokio::test]
async fn e2e_index_cache_skips_reembedding() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("index.json");
    let file = knowledge_file(FACTS);

    let first = Arc::new(CountingEmbedder::new());
    let store = KnowledgeStore::from_file(file.path(), first.clone(), Some(&cache))
        .await
        .unwrap();
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert!(cache.exists());

    let second = Arc::new(CountingEmbedder::new());
    let cached = KnowledgeStore::from_file(file.path(), second.clone(), Some(&cache))
        .await
        .unwrap();
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    assert_eq!(cached.facts(), store.facts());
}

// ── E2E: Full conversation ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_conversation_with_model() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Ahoy! Welcome aboard, savvy?",
        "The Pearl, mate! Fastest ship there is.",
        "Ye be Elizabeth, of course.",
    ]));
    let config = AppConfig::default();
    let engine = PersonaEngine::from_config(&config, Some(provider.clone()));
    let mut session = engine.new_session(load_store().await, config.memory.window_size);

    engine.respond(&mut session, "Hello!").await;
    let pearl = engine.respond(&mut session, "My name is Elizabeth. Tell me about the Black Pearl").await;
    assert!(matches!(pearl.route, ReplyRoute::Model { .. }));
    assert!(pearl.facts[0].text().contains("Black Pearl"));

    let name = engine.respond(&mut session, "What's my name?").await;
    assert_eq!(name.text, "Ye be Elizabeth, of course.");

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.model, config.provider.model);
        assert_eq!(request.max_tokens, Some(config.provider.response_max_length));
    }
    let last_prompt = &requests[2].messages[1].content;
    assert!(last_prompt.contains("User: My name is Elizabeth. Tell me about the Black Pearl"));
    assert!(last_prompt.ends_with("Current user message: What's my name?"));
    assert!(session.memory.render().contains("Elizabeth"));
    assert_eq!(session.memory.len(), 6);
}

#[tokio::test]
async fn e2e_calculation_bypasses_model() {
    let provider = Arc::new(ScriptedProvider::new(&[]));
    let engine = PersonaEngine::new(Some(provider.clone()));
    let mut session = engine.new_session(load_store().await, 10);

    let reply = engine.respond(&mut session, "Captain, calculate (2 + 3) * 4").await;

    assert_eq!(reply.text, "By me calculations, that be **20**, savvy?");
    assert!(provider.requests().is_empty());
    assert_eq!(session.memory.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn e2e_timeout_degrades_to_offline() {
    let chain = FallbackProvider::new("slow").add(Arc::new(HangingProvider), Duration::from_secs(30));
    let engine = PersonaEngine::new(Some(Arc::new(chain)));
    let mut session = engine.new_session(load_store().await, 10);

    let reply = engine.respond(&mut session, "Where is the rum?").await;

    assert!(matches!(
        reply.route,
        ReplyRoute::Offline { reason: FallbackReason::Provider(ProviderError::Timeout(_)) }
    ));
    assert!(reply.text.ends_with(OFFLINE_MARKER));
    assert!(reply.text.contains(reply.facts[0].text()));
    assert_eq!(
        session.memory.render(),
        format!("User: Where is the rum?\nJack: {}", reply.text)
    );
}

#[tokio::test]
async fn e2e_fallback_chain_recovers() {
    let backup = Arc::new(ScriptedProvider::new(&["Backup ship, same captain."]));
    let chain = FallbackProvider::new("primary")
        .add_default(Arc::new(UnauthorizedProvider))
        .add_default(backup.clone());
    let engine = PersonaEngine::new(Some(Arc::new(chain)));
    let mut session = engine.new_session(load_store().await, 10);

    let reply = engine.respond(&mut session, "Ahoy").await;
    assert_eq!(reply.text, "Backup ship, same captain.");
    assert_eq!(backup.requests().len(), 1);
}

#[tokio::test]
async fn e2e_offline_session_is_deterministic() {
    let store = load_store().await;
    let engine = PersonaEngine::new(None);

    let mut transcripts = Vec::new();
    for _ in 0..2 {
        let mut session = engine.new_session(store.clone(), 10);
        for line in ["Hello!", "My name is Will", "Tell me about the compass", "What's my name?"] {
            engine.respond(&mut session, line).await;
        }
        transcripts.push(session.memory.render());
    }

    assert_eq!(transcripts[0], transcripts[1]);
    assert!(transcripts[0].contains("Ye be Will"));
}

#[tokio::test]
async fn e2e_reset_forgets_conversation() {
    let engine = PersonaEngine::new(None);
    let mut session = engine.new_session(load_store().await, 10);

    engine.respond(&mut session, "My name is Elizabeth").await;
    session.reset();
    assert!(session.memory.is_empty());

    let reply = engine.respond(&mut session, "What's my name?").await;
    assert!(!reply.text.contains("Elizabeth"));
}

// ── E2E: Calculator ─────────────────────────────────────────────────────

#[test]
fn e2e_calculator_contract() {
    assert_eq!(calculator::evaluate("2 + 2"), Ok(4.0));
    assert_eq!(calculator::evaluate("10 / 0"), Err(ToolError::DivisionByZero));
    assert!(matches!(
        calculator::evaluate("__import__('os')"),
        Err(ToolError::Unsupported(_))
    ));
}

// ── E2E: Configuration ──────────────────────────────────────────────────

#[test]
fn e2e_config_file_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
knowledge_path = "facts.txt"

[provider]
name = "ollama"
model = "llama3.2"

[memory]
window_size = 4

[persona]
short_name = "Cap'n"
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.memory.window_size, 4);
    assert_eq!(config.retrieval.k, 3);

    let engine = PersonaEngine::from_config(&config, None);
    assert_eq!(engine.persona().short_name, "Cap'n");
    assert_eq!(engine.persona().name, "Captain Jack Sparrow");
}
