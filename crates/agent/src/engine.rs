//! Persona engine: one turn of conversation from utterance to reply.
//!
//! # Flow
//!
//! 1. Classify the utterance; a calculation that evaluates is answered
//!    directly in the persona's voice
//! 2. Retrieve the top-k facts for the utterance
//! 3. Compose the prompt from persona, memory and facts
//! 4. Ask the language model, or answer offline when it is missing or fails
//! 5. Record both turns in the session memory

use std::sync::Arc;

use parley_config::AppConfig;
use parley_core::error::ProviderError;
use parley_core::knowledge::ScoredFact;
use parley_core::memory::Speaker;
use parley_core::provider::{Provider, ProviderRequest};
use parley_memory::{ConversationMemory, FactKey, KnowledgeStore, DEFAULT_K};
use parley_tools::calculator;
use tracing::{debug, warn};

use crate::intent::{classify, Intent};
use crate::offline::{self, FallbackReason};
use crate::persona::Persona;
use crate::prompt::{compose, ComposedPrompt};
use crate::session::Session;

/// Default model identifier when none is configured.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default cap on answer length, in tokens.
const DEFAULT_MAX_TOKENS: u32 = 256;

/// How a reply was produced.
#[derive(Debug, Clone)]
pub enum ReplyRoute {
    /// Answered by the calculator
    Calculation { expression: String, value: f64 },
    /// Answered by the language model
    Model { model: String },
    /// Answered by the offline responder
    Offline { reason: FallbackReason },
}

/// The agent's answer to one utterance.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub route: ReplyRoute,
    /// Facts retrieved for this turn (empty for calculations)
    pub facts: Vec<ScoredFact>,
}

impl Reply {
    pub fn is_offline(&self) -> bool {
        matches!(self.route, ReplyRoute::Offline { .. })
    }
}

/// Orchestrates intent, retrieval, prompting and fallback for a persona.
pub struct PersonaEngine {
    provider: Option<Arc<dyn Provider>>,
    persona: Persona,
    model: String,
    temperature: f32,
    max_tokens: u32,
    k: usize,
}

impl PersonaEngine {
    /// Create an engine. `None` for the provider means offline mode.
    pub fn new(provider: Option<Arc<dyn Provider>>) -> Self {
        Self {
            provider,
            persona: Persona::captain(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.8,
            max_tokens: DEFAULT_MAX_TOKENS,
            k: DEFAULT_K,
        }
    }

    /// Create an engine with every setting taken from the configuration.
    pub fn from_config(config: &AppConfig, provider: Option<Arc<dyn Provider>>) -> Self {
        Self::new(provider)
            .with_persona(Persona::from_config(&config.persona))
            .with_model(&config.provider.model)
            .with_temperature(config.provider.temperature)
            .with_max_tokens(config.provider.response_max_length)
            .with_k(config.retrieval.k)
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap on answer length, passed to the model as `max_tokens`.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Number of facts retrieved per turn.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Whether a language model is configured at all.
    pub fn is_online(&self) -> bool {
        self.provider.is_some()
    }

    /// Start a conversation whose transcript labels agent turns with the
    /// persona's short name.
    pub fn new_session(&self, knowledge: Arc<KnowledgeStore>, window_size: usize) -> Session {
        let memory = ConversationMemory::new(window_size, self.persona.short_name.clone());
        Session::new(knowledge, memory)
    }

    /// Answer one utterance and record the exchange in the session memory.
    ///
    /// Never fails: model and embedding failures become offline replies,
    /// calculator failures become chat turns.
    pub async fn respond(&self, session: &mut Session, utterance: &str) -> Reply {
        let utterance = utterance.trim();
        debug!(session = %session.id, utterance, "Handling turn");

        if let Intent::Calculation(expression) = classify(utterance) {
            let result = calculator::invoke(&expression);
            match result.value {
                Ok(value) => {
                    let text = self
                        .persona
                        .calculation_reply(&calculator::format_value(value));
                    remember(session, utterance, &text);
                    return Reply {
                        text,
                        route: ReplyRoute::Calculation { expression, value },
                        facts: Vec::new(),
                    };
                }
                Err(e) => {
                    debug!(expression = %expression, kind = e.kind(), "Calculator failed, answering as chat");
                }
            }
        }

        let facts = match session.knowledge.retrieve(utterance, self.k).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, answering offline");
                let text = self.offline_reply(session, utterance, &[]);
                remember(session, utterance, &text);
                return Reply {
                    text,
                    route: ReplyRoute::Offline {
                        reason: FallbackReason::Embedding(e),
                    },
                    facts: Vec::new(),
                };
            }
        };
        debug!(facts = facts.len(), "Facts retrieved");

        let prompt = compose(&self.persona, &session.memory.render(), &facts, utterance);

        let (text, route) = match self.generate(&prompt).await {
            Ok((text, model)) => (text, ReplyRoute::Model { model }),
            Err(reason) => {
                match &reason {
                    FallbackReason::NoModel => debug!("No language model, answering offline"),
                    other => warn!(error = %other, "Language model failed, answering offline"),
                }
                let text = self.offline_reply(session, utterance, &facts);
                (text, ReplyRoute::Offline { reason })
            }
        };

        remember(session, utterance, &text);
        Reply { text, route, facts }
    }

    async fn generate(&self, prompt: &ComposedPrompt) -> Result<(String, String), FallbackReason> {
        let provider = self.provider.as_ref().ok_or(FallbackReason::NoModel)?;

        let mut request = ProviderRequest::new(&self.model, prompt.to_messages());
        request.temperature = self.temperature;
        request.max_tokens = Some(self.max_tokens);

        let response = provider
            .complete(request)
            .await
            .map_err(FallbackReason::Provider)?;

        let text = response.message.content.trim();
        if text.is_empty() {
            return Err(FallbackReason::Provider(ProviderError::ApiError {
                status_code: 200,
                message: "model returned an empty answer".into(),
            }));
        }

        debug!(provider = provider.name(), model = %response.model, "Model answered");
        Ok((text.to_string(), response.model))
    }

    fn offline_reply(&self, session: &Session, utterance: &str, facts: &[ScoredFact]) -> String {
        let name = session.memory.extract_fact(FactKey::Name);
        offline::respond(utterance, facts.first().map(|f| f.text()), name.as_deref())
    }
}

fn remember(session: &mut Session, utterance: &str, reply: &str) {
    session.memory.append(Speaker::User, utterance);
    session.memory.append(Speaker::Agent, reply);
}
