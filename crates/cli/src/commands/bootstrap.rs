//! Application root: config, knowledge store and engine.

use std::sync::Arc;

use parley_agent::{PersonaEngine, Session};
use parley_config::AppConfig;
use parley_core::error::KnowledgeError;
use parley_memory::KnowledgeStore;
use parley_providers::{build_embedder, build_language_model};
use tracing::info;

use super::GlobalOpts;

/// Everything a conversation needs, built once per process.
pub struct Runtime {
    pub config: AppConfig,
    pub knowledge: Arc<KnowledgeStore>,
    pub engine: PersonaEngine,
}

impl Runtime {
    /// A fresh session over the shared knowledge store.
    pub fn session(&self) -> Session {
        self.engine
            .new_session(self.knowledge.clone(), self.config.memory.window_size)
    }
}

/// Load the configuration and apply command-line overrides.
pub fn load_config(opts: &GlobalOpts) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = opts.config_path();
    let mut config =
        AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(knowledge) = &opts.knowledge {
        config.knowledge_path = knowledge.clone();
    }
    Ok(config)
}

/// Embed the configured knowledge file.
pub async fn load_knowledge(config: &AppConfig) -> Result<Arc<KnowledgeStore>, KnowledgeError> {
    let embedder = build_embedder(config);
    let store = KnowledgeStore::from_file(
        &config.knowledge_file(),
        embedder,
        config.embedding.index_cache.as_deref(),
    )
    .await?;
    Ok(Arc::new(store))
}

/// Build the full runtime. A knowledge file that cannot be loaded is fatal.
pub async fn build(opts: &GlobalOpts) -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = load_config(opts)?;
    let knowledge = load_knowledge(&config).await?;

    let provider = if opts.offline {
        info!("Offline mode requested, the language model is disabled");
        None
    } else {
        build_language_model(&config)
    };

    let engine = PersonaEngine::from_config(&config, provider);
    Ok(Runtime {
        config,
        knowledge,
        engine,
    })
}
