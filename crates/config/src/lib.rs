//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API credential for the language model (and remote embeddings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Path to the knowledge file (one fact per line)
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,

    /// Language model settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Embedding backend settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Knowledge retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Persona settings
    #[serde(default)]
    pub persona: PersonaConfig,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/captain_facts.txt")
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("knowledge_path", &self.knowledge_path)
            .field("provider", &self.provider)
            .field("embedding", &self.embedding)
            .field("memory", &self.memory)
            .field("retrieval", &self.retrieval)
            .field("persona", &self.persona)
            .finish()
    }
}

/// Language model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (gemini, openai, openrouter, ollama, groq, ...)
    #[serde(default = "default_provider")]
    pub name: String,

    /// Model identifier sent to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Overrides the well-known base URL for `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on a single language model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens per answer
    #[serde(default = "default_response_max_length")]
    pub response_max_length: u32,

    /// Additional providers tried in order when the primary fails
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.8
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_response_max_length() -> u32 {
    256
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            model: default_model(),
            api_url: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            response_max_length: default_response_max_length(),
            fallbacks: Vec::new(),
        }
    }
}

/// A secondary provider in the fallback chain.
#[derive(Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Own credential; the root `api_key` is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for FallbackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackConfig")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Deterministic feature hashing, no network
    #[default]
    Hashing,
    /// The provider's OpenAI-compatible `/embeddings` endpoint
    Remote,
    /// In-process sentence transformer (requires the `local` feature)
    Local,
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EmbeddingBackend::Hashing => "hashing",
            EmbeddingBackend::Remote => "remote",
            EmbeddingBackend::Local => "local",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Model for the remote and local backends; each has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Vector size of the hashing backend
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Where to cache computed fact embeddings (JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_cache: Option<PathBuf>,
}

fn default_dimension() -> usize {
    384
}

impl EmbeddingConfig {
    /// The model name for the configured backend.
    pub fn model_name(&self) -> &str {
        match (&self.model, self.backend) {
            (Some(model), _) => model,
            (None, EmbeddingBackend::Remote) => "text-embedding-004",
            (None, EmbeddingBackend::Local) => "all-minilm-l6-v2",
            (None, EmbeddingBackend::Hashing) => "hashing",
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: None,
            dimension: default_dimension(),
            index_cache: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of turns kept (each user or agent utterance is one turn)
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_window_size() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Facts injected per turn
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// Label used for the agent in the rendered transcript
    #[serde(default = "default_persona_short_name")]
    pub short_name: String,

    /// Replaces the built-in voice rules entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Answer to a calculation, with `{value}` marking the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_reply: Option<String>,
}

fn default_persona_name() -> String {
    "Captain Jack Sparrow".into()
}
fn default_persona_short_name() -> String {
    "Jack".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            short_name: default_persona_short_name(),
            system_instruction: None,
            calculation_reply: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load configuration from `path`, then apply environment overrides.
    ///
    /// Credential lookup order when the file has none:
    /// - `PARLEY_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let credential = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.api_key = self.api_key.take().filter(|key| !key.trim().is_empty());
        if self.api_key.is_none() {
            self.api_key = credential("PARLEY_API_KEY")
                .or_else(|| credential("GEMINI_API_KEY"))
                .or_else(|| credential("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("PARLEY_PROVIDER") {
            self.provider.name = provider;
        }

        if let Some(model) = lookup("PARLEY_MODEL") {
            self.provider.model = model;
        }

        if let Some(path) = lookup("PARLEY_KNOWLEDGE_PATH") {
            self.knowledge_path = PathBuf::from(path);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        if self.provider.response_max_length == 0 {
            return Err(ConfigError::ValidationError(
                "provider.response_max_length must be > 0".into(),
            ));
        }

        if self.memory.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window_size must be > 0".into(),
            ));
        }

        if self.retrieval.k == 0 {
            return Err(ConfigError::ValidationError("retrieval.k must be > 0".into()));
        }

        if self.embedding.backend == EmbeddingBackend::Hashing && self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The knowledge file to open.
    ///
    /// A relative `knowledge_path` is tried against the working directory,
    /// then the directory holding the executable, then [`Self::config_dir`].
    /// When none of them has the file the path is returned unchanged.
    pub fn knowledge_file(&self) -> PathBuf {
        let mut bases = Vec::new();
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            bases.push(dir);
        }
        bases.push(Self::config_dir());
        resolve_relative(&self.knowledge_path, &bases)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// A copy with every credential replaced by a placeholder, safe to print.
    pub fn redacted(&self) -> Self {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]".to_string());
        let mut config = self.clone();
        config.api_key = mask(&self.api_key);
        for fallback in &mut config.provider.fallbacks {
            fallback.api_key = mask(&fallback.api_key);
        }
        config
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            knowledge_path: default_knowledge_path(),
            provider: ProviderConfig::default(),
            embedding: EmbeddingConfig::default(),
            memory: MemoryConfig::default(),
            retrieval: RetrievalConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

/// First existing location of `path`, trying it as given before each base.
fn resolve_relative(path: &Path, bases: &[PathBuf]) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    bases
        .iter()
        .map(|base| base.join(path))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
