//! Builds the language model and the embedder from configuration.
//!
//! The language model is optional: without a credential the engine runs
//! offline, so [`build_language_model`] returns `None` instead of failing.

use crate::fallback::FallbackProvider;
use crate::hashing::HashingEmbedder;
use crate::openai_compat::{OpenAiCompatEmbedder, OpenAiCompatProvider};
use parley_config::{AppConfig, EmbeddingBackend};
use parley_core::embedding::Embedder;
use parley_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Providers that run without a credential.
fn is_keyless(provider_name: &str) -> bool {
    provider_name == "ollama"
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "gemini" => "https://generativelanguage.googleapis.com/v1beta/openai/".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

/// Pick the credential for a provider, or `None` when it cannot be used.
fn resolve_key(name: &str, own: Option<&String>, shared: Option<&String>) -> Option<String> {
    match own.or(shared) {
        Some(key) => Some(key.clone()),
        None if is_keyless(name) => Some(name.to_string()),
        None => None,
    }
}

/// Build the language model chain, or `None` for offline mode.
///
/// The primary provider comes first, followed by `provider.fallbacks` in
/// order. Every entry is bounded by `provider.timeout_secs`. Fallbacks
/// without a usable credential are skipped.
pub fn build_language_model(config: &AppConfig) -> Option<Arc<dyn Provider>> {
    let timeout = Duration::from_secs(config.provider.timeout_secs);
    let primary = &config.provider.name;

    let Some(api_key) = resolve_key(primary, None, config.api_key.as_ref()) else {
        info!(provider = %primary, "No API key configured, running in offline mode");
        return None;
    };

    let base_url = config
        .provider
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(primary));

    let mut chain = FallbackProvider::new(primary.clone()).add(
        Arc::new(OpenAiCompatProvider::new(primary, base_url, api_key)),
        timeout,
    );

    for fallback in &config.provider.fallbacks {
        let Some(key) = resolve_key(
            &fallback.name,
            fallback.api_key.as_ref(),
            config.api_key.as_ref(),
        ) else {
            warn!(provider = %fallback.name, "Skipping fallback provider without API key");
            continue;
        };
        let base_url = fallback
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(&fallback.name));
        chain = chain.add(
            Arc::new(OpenAiCompatProvider::new(&fallback.name, base_url, key)),
            timeout,
        );
    }

    info!(providers = ?chain.provider_names(), model = %config.provider.model, "Language model ready");
    Some(Arc::new(chain))
}

/// Build the configured embedder.
///
/// A backend that cannot be used (remote without a credential, local without
/// the `local` feature) degrades to the hashing embedder with a warning.
pub fn build_embedder(config: &AppConfig) -> Arc<dyn Embedder> {
    let hashing = || -> Arc<dyn Embedder> { Arc::new(HashingEmbedder::new(config.embedding.dimension)) };

    match config.embedding.backend {
        EmbeddingBackend::Hashing => hashing(),
        EmbeddingBackend::Remote => {
            let name = &config.provider.name;
            match resolve_key(name, None, config.api_key.as_ref()) {
                Some(key) => {
                    let base_url = config
                        .provider
                        .api_url
                        .clone()
                        .unwrap_or_else(|| default_base_url(name));
                    Arc::new(OpenAiCompatEmbedder::new(
                        base_url,
                        key,
                        config.embedding.model_name(),
                    ))
                }
                None => {
                    warn!("Remote embeddings need an API key, using the hashing embedder");
                    hashing()
                }
            }
        }
        EmbeddingBackend::Local => local_embedder(config).unwrap_or_else(hashing),
    }
}

#[cfg(feature = "local")]
fn local_embedder(config: &AppConfig) -> Option<Arc<dyn Embedder>> {
    Some(Arc::new(crate::local::LocalEmbedder::new(
        config.embedding.model_name(),
    )))
}

#[cfg(not(feature = "local"))]
fn local_embedder(_config: &AppConfig) -> Option<Arc<dyn Embedder>> {
    warn!("Built without the `local` feature, using the hashing embedder");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_config::FallbackConfig;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("gemini").contains("generativelanguage.googleapis.com"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn no_key_means_offline() {
        let config = AppConfig::default();
        assert!(build_language_model(&config).is_none());
    }

    #[test]
    fn key_builds_chain_named_after_primary() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let provider = build_language_model(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider.name = "ollama".into();
        assert!(build_language_model(&config).is_some());
    }

    #[test]
    fn fallback_without_key_is_skipped() {
        let mut config = AppConfig::default();
        config.provider.name = "ollama".into();
        config.provider.fallbacks.push(FallbackConfig {
            name: "openai".into(),
            api_url: None,
            api_key: None,
        });
        // Still builds with the primary alone.
        assert!(build_language_model(&config).is_some());
    }

    #[test]
    fn hashing_embedder_by_default() {
        let embedder = build_embedder(&AppConfig::default());
        assert_eq!(embedder.name(), "hashing-384");
        assert_eq!(embedder.dimension(), Some(384));
    }

    #[test]
    fn remote_embedder_without_key_degrades() {
        let mut config = AppConfig::default();
        config.embedding.backend = EmbeddingBackend::Remote;
        assert_eq!(build_embedder(&config).name(), "hashing-384");

        config.api_key = Some("k".into());
        assert_eq!(build_embedder(&config).name(), "remote:text-embedding-004");
    }
}
