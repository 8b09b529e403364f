//! Provider fallback: ordered chain with a per-provider deadline.
//!
//! The persona engine only ever talks to one `Provider`. This wrapper gives
//! that provider a hard time limit and lets a configured secondary take over
//! when the primary errors or stalls.

use async_trait::async_trait;
use parley_core::error::ProviderError;
use parley_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Deadline applied by [`FallbackProvider::add_default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider that wraps an ordered list of providers and falls back on failure.
pub struct FallbackProvider {
    name: String,
    chain: Vec<ChainLink>,
}

struct ChainLink {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

impl FallbackProvider {
    /// Create a new fallback provider with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Add a provider to the chain with its own deadline.
    pub fn add(mut self, provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        self.chain.push(ChainLink { provider, timeout });
        self
    }

    /// Add a provider with [`DEFAULT_TIMEOUT`].
    pub fn add_default(self, provider: Arc<dyn Provider>) -> Self {
        self.add(provider, DEFAULT_TIMEOUT)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Names of the chained providers, in the order they are tried.
    pub fn provider_names(&self) -> Vec<&str> {
        self.chain.iter().map(|link| link.provider.name()).collect()
    }
}

#[async_trait]
impl Provider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut last_error = ProviderError::NotConfigured("No providers in fallback chain".into());

        for (i, link) in self.chain.iter().enumerate() {
            let provider_name = link.provider.name();

            debug!(
                provider = %provider_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Trying provider"
            );

            match tokio::time::timeout(link.timeout, link.provider.complete(request.clone())).await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    warn!(provider = %provider_name, error = %e, "Provider failed");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        provider = %provider_name,
                        timeout_ms = link.timeout.as_millis() as u64,
                        "Provider timed out"
                    );
                    last_error = ProviderError::Timeout(format!(
                        "Provider '{}' gave no answer within {}ms",
                        provider_name,
                        link.timeout.as_millis()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        for link in &self.chain {
            if let Ok(true) = link.provider.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
