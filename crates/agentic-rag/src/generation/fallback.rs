//! Fallback-aware generation over the provider registry
//!
//! The selected provider is tried first; on failure every other registered
//! provider is tried once in priority order. Each call carries its own deadline.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::types::ProviderHealth;

use super::registry::{ProviderRegistry, ProviderSelector};

/// A successful generation and the provider that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    /// `<name>` for the primary, `fallback-<name>` for a fallback
    pub provider_tag: String,
}

/// Generator that falls back across providers
pub struct FallbackGenerator {
    registry: Arc<ProviderRegistry>,
    call_timeout: Duration,
}

impl FallbackGenerator {
    pub fn new(registry: Arc<ProviderRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Generate text, starting with the provider named by `selector`
    pub async fn generate(&self, prompt: &str, selector: &ProviderSelector) -> Result<Generation> {
        let primary = self.registry.resolve(selector)?;

        match self.call(&primary, prompt).await {
            Ok(text) => {
                return Ok(Generation {
                    text,
                    provider_tag: primary.name().to_string(),
                })
            }
            Err(e) => {
                tracing::warn!("Primary provider {} failed, trying fallbacks: {}", primary.name(), e);
            }
        }

        let mut attempted = 1;
        for provider in self.registry.fallbacks(primary.name()) {
            attempted += 1;
            match self.call(provider, prompt).await {
                Ok(text) => {
                    tracing::info!("Fallback to {} succeeded", provider.name());
                    return Ok(Generation {
                        text,
                        provider_tag: format!("fallback-{}", provider.name()),
                    });
                }
                Err(e) => {
                    tracing::warn!("Fallback provider {} failed: {}", provider.name(), e);
                }
            }
        }

        tracing::error!("All {} LLM providers failed", attempted);
        Err(Error::AllProvidersFailed { attempted })
    }

    async fn call(&self, provider: &Arc<dyn LlmProvider>, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.call_timeout, provider.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(
                format!("generation with {}", provider.name()),
                self.call_timeout.as_secs(),
            )),
        }
    }

    /// Probe every provider concurrently
    pub async fn health(&self) -> Vec<ProviderHealth> {
        let checks = self.registry.providers().iter().map(|provider| async move {
            let result = tokio::time::timeout(self.call_timeout, provider.health_check()).await;
            let (healthy, error) = match result {
                Ok(Ok(healthy)) => (healthy, None),
                Ok(Err(e)) => (false, Some(e.to_string())),
                Err(_) => (false, Some("health check timed out".to_string())),
            };
            ProviderHealth {
                name: provider.name().to_string(),
                model: provider.model().to_string(),
                healthy,
                error,
            }
        });

        join_all(checks).await
    }
}
