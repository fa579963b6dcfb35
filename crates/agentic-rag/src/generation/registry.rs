//! Registry of configured generation providers
//!
//! Providers are kept in fixed priority order (`google`, `openai`, `ollama`,
//! then any other names in registration order). "auto" resolves to the first
//! registered provider in that order.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{GeminiLlm, LlmProvider, OllamaLlm, OpenAiLlm};
use crate::types::ProviderStatus;

/// Fallback priority of the built-in providers
pub const PROVIDER_PRIORITY: [&str; 3] = ["google", "openai", "ollama"];

/// Which provider a generation call should start with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderSelector {
    /// First registered provider in priority order
    #[default]
    Auto,
    /// A provider by name
    Named(String),
}

impl FromStr for ProviderSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Named(trimmed.to_lowercase()))
        }
    }
}

impl fmt::Display for ProviderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

fn priority_rank(name: &str) -> usize {
    PROVIDER_PRIORITY
        .iter()
        .position(|p| *p == name)
        .unwrap_or(PROVIDER_PRIORITY.len())
}

/// Immutable set of generation providers keyed by name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    /// Build a registry; later providers with an already registered name are ignored
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        let mut unique: Vec<Arc<dyn LlmProvider>> = Vec::with_capacity(providers.len());
        for provider in providers {
            if unique.iter().any(|p| p.name() == provider.name()) {
                tracing::warn!("Ignoring duplicate provider registration: {}", provider.name());
                continue;
            }
            unique.push(provider);
        }

        // Stable: unknown names keep registration order
        unique.sort_by_key(|p| priority_rank(p.name()));
        Self { providers: unique }
    }

    /// Register every provider the configuration has enough settings for
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

        if let Some(gemini) = GeminiLlm::from_config(config)? {
            tracing::info!("Registered Google Gemini provider with model: {}", gemini.model());
            providers.push(Arc::new(gemini));
        }
        if let Some(openai) = OpenAiLlm::from_config(config)? {
            tracing::info!("Registered OpenAI provider with model: {}", openai.model());
            providers.push(Arc::new(openai));
        }
        if config.ollama.enabled {
            let ollama = OllamaLlm::from_config(config)?;
            tracing::info!("Registered Ollama provider with model: {}", ollama.model());
            providers.push(Arc::new(ollama));
        }

        if providers.is_empty() {
            tracing::warn!("No generation providers configured");
        }
        Ok(Self::new(providers))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Providers in priority order
    pub fn providers(&self) -> &[Arc<dyn LlmProvider>] {
        &self.providers
    }

    /// Provider names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Resolve the primary provider for a selector
    pub fn resolve(&self, selector: &ProviderSelector) -> Result<Arc<dyn LlmProvider>> {
        let resolved = match selector {
            ProviderSelector::Auto => self.providers.first().cloned(),
            ProviderSelector::Named(name) => self.get(name),
        };
        resolved.ok_or_else(|| Error::NoProviderAvailable(selector.to_string()))
    }

    /// Every provider except `primary`, in priority order
    pub fn fallbacks<'a>(&'a self, primary: &'a str) -> impl Iterator<Item = &'a Arc<dyn LlmProvider>> + 'a {
        self.providers.iter().filter(move |p| p.name() != primary)
    }

    /// Name and model of each provider
    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| ProviderStatus {
                name: p.name().to_string(),
                model: p.model().to_string(),
            })
            .collect()
    }
}
