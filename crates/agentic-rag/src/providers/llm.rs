//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for a text generation backend
///
/// Implementations:
/// - `GeminiLlm`: Google Generative Language API
/// - `OpenAiLlm`: OpenAI chat completions
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a fully rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Provider name, used as the registry key and in fallback tags
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
