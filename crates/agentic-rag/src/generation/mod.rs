//! Text generation: prompt templates, provider registry, and cross-provider fallback

pub mod fallback;
pub mod prompt;
pub mod registry;

pub use fallback::{FallbackGenerator, Generation};
pub use prompt::PromptBuilder;
pub use registry::{ProviderRegistry, ProviderSelector, PROVIDER_PRIORITY};
