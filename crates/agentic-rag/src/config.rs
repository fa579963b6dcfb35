//! Configuration for the agentic RAG system
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables (API keys normally arrive this way).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::agent::ConfidencePolicy;
use crate::error::{Error, Result};
use crate::types::ConfigSnapshot;

/// Main RAG system configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Document corpus location
    pub corpus: CorpusConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Generation provider configuration
    pub llm: LlmConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
    /// Agent workflow defaults (overridable per query)
    pub workflow: WorkflowConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let parsed: RagConfig = toml::from_str(&raw)?;
                tracing::info!("Loaded configuration from {}", path.display());
                parsed
            }
            None => RagConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get("GOOGLE_API_KEY") {
            self.llm.google.api_key = Some(key);
        }
        if let Some(model) = get("GOOGLE_MODEL") {
            self.llm.google.model = model;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.openai.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.openai.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.openai.base_url = url;
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.llm.ollama.base_url = url.clone();
            self.embeddings.base_url = url;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.llm.ollama.model = model;
        }
        if let Some(enabled) = get("OLLAMA_ENABLED") {
            self.llm.ollama.enabled = !matches!(enabled.to_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        if let Some(dir) = get("RAG_DATA_DIR") {
            self.corpus.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("RAG_INDEX_DIR") {
            self.vector_db.storage_dir = PathBuf::from(dir);
        }
        if let Some(threshold) = get("RAG_CONFIDENCE_THRESHOLD") {
            match threshold.parse::<f32>() {
                Ok(value) => self.workflow.confidence_threshold = value,
                Err(_) => tracing::warn!("Ignoring invalid RAG_CONFIDENCE_THRESHOLD: {}", threshold),
            }
        }
        if let Some(top_k) = get("RAG_TOP_K") {
            match top_k.parse::<usize>() {
                Ok(value) => self.workflow.top_k = value,
                Err(_) => tracing::warn!("Ignoring invalid RAG_TOP_K: {}", top_k),
            }
        }
    }

    /// Check numeric settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be greater than zero"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&self.workflow.confidence_threshold) {
            return Err(Error::config(format!(
                "workflow.confidence_threshold must be within [0, 1], got {}",
                self.workflow.confidence_threshold
            )));
        }
        if self.workflow.top_k == 0 {
            return Err(Error::config("workflow.top_k must be at least 1"));
        }
        if self.llm.timeout_secs == 0 || self.workflow.retrieval_timeout_secs == 0 {
            return Err(Error::config("timeouts must be greater than zero"));
        }
        Ok(())
    }

    /// Read-only view reported by the status endpoint
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            data_directory: self.corpus.data_dir.clone(),
            index_directory: self.vector_db.storage_dir.clone(),
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
            top_k_retrieval: self.workflow.top_k,
            confidence_threshold: self.workflow.confidence_threshold,
            confidence_policy: self.workflow.confidence_policy,
            embedding_model: self.embeddings.model.clone(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Location of the PDF corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Directory scanned (non-recursively) for `*.pdf` files
    pub data_dir: PathBuf,
    /// Seconds allowed for extracting a single PDF
    pub extract_timeout_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            extract_timeout_secs: 60,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 20,
        }
    }
}

/// Embedding configuration (served by Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL used for embeddings
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed embedding requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Temperature shared by every provider
    pub temperature: f32,
    /// Maximum output tokens shared by every provider
    pub max_tokens: u32,
    /// Deadline for a single generation call in seconds
    pub timeout_secs: u64,
    /// Google Gemini (first in the fallback order)
    pub google: GoogleConfig,
    /// OpenAI (second)
    pub openai: OpenAiConfig,
    /// Local Ollama (last)
    pub ollama: OllamaConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 2048,
            timeout_secs: 120,
            google: GoogleConfig::default(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Names of the providers that have enough configuration to be registered
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.google.api_key.is_some() {
            names.push("google");
        }
        if self.openai.api_key.is_some() {
            names.push("openai");
        }
        if self.ollama.enabled {
            names.push("ollama");
        }
        names
    }
}

/// Google Gemini settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// API key; the provider is registered only when present
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// API base URL
    pub base_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

/// OpenAI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key; the provider is registered only when present
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// API base URL
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

/// Local Ollama settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Register the local provider
    pub enabled: bool,
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding the persisted index
    pub storage_dir: PathBuf,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        let storage_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agentic-rag")
            .join("vector_store");

        Self { storage_dir }
    }
}

/// Agent workflow defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Confidence at or above which the improve loop stops
    pub confidence_threshold: f32,
    /// Number of chunks retrieved per query
    pub top_k: usize,
    /// How an evaluation text is turned into a confidence score
    pub confidence_policy: ConfidencePolicy,
    /// Deadline for a retrieval call in seconds
    pub retrieval_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            top_k: 5,
            confidence_policy: ConfidencePolicy::Keyword,
            retrieval_timeout_secs: 30,
        }
    }
}
