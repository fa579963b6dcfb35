//! Provider abstractions for generation, embeddings, vector indexing, and document sources
//!
//! The agent workflow and session coordinator only see these traits; the
//! concrete backends below are wired together from configuration.

pub mod document_source;
pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod openai;
pub mod retriever;
pub mod vector_store;

pub use document_source::DocumentSource;
pub use embedding::EmbeddingProvider;
pub use gemini::GeminiLlm;
pub use llm::LlmProvider;
pub use local::LocalVectorIndex;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use openai::OpenAiLlm;
pub use retriever::{IndexRetriever, Retriever};
pub use vector_store::VectorIndex;
