//! agentic-rag: agentic question answering over a directory of PDFs
//!
//! Documents are extracted, chunked and embedded into a local vector index.
//! Each query runs a small workflow (retrieve, analyze, generate, evaluate,
//! improve) whose generation calls go through an ordered set of LLM providers
//! with fallback. A [`SessionCoordinator`] owns the index lifecycle and
//! returns a uniform [`QueryResult`] envelope for every query.

pub mod agent;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use agent::{AgentWorkflow, ConfidencePolicy, WorkflowOptions, WorkflowState};
pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{FallbackGenerator, ProviderRegistry, ProviderSelector};
pub use session::{Collaborators, SessionCoordinator};
pub use types::{
    Chunk, InitializeResult, QueryOptions, QueryRequest, QueryResult, RetrievedChunk,
    SessionPhase, SystemStatus,
};
