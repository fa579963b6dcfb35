//! Core types for the RAG system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, DocumentRecord, RetrievedChunk};
pub use query::{InitializeRequest, QueryOptions, QueryRequest};
pub use response::{
    ConfigSnapshot, DocumentInfo, DocumentSummary, IndexStats, InitializeResult, ProviderHealth,
    ProviderStatus, QueryResult, SessionPhase, SystemStatus, SystemTestResult,
};
