//! Response types returned by the session coordinator and the HTTP API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::document::DocumentRecord;
use crate::agent::ConfidencePolicy;
use crate::error::Error;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing indexed, no workflow
    Uninitialized,
    /// Index populated, workflow not yet built
    Indexed,
    /// Queries are accepted
    Ready,
}

/// Result of `initialize` / `rebuild`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Files that produced chunks during this call (0 when a persisted index was reused)
    pub documents_processed: usize,
    /// Chunks held by the index afterwards
    pub chunks_indexed: usize,
    /// True when the persisted index was loaded instead of rebuilt
    pub loaded_from_disk: bool,
}

impl InitializeResult {
    /// A failed initialization
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: "Failed to initialize system".to_string(),
            error: Some(error.into()),
            documents_processed: 0,
            chunks_indexed: 0,
            loaded_from_disk: false,
        }
    }
}

/// Result envelope of one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// False only when no response was produced or the system is not ready
    pub success: bool,
    pub query: String,
    pub response: String,
    pub confidence: f32,
    /// Distinct source files the context came from, sorted
    pub sources: Vec<String>,
    /// Notes recorded by the analyze and evaluate stages
    pub evaluation: BTreeMap<String, String>,
    /// Stages executed, in order
    pub workflow_steps: Vec<String>,
    pub improvement_attempts: u32,
    /// Provider tag of each successful generation call
    pub provider_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

impl QueryResult {
    /// An envelope for a query that never reached the workflow
    pub fn failure(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query: query.into(),
            response: String::new(),
            confidence: 0.0,
            sources: Vec::new(),
            evaluation: BTreeMap::new(),
            workflow_steps: Vec::new(),
            improvement_attempts: 0,
            provider_tags: Vec::new(),
            error: Some(error.into()),
            processing_time_ms: 0,
        }
    }

    /// The envelope returned while the session is not ready
    pub fn not_initialized(query: impl Into<String>) -> Self {
        Self::failure(query, Error::NotInitialized.to_string())
    }
}

/// Read-only view of the effective configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub data_directory: PathBuf,
    pub index_directory: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k_retrieval: usize,
    pub confidence_threshold: f32,
    pub confidence_policy: ConfidencePolicy,
    pub embedding_model: String,
}

/// A registered generation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    pub model: String,
}

/// Result of probing one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub name: String,
    pub model: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Vector index statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of chunks stored
    pub total_chunks: usize,
    /// Number of distinct sources
    pub total_sources: usize,
    /// Embedding dimensionality (0 when empty)
    pub dimensions: usize,
}

/// Overall system status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub phase: SessionPhase,
    pub initialized: bool,
    pub documents_processed: usize,
    pub index: IndexStats,
    /// Providers in fallback priority order
    pub providers: Vec<ProviderStatus>,
    pub config: ConfigSnapshot,
}

/// Per-file entry in [`DocumentInfo`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub size_mb: f64,
    pub total_pages: Option<u32>,
    pub chunk_count: usize,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&DocumentRecord> for DocumentSummary {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            filename: record.filename.clone(),
            size_mb: record.size_mb(),
            total_pages: record.total_pages,
            chunk_count: record.chunk_count,
            last_modified: record.last_modified,
        }
    }
}

/// Corpus metadata report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub success: bool,
    pub documents: Vec<DocumentSummary>,
    pub total_documents: usize,
    pub total_chunks: usize,
    pub index: IndexStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentInfo {
    /// Report for a session that has not processed any documents
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            success: false,
            documents: Vec::new(),
            total_documents: 0,
            total_chunks: 0,
            index: IndexStats::default(),
            error: Some(error.into()),
        }
    }
}

/// Result of the built-in smoke test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemTestResult {
    pub system_working: bool,
    pub test_query: String,
    pub result: QueryResult,
}
