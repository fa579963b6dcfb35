//! Query request types

use serde::{Deserialize, Serialize};

/// Per-call overrides for one workflow run
///
/// Unset fields fall back to the `[workflow]` configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Confidence at or above which the improve loop stops
    #[serde(default)]
    pub confidence_threshold: Option<f32>,

    /// Number of chunks to retrieve
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Provider selector: "auto" or a provider name
    #[serde(default)]
    pub provider: Option<String>,
}

impl QueryOptions {
    /// Set the confidence threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Select a provider by name
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Query request body for `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub query: String,

    #[serde(flatten)]
    pub options: QueryOptions,
}

/// Initialize request body for `POST /api/initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Re-extract the corpus even when a persisted index exists
    #[serde(default)]
    pub force_rebuild: bool,
}
