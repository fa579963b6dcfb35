//! Retrieval oracle consumed by the agent workflow

use async_trait::async_trait;
use std::sync::Arc;

use super::vector_store::VectorIndex;
use crate::error::Result;
use crate::types::RetrievedChunk;

/// Query string in, ranked chunks out
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve up to `k` chunks relevant to `query`
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>>;
}

/// Retriever backed by a [`VectorIndex`]
pub struct IndexRetriever {
    index: Arc<dyn VectorIndex>,
}

impl IndexRetriever {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        tracing::debug!("Retrieving top {} chunks from {}", k, self.index.name());
        self.index.query(query, k).await
    }
}
