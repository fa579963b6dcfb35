//! Vector index trait for storing chunks and searching them by similarity

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{Chunk, IndexStats, RetrievedChunk};

/// Trait for a persistent similarity index over chunks
///
/// Implementations:
/// - `LocalVectorIndex`: flat cosine index persisted as JSON
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store chunks, replacing any previous contents, and persist
    async fn build(&self, chunks: &[Chunk]) -> Result<IndexStats>;

    /// Load a persisted index; `Ok(true)` when it held at least one chunk
    async fn load(&self) -> Result<bool>;

    /// Top `k` chunks by decreasing similarity, ties in stable input order
    async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedChunk>>;

    /// Remove all chunks, in memory and on disk
    async fn clear(&self) -> Result<()>;

    /// Current statistics
    async fn stats(&self) -> IndexStats;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
