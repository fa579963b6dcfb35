//! Local vector index: flat cosine similarity over chunk embeddings
//!
//! The index is held in memory and persisted as a single JSON file under the
//! configured storage directory.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Chunk, IndexStats, RetrievedChunk};

use super::embedding::EmbeddingProvider;
use super::vector_store::VectorIndex;

/// File name of the persisted index inside the storage directory
const INDEX_FILE: &str = "index.json";

/// Chunks embedded per batch during a build
const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    /// `<provider>/<model>` of the embedder that produced the vectors
    embedder: String,
    dimensions: usize,
    entries: Vec<IndexedChunk>,
}

/// Flat cosine-similarity index persisted as JSON
pub struct LocalVectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    storage_dir: PathBuf,
    entries: RwLock<Vec<IndexedChunk>>,
}

impl LocalVectorIndex {
    /// Create an empty index; nothing is read from disk until [`VectorIndex::load`]
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            storage_dir: storage_dir.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    fn index_path(&self) -> PathBuf {
        self.storage_dir.join(INDEX_FILE)
    }

    fn embedder_id(&self) -> String {
        format!("{}/{}", self.embedder.name(), self.embedder.model())
    }

    async fn persist(&self) -> Result<()> {
        let persisted = {
            let entries = self.entries.read();
            PersistedIndex {
                embedder: self.embedder_id(),
                dimensions: self.embedder.dimensions(),
                entries: entries.clone(),
            }
        };

        tokio::fs::create_dir_all(&self.storage_dir).await?;
        let json = serde_json::to_vec(&persisted)?;
        tokio::fs::write(self.index_path(), json).await?;

        tracing::info!(
            "Persisted {} chunks to {}",
            persisted.entries.len(),
            self.index_path().display()
        );
        Ok(())
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn build(&self, chunks: &[Chunk]) -> Result<IndexStats> {
        tracing::info!("Embedding {} chunks with {}", chunks.len(), self.embedder_id());
        let dimensions = self.embedder.dimensions();

        let mut built: Vec<IndexedChunk> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                if embedding.len() != dimensions {
                    return Err(Error::vector_index(format!(
                        "Embedding dimension mismatch: {} expects {}, got {} (check embeddings.dimensions)",
                        self.embedder_id(),
                        dimensions,
                        embedding.len()
                    )));
                }
                built.push(IndexedChunk {
                    chunk: chunk.clone(),
                    embedding,
                });
            }
        }

        *self.entries.write() = built;
        self.persist().await?;
        Ok(self.stats().await)
    }

    async fn load(&self) -> Result<bool> {
        let path = self.index_path();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("No persisted index at {}", path.display());
            return Ok(false);
        }

        let raw = tokio::fs::read(&path).await?;
        let persisted: PersistedIndex = serde_json::from_slice(&raw)
            .map_err(|e| Error::vector_index(format!("Corrupt index file {}: {}", path.display(), e)))?;

        let expected = self.embedder_id();
        if persisted.embedder != expected {
            return Err(Error::vector_index(format!(
                "Index at {} was built with {}, current embedder is {}",
                path.display(),
                persisted.embedder,
                expected
            )));
        }

        let dimensions = self.embedder.dimensions();
        let stale = persisted
            .entries
            .iter()
            .any(|e| e.embedding.len() != dimensions);
        if persisted.dimensions != dimensions || stale {
            return Err(Error::vector_index(format!(
                "Index at {} has {}-dimensional vectors, current embedder produces {}",
                path.display(),
                persisted.dimensions,
                dimensions
            )));
        }

        let count = persisted.entries.len();
        *self.entries.write() = persisted.entries;

        tracing::info!("Loaded {} chunks from {}", count, path.display());
        Ok(count > 0)
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 || self.entries.read().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let entries = self.entries.read();
        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&query_embedding, &entry.embedding)))
            .collect();

        // Stable sort keeps input order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| RetrievedChunk::from_chunk(&entries[i].chunk, score))
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().clear();

        let path = self.index_path();
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path).await?;
        }
        tracing::info!("Cleared vector index");
        Ok(())
    }

    async fn stats(&self) -> IndexStats {
        let entries = self.entries.read();
        let sources: BTreeSet<&str> = entries.iter().map(|e| e.chunk.source_id.as_str()).collect();

        IndexStats {
            total_chunks: entries.len(),
            total_sources: sources.len(),
            dimensions: entries.first().map(|e| e.embedding.len()).unwrap_or(0),
        }
    }

    fn name(&self) -> &str {
        "local-flat"
    }
}
