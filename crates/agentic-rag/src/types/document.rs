//! Document, chunk and retrieval types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Per-file metadata recorded while the corpus is extracted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// File name (used as the chunk source id)
    pub filename: String,
    /// Full path on disk
    pub path: PathBuf,
    /// File size in bytes
    pub size_bytes: u64,
    /// SHA-256 of the raw file, hex encoded
    pub content_hash: String,
    /// Total number of pages (if the parser could count them)
    pub total_pages: Option<u32>,
    /// Number of chunks produced from this file
    pub chunk_count: usize,
    /// Last modification time reported by the filesystem
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl DocumentRecord {
    /// File size in megabytes, rounded to two decimals
    pub fn size_mb(&self) -> f64 {
        (self.size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// A chunk of text produced by ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Source file name
    pub source_id: String,
    /// 0-based position within the source
    pub position: usize,
    /// Text content
    pub text: String,
    /// Length of `text` in characters
    pub size: usize,
    /// Number of chunks the source produced
    pub total_in_source: usize,
    /// Page count of the source document
    pub page_count: Option<u32>,
    /// Character position in the original document
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Create a new chunk; `total_in_source` is filled in once the source is fully chunked
    pub fn new(
        source_id: impl Into<String>,
        position: usize,
        text: String,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        let size = text.chars().count();
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.into(),
            position,
            text,
            size,
            total_in_source: 0,
            page_count: None,
            char_start,
            char_end,
        }
    }
}

/// A chunk returned by the retrieval oracle for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk text
    pub text: String,
    /// Source file name
    pub source_id: String,
    /// Position of the chunk within its source
    pub position_in_source: usize,
    /// Similarity score, when the oracle reports one
    pub score: Option<f32>,
}

impl RetrievedChunk {
    /// Build from an indexed chunk and its similarity score
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            text: chunk.text.clone(),
            source_id: chunk.source_id.clone(),
            position_in_source: chunk.position,
            score: Some(score),
        }
    }

    /// Header prepended to the chunk text in the prompt context
    pub fn citation_header(&self) -> String {
        format!("Source: {} (Chunk {})", self.source_id, self.position_in_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_counts_chars() {
        let chunk = Chunk::new("a.pdf", 0, "héllo".to_string(), 0, 5);
        assert_eq!(chunk.size, 5);
        assert_eq!(chunk.total_in_source, 0);
    }

    #[test]
    fn test_citation_header() {
        let chunk = Chunk::new("guide.pdf", 3, "text".to_string(), 0, 4);
        let retrieved = RetrievedChunk::from_chunk(&chunk, 0.42);
        assert_eq!(retrieved.citation_header(), "Source: guide.pdf (Chunk 3)");
        assert_eq!(retrieved.score, Some(0.42));
    }

    #[test]
    fn test_size_mb() {
        let record = DocumentRecord {
            filename: "a.pdf".to_string(),
            path: PathBuf::from("data/a.pdf"),
            size_bytes: 3 * 1024 * 1024 / 2,
            content_hash: String::new(),
            total_pages: Some(2),
            chunk_count: 4,
            last_modified: None,
        };
        assert_eq!(record.size_mb(), 1.5);
    }
}
