//! Document source trait: where indexed chunks come from

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{Chunk, DocumentRecord};

/// Trait for a corpus that can be extracted into chunks
///
/// Implementations:
/// - `PdfCorpus`: a directory of PDF files
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Extract and chunk every document
    ///
    /// Output is deterministic: ordered by source file name, then by position
    /// within the source.
    async fn extract_and_chunk(&self) -> Result<Vec<Chunk>>;

    /// Per-file metadata from the most recent extraction
    async fn documents(&self) -> Vec<DocumentRecord>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
