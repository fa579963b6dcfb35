//! Sentence-aware text chunking with position tracking

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap (both in characters)
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size: 20,
        }
    }

    /// Create a chunker from the `[chunking]` configuration section
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap).with_min_size(config.min_chunk_size)
    }

    /// Set the minimum chunk size
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Chunk the full text of one source document
    ///
    /// Chunks are numbered from 0 in document order and carry the source's
    /// chunk total and page count.
    pub fn chunk_text(&self, source_id: &str, text: &str, page_count: Option<u32>) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        let mut current_chunk = String::new();
        let mut current_len = 0usize;
        let mut current_start = 0usize;
        let mut char_pos = 0usize;

        for sentence in text.split_sentence_bounds().flat_map(|s| self.split_oversized(s)) {
            let sentence_len = sentence.chars().count();

            if current_len > 0 && current_len + sentence_len > self.chunk_size {
                self.push_chunk(&mut chunks, source_id, &current_chunk, current_start, char_pos);

                current_chunk = self.overlap_text(&current_chunk);
                current_len = current_chunk.chars().count();
                current_start = char_pos.saturating_sub(current_len);
            }

            current_chunk.push_str(sentence);
            current_len += sentence_len;
            char_pos += sentence_len;
        }

        self.push_chunk(&mut chunks, source_id, &current_chunk, current_start, char_pos);

        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.total_in_source = total;
            chunk.page_count = page_count;
        }

        chunks
    }

    /// Split a sentence longer than the chunk size at word boundaries,
    /// cutting inside a word only when the word itself is too long
    fn split_oversized<'a>(&self, sentence: &'a str) -> Vec<&'a str> {
        let limit = self.chunk_size.max(1);
        if sentence.chars().count() <= limit {
            return vec![sentence];
        }

        let mut pieces = Vec::new();
        let mut start = 0usize;
        let mut len = 0usize;

        for (idx, word) in sentence.split_word_bound_indices() {
            let word_len = word.chars().count();
            if len > 0 && len + word_len > limit {
                pieces.push(&sentence[start..idx]);
                start = idx;
                len = 0;
            }

            if word_len > limit {
                for (offset, _) in word.char_indices() {
                    if len == limit {
                        pieces.push(&sentence[start..idx + offset]);
                        start = idx + offset;
                        len = 0;
                    }
                    len += 1;
                }
            } else {
                len += word_len;
            }
        }

        if start < sentence.len() {
            pieces.push(&sentence[start..]);
        }
        pieces
    }

    fn push_chunk(
        &self,
        chunks: &mut Vec<Chunk>,
        source_id: &str,
        text: &str,
        char_start: usize,
        char_end: usize,
    ) {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_size {
            return;
        }

        let position = chunks.len();
        chunks.push(Chunk::new(
            source_id,
            position,
            trimmed.to_string(),
            char_start,
            char_end,
        ));
    }

    /// Get overlap text from the end of a chunk
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.chars().count() <= self.overlap {
            return text.to_string();
        }

        let start = text
            .char_indices()
            .rev()
            .nth(self.overlap - 1)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let overlap_text = &text[start..];

        // Prefer starting at a sentence boundary, then a word boundary
        if let Some(pos) = overlap_text.find(". ") {
            return overlap_text[pos + 2..].to_string();
        }
        if let Some(pos) = overlap_text.find(' ') {
            return overlap_text[pos + 1..].to_string();
        }

        overlap_text.to_string()
    }
}
