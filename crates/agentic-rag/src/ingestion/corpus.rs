//! Directory-of-PDFs document source

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::DocumentSource;
use crate::types::{Chunk, DocumentRecord};

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// A flat directory of `*.pdf` files
pub struct PdfCorpus {
    inner: Arc<CorpusInner>,
}

struct CorpusInner {
    data_dir: PathBuf,
    parser: PdfParser,
    chunker: TextChunker,
    records: RwLock<Vec<DocumentRecord>>,
}

impl PdfCorpus {
    /// Create a corpus rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>, parser: PdfParser, chunker: TextChunker) -> Self {
        Self {
            inner: Arc::new(CorpusInner {
                data_dir: data_dir.into(),
                parser,
                chunker,
                records: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Create from the `[corpus]` and `[chunking]` configuration sections
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(
            config.corpus.data_dir.clone(),
            PdfParser::new(Duration::from_secs(config.corpus.extract_timeout_secs)),
            TextChunker::from_config(&config.chunking),
        )
    }

    /// PDF files directly inside the data directory, sorted by file name
    pub fn pdf_files(&self) -> Vec<PathBuf> {
        self.inner.pdf_files()
    }
}

impl CorpusInner {
    fn pdf_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
            })
            .collect();

        files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
        files
    }

    fn process_file(&self, path: &Path) -> Result<(DocumentRecord, Vec<Chunk>)> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::file_parse(path.display().to_string(), "Path has no file name"))?;

        let data = std::fs::read(path)?;
        let metadata = std::fs::metadata(path)?;
        let parsed = self.parser.parse(&filename, &data)?;
        let chunks = self.chunker.chunk_text(&filename, &parsed.content, parsed.total_pages);

        let record = DocumentRecord {
            filename,
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            content_hash: parsed.content_hash,
            total_pages: parsed.total_pages,
            chunk_count: chunks.len(),
            last_modified: metadata.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
        };

        Ok((record, chunks))
    }

    /// File metadata without parsing, for sessions restored from a persisted index
    fn scan_metadata(&self) -> Vec<DocumentRecord> {
        self.pdf_files()
            .into_iter()
            .filter_map(|path| {
                let metadata = std::fs::metadata(&path).ok()?;
                Some(DocumentRecord {
                    filename: path.file_name()?.to_string_lossy().to_string(),
                    size_bytes: metadata.len(),
                    content_hash: String::new(),
                    total_pages: None,
                    chunk_count: 0,
                    last_modified: metadata.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
                    path,
                })
            })
            .collect()
    }

    fn extract_blocking(&self) -> Result<Vec<Chunk>> {
        if !self.data_dir.is_dir() {
            return Err(Error::NoDocuments(format!(
                "data directory {} does not exist",
                self.data_dir.display()
            )));
        }

        let files = self.pdf_files();
        tracing::info!("Found {} PDF files in {}", files.len(), self.data_dir.display());

        let mut records = Vec::new();
        let mut all_chunks = Vec::new();

        for path in &files {
            match self.process_file(path) {
                Ok((record, chunks)) => {
                    tracing::info!("Processed {}: {} chunks", record.filename, chunks.len());
                    records.push(record);
                    all_chunks.extend(chunks);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        *self.records.write() = records;
        Ok(all_chunks)
    }
}

#[async_trait]
impl DocumentSource for PdfCorpus {
    async fn extract_and_chunk(&self) -> Result<Vec<Chunk>> {
        // PDF parsing is CPU bound and uses blocking file IO
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.extract_blocking())
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?
    }

    async fn documents(&self) -> Vec<DocumentRecord> {
        let records = self.inner.records.read().clone();
        if !records.is_empty() {
            return records;
        }

        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.scan_metadata())
            .await
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "pdf-directory"
    }
}
