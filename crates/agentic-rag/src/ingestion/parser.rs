//! PDF text extraction

use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::error::{Error, Result};

/// Glyph names some PDF fonts leak into extracted text
const GLYPH_NAMES: &[(&str, &str)] = &[
    ("uni2010", "-"),
    ("uni2011", "-"),
    ("uni2013", "-"),
    ("uni2014", "--"),
    ("uni2018", "'"),
    ("uni2019", "'"),
    ("uni201C", "\""),
    ("uni201D", "\""),
    ("uni2022", "* "),
    ("uni2026", "..."),
    ("uni00A0", " "),
    ("uni2212", "-"),
];

/// Typographic characters folded to ASCII before chunking
const CHAR_FOLDS: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up extracted PDF text: glyph names, ligatures, null chars and blank lines
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.replace('\0', "");

    for (glyph, replacement) in GLYPH_NAMES {
        for pattern in [format!("({})", glyph), format!("<{}>", glyph)] {
            result = result.replace(&pattern, replacement);
        }
    }
    for (ch, replacement) in CHAR_FOLDS {
        result = result.replace(*ch, replacement);
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text extracted from one PDF
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    /// Cleaned text content
    pub content: String,
    /// SHA-256 of the raw file bytes
    pub content_hash: String,
    /// Page count (if lopdf could read the page tree)
    pub total_pages: Option<u32>,
}

/// PDF parser: `pdf-extract` first, raw `lopdf` page extraction as fallback
#[derive(Debug, Clone)]
pub struct PdfParser {
    timeout: Duration,
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl PdfParser {
    /// Create a parser with a per-file extraction deadline
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Parse one PDF held in memory
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedPdf> {
        let raw = self.extract_with_timeout(filename, data)?;
        let content = cleanup_pdf_text(&raw);

        if content.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        let total_pages = lopdf::Document::load_mem(data)
            .ok()
            .map(|doc| doc.get_pages().len() as u32);

        Ok(ParsedPdf {
            content,
            content_hash: hash_bytes(data),
            total_pages,
        })
    }

    /// Run pdf-extract on a helper thread so a pathological font cannot hang ingestion
    fn extract_with_timeout(&self, filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Ok(_)) => {
                let _ = handle.join();
                tracing::debug!("pdf-extract returned no text for {}, trying fallback", filename);
                Self::extract_fallback(filename, data)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed for {}: {}, trying fallback", filename, e);
                Self::extract_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The extraction thread cannot be cancelled; it is left to finish on its own
                tracing::error!(
                    "PDF extraction of {} timed out after {}s",
                    filename,
                    self.timeout.as_secs()
                );
                Self::extract_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed on {}", filename);
                Self::extract_fallback(filename, data)
            }
        }
    }

    /// Fallback extraction using lopdf page by page
    fn extract_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut all_text = String::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) if !text.trim().is_empty() => {
                    all_text.push_str(&text);
                    all_text.push('\n');
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Could not extract page {} of {}: {}", page_num, filename, e);
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }

        Ok(all_text)
    }
}

/// SHA-256 of raw bytes, hex encoded
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
