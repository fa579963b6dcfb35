//! Document ingestion: PDF extraction, chunking, and the corpus walker

mod chunker;
mod corpus;
mod parser;

pub use chunker::TextChunker;
pub use corpus::PdfCorpus;
pub use parser::{cleanup_pdf_text, hash_bytes, ParsedPdf, PdfParser};
