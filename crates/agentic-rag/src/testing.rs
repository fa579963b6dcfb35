//! Test doubles shared by the unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::{DocumentSource, EmbeddingProvider, LlmProvider, Retriever};
use crate::types::{Chunk, DocumentRecord, RetrievedChunk};

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Generation provider driven by a closure, counting its calls
pub struct ScriptedProvider {
    name: String,
    responder: Responder,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn from_fn<F>(name: &str, responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns the prompt unchanged
    pub fn echo(name: &str) -> Self {
        Self::from_fn(name, |prompt| Ok(prompt.to_string()))
    }

    /// Always returns `text`
    pub fn replying(name: &str, text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(name, move |_| Ok(text.clone()))
    }

    /// Always fails
    pub fn failing(name: &str) -> Self {
        let owned = name.to_string();
        Self::from_fn(name, move |_| Err(Error::llm(owned.clone(), "scripted failure")))
    }

    /// Answers every prompt with `answer`, except evaluation prompts which get `assessment`
    pub fn with_assessment(name: &str, answer: &str, assessment: &str) -> Self {
        let answer = answer.to_string();
        let assessment = assessment.to_string();
        Self::from_fn(name, move |prompt| {
            if is_evaluation(prompt) {
                Ok(assessment.clone())
            } else {
                Ok(answer.clone())
            }
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

/// True for prompts produced by the quality evaluation template
pub fn is_evaluation(prompt: &str) -> bool {
    prompt.starts_with("Evaluate the quality")
}

/// True for prompts produced by the improvement template
pub fn is_improvement(prompt: &str) -> bool {
    prompt.starts_with("The previous response")
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(prompt)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok((self.responder)("health").is_ok())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Deterministic bag-of-words embedder
pub struct HashEmbedder {
    dimensions: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            model: "bag-of-words".to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() as usize) % self.dimensions] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Document source returning fixed chunks, counting extractions
pub struct CountingSource {
    chunks: Mutex<Vec<Chunk>>,
    extractions: AtomicUsize,
}

impl CountingSource {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: Mutex::new(chunks),
            extractions: AtomicUsize::new(0),
        }
    }

    /// Replace what later extractions return
    pub fn set_chunks(&self, chunks: Vec<Chunk>) {
        *self.chunks.lock() = chunks;
    }

    /// One source file with one chunk
    pub fn single(source: &str, text: &str) -> Self {
        let mut chunk = Chunk::new(source, 0, text.to_string(), 0, text.len());
        chunk.total_in_source = 1;
        Self::new(vec![chunk])
    }

    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for CountingSource {
    async fn extract_and_chunk(&self) -> Result<Vec<Chunk>> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        Ok(self.chunks.lock().clone())
    }

    async fn documents(&self) -> Vec<DocumentRecord> {
        let chunks = self.chunks.lock().clone();
        let mut records: Vec<DocumentRecord> = Vec::new();
        for chunk in &chunks {
            match records.iter_mut().find(|r| r.filename == chunk.source_id) {
                Some(record) => record.chunk_count += 1,
                None => records.push(DocumentRecord {
                    filename: chunk.source_id.clone(),
                    path: chunk.source_id.clone().into(),
                    size_bytes: chunk.text.len() as u64,
                    content_hash: String::new(),
                    total_pages: chunk.page_count,
                    chunk_count: 1,
                    last_modified: None,
                }),
            }
        }
        records
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Retriever returning a fixed result, counting calls
pub struct StaticRetriever {
    result: std::result::Result<Vec<RetrievedChunk>, String>,
    calls: AtomicUsize,
}

impl StaticRetriever {
    pub fn returning(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            result: Ok(chunks),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::returning(Vec::new())
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(chunks) => Ok(chunks.iter().take(k).cloned().collect()),
            Err(message) => Err(Error::vector_index(message.clone())),
        }
    }
}

/// A retrieved chunk with a fixed score
pub fn retrieved(source: &str, position: usize, text: &str) -> RetrievedChunk {
    RetrievedChunk {
        text: text.to_string(),
        source_id: source.to_string(),
        position_in_source: position,
        score: Some(0.9),
    }
}
