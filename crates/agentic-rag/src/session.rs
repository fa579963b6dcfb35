//! Session coordinator: index lifecycle and query routing
//!
//! Phases move `Uninitialized -> Indexed -> Ready`. Queries hold a read guard
//! on the session for the whole workflow run; initialize and rebuild hold the
//! write guard, so a rebuild never interleaves with a running query. The read
//! guard is owned by the spawned workflow task, so it outlives a caller that
//! stops waiting.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::agent::{AgentWorkflow, WorkflowOptions};
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{FallbackGenerator, ProviderRegistry, ProviderSelector};
use crate::ingestion::PdfCorpus;
use crate::providers::{
    DocumentSource, EmbeddingProvider, IndexRetriever, LocalVectorIndex, OllamaEmbedder,
    Retriever, VectorIndex,
};
use crate::types::{
    DocumentInfo, DocumentSummary, InitializeResult, ProviderHealth, QueryOptions, QueryResult,
    SessionPhase, SystemStatus, SystemTestResult,
};

/// Query used by [`SessionCoordinator::test_system`]
pub const TEST_QUERY: &str = "What is the main topic of these documents?";

/// External collaborators the coordinator drives
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<ProviderRegistry>,
    pub source: Arc<dyn DocumentSource>,
    pub index: Arc<dyn VectorIndex>,
    pub retriever: Arc<dyn Retriever>,
}

impl Collaborators {
    /// Wire the default stack: PDF directory, Ollama embeddings, local index
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::from_config(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OllamaEmbedder::from_config(&config.embeddings)?);
        let index: Arc<dyn VectorIndex> = Arc::new(LocalVectorIndex::new(
            embedder,
            config.vector_db.storage_dir.clone(),
        ));
        let retriever: Arc<dyn Retriever> = Arc::new(IndexRetriever::new(Arc::clone(&index)));
        let source: Arc<dyn DocumentSource> = Arc::new(PdfCorpus::from_config(config));

        Ok(Self {
            registry,
            source,
            index,
            retriever,
        })
    }
}

struct SessionInner {
    phase: SessionPhase,
    workflow: Option<Arc<AgentWorkflow>>,
    documents_processed: usize,
}

/// Outcome of populating the index
struct Populated {
    loaded_from_disk: bool,
    documents: usize,
}

/// Owns the session lifecycle and routes queries to the workflow
pub struct SessionCoordinator {
    config: RagConfig,
    generator: Arc<FallbackGenerator>,
    source: Arc<dyn DocumentSource>,
    index: Arc<dyn VectorIndex>,
    retriever: Arc<dyn Retriever>,
    session: Arc<RwLock<SessionInner>>,
}

impl SessionCoordinator {
    pub fn new(config: RagConfig, collaborators: Collaborators) -> Self {
        let generator = Arc::new(FallbackGenerator::new(
            collaborators.registry,
            Duration::from_secs(config.llm.timeout_secs),
        ));

        Self {
            config,
            generator,
            source: collaborators.source,
            index: collaborators.index,
            retriever: collaborators.retriever,
            session: Arc::new(RwLock::new(SessionInner {
                phase: SessionPhase::Uninitialized,
                workflow: None,
                documents_processed: 0,
            })),
        }
    }

    /// Build the coordinator with the default collaborators for `config`
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::new(config, collaborators))
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> SessionPhase {
        self.session.read().await.phase
    }

    /// Populate the index (reusing a persisted one unless forced) and build the workflow
    pub async fn initialize(&self, force_rebuild: bool) -> InitializeResult {
        let mut session = self.session.write().await;
        session.phase = SessionPhase::Uninitialized;
        session.workflow = None;
        session.documents_processed = 0;

        tracing::info!("Initializing session (force_rebuild: {})", force_rebuild);

        if let Err(e) = self.check_config() {
            tracing::error!("Initialization failed: {}", e);
            return InitializeResult::failure(e.to_string());
        }

        let populated = match self.populate_index(force_rebuild).await {
            Ok(populated) => populated,
            Err(e) => {
                tracing::error!("Initialization failed: {}", e);
                return InitializeResult::failure(e.to_string());
            }
        };

        session.phase = SessionPhase::Indexed;
        session.documents_processed = populated.documents;

        let workflow = AgentWorkflow::new(
            Arc::clone(&self.retriever),
            Arc::clone(&self.generator),
            self.config.workflow.confidence_policy,
            Duration::from_secs(self.config.workflow.retrieval_timeout_secs),
        );
        session.workflow = Some(Arc::new(workflow));
        session.phase = SessionPhase::Ready;

        let stats = self.index.stats().await;
        let message = if populated.loaded_from_disk {
            format!("Loaded existing index with {} chunks", stats.total_chunks)
        } else {
            format!(
                "Indexed {} chunks from {} documents",
                stats.total_chunks, populated.documents
            )
        };
        tracing::info!("{}", message);

        InitializeResult {
            success: true,
            message,
            error: None,
            documents_processed: populated.documents,
            chunks_indexed: stats.total_chunks,
            loaded_from_disk: populated.loaded_from_disk,
        }
    }

    /// Clear the index and re-extract the corpus
    pub async fn rebuild(&self) -> InitializeResult {
        tracing::info!("Rebuilding vector index");
        self.initialize(true).await
    }

    fn check_config(&self) -> Result<()> {
        self.config.validate()?;
        if self.generator.registry().is_empty() {
            return Err(Error::config(
                "no generation provider configured (set GOOGLE_API_KEY, OPENAI_API_KEY or enable Ollama)",
            ));
        }
        Ok(())
    }

    async fn populate_index(&self, force_rebuild: bool) -> Result<Populated> {
        if force_rebuild {
            self.index.clear().await?;
        } else {
            match self.index.load().await {
                Ok(true) => {
                    let stats = self.index.stats().await;
                    return Ok(Populated {
                        loaded_from_disk: true,
                        documents: stats.total_sources,
                    });
                }
                Ok(false) => {}
                Err(e) => tracing::warn!("Persisted index unusable, rebuilding: {}", e),
            }
        }

        let chunks = self.source.extract_and_chunk().await?;
        if chunks.is_empty() {
            return Err(Error::NoDocuments(
                "no text could be extracted from the corpus".to_string(),
            ));
        }

        let documents = chunks
            .iter()
            .map(|c| c.source_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        self.index.build(&chunks).await?;
        Ok(Populated {
            loaded_from_disk: false,
            documents,
        })
    }

    fn resolve_options(&self, options: &QueryOptions) -> WorkflowOptions {
        let selector = options
            .provider
            .as_deref()
            .map(|p| p.parse().unwrap_or_default())
            .unwrap_or(ProviderSelector::Auto);

        WorkflowOptions {
            confidence_threshold: options
                .confidence_threshold
                .unwrap_or(self.config.workflow.confidence_threshold)
                .clamp(0.0, 1.0),
            top_k: options.top_k.unwrap_or(self.config.workflow.top_k).max(1),
            selector,
        }
    }

    /// Run one query through the workflow
    ///
    /// Always returns an envelope; a fault inside the workflow task becomes
    /// `success: false` with the fault as the error.
    pub async fn process_query(&self, query: &str, options: QueryOptions) -> QueryResult {
        let started = Instant::now();

        if query.trim().is_empty() {
            return QueryResult::failure(query, "Query must not be empty");
        }

        let session = Arc::clone(&self.session).read_owned().await;
        let workflow = match (session.phase, &session.workflow) {
            (SessionPhase::Ready, Some(workflow)) => Arc::clone(workflow),
            _ => {
                tracing::warn!("Query rejected: system not initialized");
                return QueryResult::not_initialized(query);
            }
        };

        let options = self.resolve_options(&options);
        let owned_query = query.to_string();
        let handle = tokio::spawn(async move {
            let state = workflow.run(&owned_query, &options).await;
            drop(session);
            state
        });

        let result = match handle.await {
            Ok(state) => state.into_result(started.elapsed().as_millis() as u64),
            Err(e) => {
                tracing::error!("Workflow task failed: {}", e);
                let mut failure =
                    QueryResult::failure(query, format!("Unexpected error while processing query: {}", e));
                failure.processing_time_ms = started.elapsed().as_millis() as u64;
                failure
            }
        };

        tracing::info!(
            "Query finished in {}ms (success: {}, confidence: {:.2}, improvements: {})",
            result.processing_time_ms,
            result.success,
            result.confidence,
            result.improvement_attempts
        );
        result
    }

    /// Phase, corpus counts, configured providers and configuration
    pub async fn status(&self) -> SystemStatus {
        let session = self.session.read().await;
        SystemStatus {
            phase: session.phase,
            initialized: session.phase == SessionPhase::Ready,
            documents_processed: session.documents_processed,
            index: self.index.stats().await,
            providers: self.generator.registry().statuses(),
            config: self.config.snapshot(),
        }
    }

    /// Probe each generation provider; fails when none is configured
    pub async fn provider_health(&self) -> Result<Vec<ProviderHealth>> {
        if self.generator.registry().is_empty() {
            return Err(Error::NoProviderAvailable(ProviderSelector::Auto.to_string()));
        }
        Ok(self.generator.health().await)
    }

    /// Per-file metadata and index statistics
    pub async fn document_info(&self) -> DocumentInfo {
        let session = self.session.read().await;
        if session.documents_processed == 0 {
            return DocumentInfo::empty("No documents processed yet");
        }

        let records = self.source.documents().await;
        let index = self.index.stats().await;

        DocumentInfo {
            success: true,
            total_documents: records.len().max(index.total_sources),
            total_chunks: index.total_chunks,
            documents: records.iter().map(DocumentSummary::from).collect(),
            index,
            error: None,
        }
    }

    /// Run a fixed smoke-test query
    pub async fn test_system(&self) -> SystemTestResult {
        let result = self.process_query(TEST_QUERY, QueryOptions::default()).await;
        SystemTestResult {
            system_working: result.success,
            test_query: TEST_QUERY.to_string(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LlmProvider;
    use crate::testing::{CountingSource, HashEmbedder, ScriptedProvider, StaticRetriever};
    use crate::types::Chunk;
    use std::path::Path;

    struct Harness {
        coordinator: SessionCoordinator,
        source: Arc<CountingSource>,
        providers: Vec<Arc<ScriptedProvider>>,
    }

    fn local_index(dir: &Path) -> Arc<dyn VectorIndex> {
        local_index_with(dir, HashEmbedder::new(32))
    }

    fn local_index_with(dir: &Path, embedder: HashEmbedder) -> Arc<dyn VectorIndex> {
        Arc::new(LocalVectorIndex::new(Arc::new(embedder), dir))
    }

    fn harness_with(
        source: CountingSource,
        providers: Vec<ScriptedProvider>,
        index: Arc<dyn VectorIndex>,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> Harness {
        let source = Arc::new(source);
        let providers: Vec<Arc<ScriptedProvider>> = providers.into_iter().map(Arc::new).collect();
        let registry = ProviderRegistry::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn LlmProvider>)
                .collect(),
        );
        let retriever: Arc<dyn Retriever> = match retriever {
            Some(retriever) => retriever,
            None => Arc::new(IndexRetriever::new(Arc::clone(&index))),
        };

        let collaborators = Collaborators {
            registry: Arc::new(registry),
            source: source.clone(),
            index,
            retriever,
        };

        Harness {
            coordinator: SessionCoordinator::new(RagConfig::default(), collaborators),
            source,
            providers,
        }
    }

    fn harness(dir: &Path, source: CountingSource, providers: Vec<ScriptedProvider>) -> Harness {
        harness_with(source, providers, local_index(dir), None)
    }

    #[tokio::test]
    async fn test_single_chunk_corpus_with_echo_provider() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("guide.pdf", "Aspirin reduces fever in adults."),
            vec![ScriptedProvider::echo("ollama")],
        );

        let init = h.coordinator.initialize(false).await;
        assert!(init.success, "{:?}", init.error);
        assert_eq!(init.chunks_indexed, 1);
        assert_eq!(h.coordinator.phase().await, SessionPhase::Ready);

        let result = h
            .coordinator
            .process_query("What does aspirin do?", QueryOptions::default())
            .await;
        assert!(result.success);
        assert!(!result.response.is_empty());
        assert_eq!(result.sources, vec!["guide.pdf"]);
        assert_eq!(&result.workflow_steps[..3], &["retrieve", "analyze", "generate"]);
    }

    #[tokio::test]
    async fn test_empty_corpus_fails_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::new(Vec::new()),
            vec![ScriptedProvider::echo("ollama")],
        );

        let init = h.coordinator.initialize(false).await;
        assert!(!init.success);
        assert!(init.error.unwrap().contains("No documents"));
        assert_eq!(h.coordinator.phase().await, SessionPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_query_before_initialize_touches_nothing() {
        let retriever = Arc::new(StaticRetriever::empty());
        let dir = tempfile::tempdir().unwrap();
        let h = harness_with(
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
            local_index(dir.path()),
            Some(retriever.clone()),
        );

        let result = h.coordinator.process_query("hello", QueryOptions::default()).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("system not initialized"));
        assert_eq!(h.source.extractions(), 0);
        assert_eq!(retriever.calls(), 0);
        assert_eq!(h.providers[0].calls(), 0);
    }

    #[tokio::test]
    async fn test_second_initialize_reuses_index() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
        );

        assert!(h.coordinator.initialize(false).await.success);
        assert_eq!(h.source.extractions(), 1);

        let second = h.coordinator.initialize(false).await;
        assert!(second.success);
        assert!(second.loaded_from_disk);
        assert_eq!(h.source.extractions(), 1);

        // A fresh process over the same storage directory also skips extraction
        let restarted = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
        );
        assert!(restarted.coordinator.initialize(false).await.success);
        assert_eq!(restarted.source.extractions(), 0);
        assert_eq!(restarted.coordinator.status().await.documents_processed, 1);
    }

    #[tokio::test]
    async fn test_rebuild_re_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
        );

        assert!(h.coordinator.initialize(false).await.success);
        let rebuilt = h.coordinator.rebuild().await;
        assert!(rebuilt.success);
        assert!(!rebuilt.loaded_from_disk);
        assert_eq!(h.source.extractions(), 2);
    }

    #[tokio::test]
    async fn test_no_providers_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            Vec::new(),
        );

        let init = h.coordinator.initialize(false).await;
        assert!(!init.success);
        assert!(init.error.unwrap().contains("Configuration error"));
        assert_eq!(h.source.extractions(), 0);
    }

    #[tokio::test]
    async fn test_zero_chunks_retrieved() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness_with(
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
            local_index(dir.path()),
            Some(Arc::new(StaticRetriever::empty())),
        );
        assert!(h.coordinator.initialize(false).await.success);

        let result = h.coordinator.process_query("q", QueryOptions::default()).await;
        assert!(!result.success);
        assert!(result.response.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("No context available for response generation")
        );
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![
                ScriptedProvider::failing("google"),
                ScriptedProvider::failing("openai"),
                ScriptedProvider::failing("ollama"),
            ],
        );
        assert!(h.coordinator.initialize(false).await.success);

        let result = h.coordinator.process_query("q", QueryOptions::default()).await;
        assert!(!result.success);
        assert!(result.response.is_empty());
        assert!(result.error.unwrap().contains("All LLM providers failed"));
    }

    #[tokio::test]
    async fn test_panic_becomes_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::from_fn("ollama", |_| panic!("provider exploded"))],
        );
        assert!(h.coordinator.initialize(false).await.success);

        let result = h.coordinator.process_query("q", QueryOptions::default()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Unexpected error while processing query"));

        // The session survives the fault
        assert_eq!(h.coordinator.phase().await, SessionPhase::Ready);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
        );
        let result = h.coordinator.process_query("   ", QueryOptions::default()).await;
        assert_eq!(result.error.as_deref(), Some("Query must not be empty"));
    }

    #[tokio::test]
    async fn test_named_provider_option() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![
                ScriptedProvider::with_assessment("google", "from google", "good"),
                ScriptedProvider::with_assessment("ollama", "from ollama", "good"),
            ],
        );
        assert!(h.coordinator.initialize(false).await.success);

        let result = h
            .coordinator
            .process_query("q", QueryOptions::default().with_provider("ollama"))
            .await;
        assert_eq!(result.response, "from ollama");
        assert!(result.provider_tags.iter().all(|t| t == "ollama"));
        assert_eq!(h.providers[0].calls(), 0);
    }

    #[tokio::test]
    async fn test_status_and_document_info() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = vec![
            Chunk::new("a.pdf", 0, "First chunk of a.".to_string(), 0, 17),
            Chunk::new("a.pdf", 1, "Second chunk of a.".to_string(), 17, 35),
            Chunk::new("b.pdf", 0, "Only chunk of b.".to_string(), 0, 16),
        ];
        let h = harness(
            dir.path(),
            CountingSource::new(chunks),
            vec![ScriptedProvider::echo("ollama"), ScriptedProvider::echo("google")],
        );

        let before = h.coordinator.document_info().await;
        assert!(!before.success);
        assert_eq!(before.error.as_deref(), Some("No documents processed yet"));
        assert!(!h.coordinator.status().await.initialized);

        assert!(h.coordinator.initialize(false).await.success);

        let status = h.coordinator.status().await;
        assert!(status.initialized);
        assert_eq!(status.documents_processed, 2);
        assert_eq!(status.index.total_chunks, 3);
        let names: Vec<&str> = status.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["google", "ollama"]);

        let info = h.coordinator.document_info().await;
        assert!(info.success);
        assert_eq!(info.total_documents, 2);
        assert_eq!(info.total_chunks, 3);
        assert_eq!(info.documents[0].chunk_count, 2);
    }

    #[tokio::test]
    async fn test_system_smoke_query() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::with_assessment("ollama", "It is about text.", "good")],
        );

        assert!(!h.coordinator.test_system().await.system_working);
        assert!(h.coordinator.initialize(false).await.success);

        let report = h.coordinator.test_system().await;
        assert!(report.system_working);
        assert_eq!(report.test_query, TEST_QUERY);
    }

    #[tokio::test]
    async fn test_abandoned_query_still_blocks_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::with_assessment("ollama", "answer", "good")
                .with_delay(Duration::from_millis(100))],
        );
        assert!(h.coordinator.initialize(false).await.success);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(30),
            h.coordinator.process_query("q", QueryOptions::default()),
        )
        .await;
        assert!(abandoned.is_err());

        // The workflow task keeps the session read guard until it finishes
        assert!(h.coordinator.rebuild().await.success);
        let calls_at_rebuild = h.providers[0].calls();
        assert_eq!(calls_at_rebuild, 3);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(h.providers[0].calls(), calls_at_rebuild);
    }

    #[tokio::test]
    async fn test_index_from_other_embedder_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = vec![
            Chunk::new("a.pdf", 0, "insulin regulates blood glucose".to_string(), 0, 31),
            Chunk::new("b.pdf", 0, "bones contain calcium and phosphate".to_string(), 0, 35),
        ];

        let first = harness_with(
            CountingSource::new(chunks.clone()),
            vec![ScriptedProvider::echo("ollama")],
            local_index_with(dir.path(), HashEmbedder::new(16)),
            None,
        );
        assert!(first.coordinator.initialize(false).await.success);

        let index = local_index_with(dir.path(), HashEmbedder::new(32));
        let restarted = harness_with(
            CountingSource::new(chunks),
            vec![ScriptedProvider::echo("ollama")],
            Arc::clone(&index),
            None,
        );
        let init = restarted.coordinator.initialize(false).await;
        assert!(init.success);
        assert!(!init.loaded_from_disk);
        assert_eq!(restarted.source.extractions(), 1);

        let hits = index.query("bones contain calcium and phosphate", 2).await.unwrap();
        assert_eq!(hits[0].source_id, "b.pdf");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_failed_rebuild_forgets_documents() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            dir.path(),
            CountingSource::single("a.pdf", "Some document text here."),
            vec![ScriptedProvider::echo("ollama")],
        );
        assert!(h.coordinator.initialize(false).await.success);
        assert!(h.coordinator.document_info().await.success);

        h.source.set_chunks(Vec::new());
        assert!(!h.coordinator.rebuild().await.success);

        let status = h.coordinator.status().await;
        assert_eq!(status.phase, SessionPhase::Uninitialized);
        assert_eq!(status.documents_processed, 0);
        let info = h.coordinator.document_info().await;
        assert_eq!(info.error.as_deref(), Some("No documents processed yet"));
    }
}
