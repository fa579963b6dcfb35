//! Agent workflow: retrieve, analyze, generate, evaluate, and bounded improvement
//!
//! ```text
//! retrieve -> analyze -> generate -> evaluate -> {improve -> evaluate}* -> end
//! ```
//!
//! No stage aborts the run. Failures are recorded on the state and the
//! workflow always reaches the terminal stage.

use std::sync::Arc;
use std::time::Duration;

use crate::generation::{FallbackGenerator, PromptBuilder, ProviderSelector};
use crate::providers::Retriever;

use super::confidence::{ConfidencePolicy, DEFAULT_CONFIDENCE};
use super::state::{Stage, WorkflowState, QUALITY_ASSESSMENT, QUERY_ANALYSIS};

/// Upper bound on improve iterations per query
pub const MAX_IMPROVEMENT_ATTEMPTS: u32 = 3;

/// Confidence assigned to a freshly generated response
pub const INITIAL_CONFIDENCE: f32 = 0.8;

/// Improve raises confidence by this step
pub const IMPROVEMENT_STEP: f32 = 0.1;

/// Improve never raises confidence above this
pub const IMPROVEMENT_CEILING: f32 = 0.95;

/// Per-run settings, resolved from configuration and query overrides
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub confidence_threshold: f32,
    pub top_k: usize,
    pub selector: ProviderSelector,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            top_k: 5,
            selector: ProviderSelector::Auto,
        }
    }
}

/// Decide the stage after `stage`; `None` is terminal
///
/// Routing to Improve is the only place `improvement_attempts` is incremented.
pub fn next_stage(stage: Stage, state: &mut WorkflowState, threshold: f32) -> Option<Stage> {
    match stage {
        Stage::Start => Some(Stage::Retrieve),
        Stage::Retrieve => Some(Stage::Analyze),
        Stage::Analyze => Some(Stage::Generate),
        Stage::Generate => Some(Stage::Evaluate),
        Stage::Evaluate => {
            if state.improvement_attempts < MAX_IMPROVEMENT_ATTEMPTS && state.confidence < threshold {
                state.improvement_attempts += 1;
                tracing::info!(
                    "Low confidence ({:.2}), improving response (attempt {}/{})",
                    state.confidence,
                    state.improvement_attempts,
                    MAX_IMPROVEMENT_ATTEMPTS
                );
                Some(Stage::Improve)
            } else {
                tracing::info!(
                    "Ending workflow with confidence {:.2} after {} improvement attempts",
                    state.confidence,
                    state.improvement_attempts
                );
                None
            }
        }
        Stage::Improve => Some(Stage::Evaluate),
    }
}

/// The agentic RAG workflow
pub struct AgentWorkflow {
    retriever: Arc<dyn Retriever>,
    generator: Arc<FallbackGenerator>,
    policy: ConfidencePolicy,
    retrieval_timeout: Duration,
}

impl AgentWorkflow {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<FallbackGenerator>,
        policy: ConfidencePolicy,
        retrieval_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            generator,
            policy,
            retrieval_timeout,
        }
    }

    /// Run one query to completion
    pub async fn run(&self, query: &str, options: &WorkflowOptions) -> WorkflowState {
        let mut state = WorkflowState::new(query);
        let mut stage = next_stage(Stage::Start, &mut state, options.confidence_threshold);

        while let Some(current) = stage {
            state.enter(current);
            match current {
                Stage::Start => {}
                Stage::Retrieve => self.retrieve(&mut state, options).await,
                Stage::Analyze => self.analyze(&mut state, options).await,
                Stage::Generate => self.generate(&mut state, options).await,
                Stage::Evaluate => self.evaluate(&mut state, options).await,
                Stage::Improve => self.improve(&mut state, options).await,
            }
            stage = next_stage(current, &mut state, options.confidence_threshold);
        }

        state
    }

    async fn retrieve(&self, state: &mut WorkflowState, options: &WorkflowOptions) {
        tracing::info!("Retrieving documents for query: {}", state.query);

        let result = tokio::time::timeout(
            self.retrieval_timeout,
            self.retriever.retrieve(&state.query, options.top_k),
        )
        .await;

        let chunks = match result {
            Ok(Ok(chunks)) => chunks,
            Ok(Err(e)) => {
                tracing::error!("Document retrieval failed: {}", e);
                state.error = Some(format!("Error in document retrieval: {}", e));
                return;
            }
            Err(_) => {
                tracing::error!("Document retrieval timed out");
                state.error = Some(format!(
                    "Error in document retrieval: timed out after {}s",
                    self.retrieval_timeout.as_secs()
                ));
                return;
            }
        };

        if chunks.is_empty() {
            tracing::warn!("No relevant documents found");
            state.error = Some("No relevant documents found".to_string());
            return;
        }

        state.context = PromptBuilder::build_context(&chunks);
        state.sources = chunks.iter().map(|c| c.source_id.clone()).collect();
        tracing::info!(
            "Retrieved {} chunks from {} sources",
            chunks.len(),
            state.sources.len()
        );
        state.retrieved_chunks = chunks;
    }

    async fn analyze(&self, state: &mut WorkflowState, options: &WorkflowOptions) {
        let prompt = PromptBuilder::query_analysis(&state.query, state.retrieved_chunks.len());

        match self.generator.generate(&prompt, &options.selector).await {
            Ok(generation) => {
                state.provider_tags.push(generation.provider_tag);
                state.note(QUERY_ANALYSIS, generation.text);
                tracing::debug!("Query analysis completed");
            }
            Err(e) => {
                tracing::warn!("Query analysis failed, proceeding with default approach: {}", e);
            }
        }
    }

    async fn generate(&self, state: &mut WorkflowState, options: &WorkflowOptions) {
        if state.context.is_empty() {
            state.error = Some("No context available for response generation".to_string());
            return;
        }

        let prompt = PromptBuilder::grounded_answer(&state.query, &state.context);
        match self.generator.generate(&prompt, &options.selector).await {
            Ok(generation) => {
                tracing::info!("Response generated by {}", generation.provider_tag);
                state.provider_tags.push(generation.provider_tag);
                state.response = generation.text;
                state.set_confidence(INITIAL_CONFIDENCE);
            }
            Err(e) => {
                tracing::error!("Response generation failed: {}", e);
                state.error = Some(format!("Response generation failed: {}", e));
            }
        }
    }

    async fn evaluate(&self, state: &mut WorkflowState, options: &WorkflowOptions) {
        if state.response.is_empty() {
            state.record_error_once("No response to evaluate");
            return;
        }

        let prompt = PromptBuilder::quality_evaluation(&state.query, &state.response, &state.context);
        match self.generator.generate(&prompt, &options.selector).await {
            Ok(generation) => {
                let confidence = self.policy.score(&generation.text);
                state.provider_tags.push(generation.provider_tag);
                state.set_assessment(generation.text);
                state.set_confidence(confidence);
                tracing::info!("Response evaluation completed. Confidence: {:.2}", state.confidence);
            }
            Err(e) => {
                tracing::warn!("Response evaluation failed: {}", e);
                state.set_confidence(DEFAULT_CONFIDENCE);
            }
        }
    }

    async fn improve(&self, state: &mut WorkflowState, options: &WorkflowOptions) {
        if state.response.is_empty() {
            return;
        }

        let prompt = PromptBuilder::improvement(
            &state.query,
            &state.response,
            state.evaluation_notes.get(QUALITY_ASSESSMENT).map(String::as_str),
            &state.context,
        );

        match self.generator.generate(&prompt, &options.selector).await {
            Ok(generation) => {
                state.provider_tags.push(generation.provider_tag);
                state.response = generation.text;
                state.set_confidence((state.confidence + IMPROVEMENT_STEP).min(IMPROVEMENT_CEILING));
                tracing::info!("Response improved");
            }
            Err(e) => {
                tracing::warn!("Response improvement failed: {}", e);
            }
        }
    }
}
