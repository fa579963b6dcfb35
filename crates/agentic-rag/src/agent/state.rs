//! Per-query workflow state

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::{QueryResult, RetrievedChunk};

/// Evaluation note written by the analyze stage
pub const QUERY_ANALYSIS: &str = "query_analysis";
/// Evaluation note written by the evaluate stage
pub const QUALITY_ASSESSMENT: &str = "quality_assessment";

/// Workflow stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Start,
    Retrieve,
    Analyze,
    Generate,
    Evaluate,
    Improve,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Retrieve => "retrieve",
            Self::Analyze => "analyze",
            Self::Generate => "generate",
            Self::Evaluate => "evaluate",
            Self::Improve => "improve",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State threaded through every stage of one query
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub query: String,
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub context: String,
    pub response: String,
    /// Always within [0, 1]
    pub confidence: f32,
    pub sources: BTreeSet<String>,
    /// Append-only notes keyed by [`QUERY_ANALYSIS`] and [`QUALITY_ASSESSMENT`]
    pub evaluation_notes: BTreeMap<String, String>,
    pub error: Option<String>,
    pub current_stage: Stage,
    /// Never exceeds the workflow's improvement budget
    pub improvement_attempts: u32,
    /// Every stage executed, in order
    pub history: Vec<Stage>,
    /// Tag of each successful generation call
    pub provider_tags: Vec<String>,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            retrieved_chunks: Vec::new(),
            context: String::new(),
            response: String::new(),
            confidence: 0.0,
            sources: BTreeSet::new(),
            evaluation_notes: BTreeMap::new(),
            error: None,
            current_stage: Stage::Start,
            improvement_attempts: 0,
            history: Vec::new(),
            provider_tags: Vec::new(),
        }
    }

    /// Record entry into a stage
    pub fn enter(&mut self, stage: Stage) {
        self.current_stage = stage;
        self.history.push(stage);
    }

    /// Set the confidence, clamped to [0, 1]
    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    /// Record an error unless an earlier one is already set
    pub fn record_error_once(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    /// Add a note unless the key is already present
    pub fn note(&mut self, key: &str, value: String) {
        self.evaluation_notes.entry(key.to_string()).or_insert(value);
    }

    /// Replace the quality assessment with the latest evaluation
    pub fn set_assessment(&mut self, value: String) {
        self.evaluation_notes.insert(QUALITY_ASSESSMENT.to_string(), value);
    }

    /// Build the caller-facing result envelope
    pub fn into_result(self, processing_time_ms: u64) -> QueryResult {
        QueryResult {
            success: !self.response.trim().is_empty(),
            query: self.query,
            response: self.response,
            confidence: self.confidence,
            sources: self.sources.into_iter().collect(),
            evaluation: self.evaluation_notes,
            workflow_steps: self.history.iter().map(|s| s.as_str().to_string()).collect(),
            improvement_attempts: self.improvement_attempts,
            provider_tags: self.provider_tags,
            error: self.error,
            processing_time_ms,
        }
    }
}
