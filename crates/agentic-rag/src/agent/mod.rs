//! Agentic answer workflow with self-evaluation and bounded improvement

pub mod confidence;
pub mod state;
pub mod workflow;

pub use confidence::ConfidencePolicy;
pub use state::{Stage, WorkflowState};
pub use workflow::{next_stage, AgentWorkflow, WorkflowOptions, MAX_IMPROVEMENT_ATTEMPTS};
