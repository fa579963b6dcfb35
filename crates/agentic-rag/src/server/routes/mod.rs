//! API routes for the agentic RAG server

pub mod query;
pub mod session;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::generation::PROVIDER_PRIORITY;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Session lifecycle
        .route("/initialize", post(session::initialize))
        .route("/rebuild", post(session::rebuild))
        // Query
        .route("/query", post(query::query))
        .route("/test", post(query::test_system))
        // Status
        .route("/status", get(session::status))
        .route("/documents", get(session::documents))
        .route("/providers/health", get(session::provider_health))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "agentic-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Agentic question answering over a PDF corpus with multi-provider fallback",
        "uptime_secs": state.uptime_secs(),
        "provider_priority": PROVIDER_PRIORITY,
        "configured_providers": state.config().llm.configured_providers(),
        "endpoints": {
            "POST /api/initialize": "Load the persisted index or build it from the corpus",
            "POST /api/rebuild": "Clear the index and re-extract the corpus",
            "POST /api/query": "Answer a question through the agentic workflow",
            "POST /api/test": "Run a fixed smoke-test query",
            "GET /api/status": "Session phase, index statistics and configuration",
            "GET /api/documents": "Per-document metadata",
            "GET /api/providers/health": "Probe each configured LLM provider"
        }
    }))
}
