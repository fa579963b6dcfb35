//! Query endpoints

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::session::TEST_QUERY;
use crate::types::{QueryRequest, QueryResult, SystemTestResult};

/// POST /api/query - Run the agentic workflow for one question
///
/// Always answers with a [`QueryResult`] envelope; failures are reported in
/// `success` and `error` rather than the status code.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResult> {
    tracing::info!("Query: \"{}\"", request.query);
    Json(
        state
            .session()
            .process_query(&request.query, request.options)
            .await,
    )
}

/// POST /api/test - Run a fixed smoke-test query
pub async fn test_system(State(state): State<AppState>) -> Json<SystemTestResult> {
    tracing::info!("Running system test: \"{}\"", TEST_QUERY);
    Json(state.session().test_system().await)
}
