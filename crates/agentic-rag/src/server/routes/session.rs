//! Session lifecycle and status endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{DocumentInfo, InitializeRequest, InitializeResult, ProviderHealth, SystemStatus};

fn initialize_response(result: InitializeResult) -> (StatusCode, Json<InitializeResult>) {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(result))
}

/// POST /api/initialize - Load or build the index; body `{"force_rebuild": bool}` is optional
pub async fn initialize(
    State(state): State<AppState>,
    request: Option<Json<InitializeRequest>>,
) -> (StatusCode, Json<InitializeResult>) {
    let force_rebuild = request.map(|Json(r)| r.force_rebuild).unwrap_or(false);
    initialize_response(state.session().initialize(force_rebuild).await)
}

/// POST /api/rebuild - Clear the index and re-extract the corpus
pub async fn rebuild(State(state): State<AppState>) -> (StatusCode, Json<InitializeResult>) {
    initialize_response(state.session().rebuild().await)
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.session().status().await)
}

/// GET /api/documents
pub async fn documents(State(state): State<AppState>) -> Json<DocumentInfo> {
    Json(state.session().document_info().await)
}

/// GET /api/providers/health
pub async fn provider_health(State(state): State<AppState>) -> Result<Json<Vec<ProviderHealth>>> {
    let health = state.session().provider_health().await?;
    Ok(Json(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;
    use crate::generation::ProviderRegistry;
    use crate::providers::{IndexRetriever, LlmProvider, LocalVectorIndex, VectorIndex};
    use crate::server::routes::query;
    use crate::session::{Collaborators, SessionCoordinator};
    use crate::testing::{CountingSource, HashEmbedder, ScriptedProvider};
    use crate::types::{QueryOptions, QueryRequest, SessionPhase};
    use std::sync::Arc;

    fn app_state(dir: &std::path::Path, source: CountingSource) -> AppState {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(ScriptedProvider::with_assessment("ollama", "Grounded answer.", "good"));
        app_state_with(dir, source, vec![provider])
    }

    fn app_state_with(
        dir: &std::path::Path,
        source: CountingSource,
        providers: Vec<Arc<dyn LlmProvider>>,
    ) -> AppState {
        let index: Arc<dyn VectorIndex> =
            Arc::new(LocalVectorIndex::new(Arc::new(HashEmbedder::new(16)), dir));
        let collaborators = Collaborators {
            registry: Arc::new(ProviderRegistry::new(providers)),
            source: Arc::new(source),
            retriever: Arc::new(IndexRetriever::new(Arc::clone(&index))),
            index,
        };
        AppState::with_session(SessionCoordinator::new(RagConfig::default(), collaborators))
    }

    #[tokio::test]
    async fn test_initialize_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path(), CountingSource::single("a.pdf", "Some document text."));

        assert!(!state.is_ready().await);
        let Json(status) = status(State(state.clone())).await;
        assert_eq!(status.phase, SessionPhase::Uninitialized);

        let (code, Json(init)) = initialize(State(state.clone()), None).await;
        assert_eq!(code, StatusCode::OK);
        assert!(init.success);
        assert!(state.is_ready().await);

        let request = QueryRequest {
            query: "What is in the document?".to_string(),
            options: QueryOptions::default(),
        };
        let Json(result) = query::query(State(state.clone()), Json(request)).await;
        assert!(result.success);
        assert_eq!(result.response, "Grounded answer.");
    }

    #[tokio::test]
    async fn test_failed_initialize_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path(), CountingSource::new(Vec::new()));

        let (code, Json(init)) = rebuild(State(state.clone())).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!init.success);

        let Json(info) = documents(State(state)).await;
        assert!(!info.success);
    }

    #[tokio::test]
    async fn test_provider_health_lists_providers() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path(), CountingSource::new(Vec::new()));

        let Json(health) = provider_health(State(state)).await.unwrap();
        assert_eq!(health.len(), 1);
        assert_eq!(health[0].name, "ollama");
        assert!(health[0].healthy);
    }

    #[tokio::test]
    async fn test_provider_health_without_providers_is_error_response() {
        use axum::response::IntoResponse;

        let dir = tempfile::tempdir().unwrap();
        let state = app_state_with(dir.path(), CountingSource::new(Vec::new()), Vec::new());

        let err = match provider_health(State(state)).await {
            Ok(_) => panic!("expected an error without providers"),
            Err(err) => err,
        };
        assert!(matches!(err, crate::error::Error::NoProviderAvailable(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["type"], "no_provider");
    }
}
