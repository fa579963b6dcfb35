//! Application state for the HTTP server

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::Result;
use crate::session::SessionCoordinator;
use crate::types::SessionPhase;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    session: SessionCoordinator,
    started_at: Instant,
}

impl AppState {
    /// Create state with the default collaborators for `config`
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (providers: {:?})",
            config.llm.configured_providers()
        );
        Ok(Self::with_session(SessionCoordinator::from_config(config)?))
    }

    /// Wrap an already constructed session
    pub fn with_session(session: SessionCoordinator) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                session,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn session(&self) -> &SessionCoordinator {
        &self.inner.session
    }

    pub fn config(&self) -> &RagConfig {
        self.inner.session.config()
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }

    /// True once the session accepts queries
    pub async fn is_ready(&self) -> bool {
        self.inner.session.phase().await == SessionPhase::Ready
    }
}
