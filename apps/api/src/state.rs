use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::llm_client::CompletionClient;
use crate::store::RoadmapStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Gemini in production; swapped for canned clients in tests.
    pub ai: Arc<dyn CompletionClient>,
    /// PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn RoadmapStore>,
    pub identity: Arc<dyn IdentityProvider>,
}
