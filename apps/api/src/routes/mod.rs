pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::roadmap::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/roadmaps/generate", post(handlers::handle_generate))
        .route(
            "/api/v1/roadmaps",
            get(handlers::handle_list).post(handlers::handle_save),
        )
        .route("/api/v1/roadmaps/:id", get(handlers::handle_get))
        .with_state(state)
}
