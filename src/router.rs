use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::gemini::{generate_handler, health_handler, models_handler};
use crate::service::ModelRouter;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone)]
pub struct RelayState {
    pub router: ModelRouter,
}

impl RelayState {
    pub fn new(router: ModelRouter) -> Self {
        Self { router }
    }
}

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/api/gemini", post(generate_handler))
        .route("/api/gemini/models", get(models_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
