use axum::{Json, extract::State};

use crate::middleware::GenerationPreprocess;
use crate::types::{GenerateReply, Health, RawListing};
use crate::{RelayError, router::RelayState};

/// POST /api/gemini
pub async fn generate_handler(
    State(state): State<RelayState>,
    GenerationPreprocess(req): GenerationPreprocess,
) -> Result<Json<GenerateReply>, RelayError> {
    let generation = state
        .router
        .generate(&req.prompt, req.model_hint.as_deref())
        .await?;
    Ok(Json(generation.into()))
}

/// GET /api/gemini/models -> raw upstream listings for both API versions.
pub async fn models_handler(State(state): State<RelayState>) -> Result<Json<RawListing>, RelayError> {
    Ok(Json(state.router.list_models().await?))
}

pub async fn health_handler(State(state): State<RelayState>) -> Json<Health> {
    Json(state.router.health())
}
