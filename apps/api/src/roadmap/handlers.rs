//! Axum route handlers for the Roadmap API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::roadmap::{Roadmap, RoadmapRequest, SavedRoadmap, SkillLevel};
use crate::roadmap::generator::{generate_and_save, GenerateOutcome};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRoadmapRequest {
    pub job_role: String,
    pub skill_level: SkillLevel,
    /// Save the result for the caller right away.
    #[serde(default)]
    pub save: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/roadmaps/generate
///
/// Open to anonymous callers. Saving requires an identity; a failed save does not
/// fail the request.
pub async fn handle_generate(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(body): Json<GenerateRoadmapRequest>,
) -> Result<Json<GenerateOutcome>, AppError> {
    let request = RoadmapRequest {
        job_role: body.job_role,
        skill_level: body.skill_level,
    }
    .validated()
    .map_err(AppError::Validation)?;

    let owner = user.map(|AuthUser(id)| id);
    let outcome = generate_and_save(
        state.ai.as_ref(),
        state.store.as_ref(),
        &request,
        owner.as_ref(),
        body.save,
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /api/v1/roadmaps
///
/// Saves a roadmap the caller generated earlier.
pub async fn handle_save(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(roadmap): Json<Roadmap>,
) -> Result<(StatusCode, Json<SavedRoadmap>), AppError> {
    if roadmap.job_role.trim().is_empty() {
        return Err(AppError::Validation("job_role cannot be empty".to_string()));
    }
    if roadmap.steps.is_empty() {
        return Err(AppError::Validation(
            "A roadmap needs at least one step".to_string(),
        ));
    }
    if let Some(index) = roadmap
        .steps
        .iter()
        .position(|s| s.title.trim().is_empty() || s.description.trim().is_empty())
    {
        return Err(AppError::Validation(format!(
            "Step {index} needs a title and a description"
        )));
    }

    let saved = state.store.save(&roadmap, &owner).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/roadmaps
///
/// The caller's saved roadmaps, newest first.
pub async fn handle_list(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<Json<Vec<SavedRoadmap>>, AppError> {
    let roadmaps = state.store.list_by_owner(&owner).await?;
    Ok(Json(roadmaps))
}

/// GET /api/v1/roadmaps/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedRoadmap>, AppError> {
    state
        .store
        .get_for_owner(id, &owner)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Roadmap {id} not found")))
}
