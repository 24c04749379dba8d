use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::SavedJob;
use crate::routes::api::ensure_hydrated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveJobRequest {
    pub guid: String,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SavedJob>>, AppError> {
    ensure_hydrated(state.saved.hydrated(), "Saved jobs")?;
    Ok(Json(state.saved.entries()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<SavedJob>, AppError> {
    ensure_hydrated(state.saved.hydrated(), "Saved jobs")?;
    state
        .saved
        .get(&guid)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {guid} is not saved")))
}

/// POST /api/v1/saved
///
/// Saves a snapshot of a job from the loaded collection. Saving the same
/// job again refreshes the snapshot.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<SaveJobRequest>,
) -> Result<Json<SavedJob>, AppError> {
    ensure_hydrated(state.saved.hydrated(), "Saved jobs")?;
    if input.guid.is_empty() {
        return Err(AppError::BadRequest("No job guid provided".to_string()));
    }

    let job = state
        .jobs
        .find(&input.guid)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", input.guid)))?;

    let entry = SavedJob::new(job);
    state.saved.add(entry.clone()).await;
    tracing::info!("Saved job {}", input.guid);
    Ok(Json(entry))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_hydrated(state.saved.hydrated(), "Saved jobs")?;
    let removed = state.saved.remove(&guid).await;
    Ok(Json(serde_json::json!({ "deleted": removed })))
}

pub async fn clear(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    ensure_hydrated(state.saved.hydrated(), "Saved jobs")?;
    state.saved.clear().await;
    Ok(Json(serde_json::json!({ "cleared": true })))
}
