use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Application, ApplicationForm};
use crate::routes::api::ensure_hydrated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApplication {
    pub guid: String,
    #[serde(flatten)]
    pub form: ApplicationForm,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Application>>, AppError> {
    ensure_hydrated(state.applications.hydrated(), "Applications")?;
    Ok(Json(state.applications.entries()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Application>, AppError> {
    ensure_hydrated(state.applications.hydrated(), "Applications")?;
    state
        .applications
        .get(&guid)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No application for job {guid}")))
}

/// POST /api/v1/applications
///
/// Validates the applicant details and records an application against a
/// snapshot of the job. Re-applying replaces the earlier application.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateApplication>,
) -> Result<Json<Application>, AppError> {
    ensure_hydrated(state.applications.hydrated(), "Applications")?;
    input.form.validate().map_err(AppError::Validation)?;

    let job = state
        .jobs
        .find(&input.guid)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", input.guid)))?;

    let application = Application::new(job, input.form);
    state.applications.add(application.clone()).await;
    tracing::info!("Recorded application for job {}", application.id);
    Ok(Json(application))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_hydrated(state.applications.hydrated(), "Applications")?;
    let removed = state.applications.remove(&guid).await;
    Ok(Json(serde_json::json!({ "deleted": removed })))
}

pub async fn clear(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    ensure_hydrated(state.applications.hydrated(), "Applications")?;
    state.applications.clear().await;
    Ok(Json(serde_json::json!({ "cleared": true })))
}
