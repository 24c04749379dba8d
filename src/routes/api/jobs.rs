use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Serialize;

use crate::error::AppError;
use crate::jobs::{FilterChip, FilterOptions, JobCollectionState, JobQuery, filter_jobs};
use crate::models::job::Job;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub filtered_count: usize,
    /// True when any search, filter or sort is applied; clients should not
    /// page on scroll while filtering.
    pub filtering: bool,
    pub active_filters: Vec<FilterChip>,
    #[serde(flatten)]
    pub collection: CollectionSummary,
}

/// Collection state without the job list itself.
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub loaded_count: usize,
    pub total_count: u64,
    pub has_more: bool,
    pub next_offset: u64,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

impl From<&JobCollectionState> for CollectionSummary {
    fn from(s: &JobCollectionState) -> Self {
        Self {
            loaded_count: s.jobs.len(),
            total_count: s.total_count,
            has_more: s.has_more,
            next_offset: s.next_offset,
            loading: s.loading,
            loading_more: s.loading_more,
            error: s.error.clone(),
        }
    }
}

/// GET /api/v1/jobs
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> Json<JobListResponse> {
    let query = query.normalized();
    let snapshot = state.jobs.snapshot();
    let jobs = filter_jobs(&snapshot.jobs, &query);

    Json(JobListResponse {
        filtered_count: jobs.len(),
        jobs,
        filtering: query.is_filtering(),
        active_filters: query.active_filters(),
        collection: CollectionSummary::from(&snapshot),
    })
}

/// GET /api/v1/jobs/options
pub async fn options(State(state): State<AppState>) -> Json<FilterOptions> {
    let snapshot = state.jobs.snapshot();
    Json(FilterOptions::from_jobs(&snapshot.jobs))
}

pub async fn get(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Job>, AppError> {
    state
        .jobs
        .find(&guid)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {guid} not found")))
}

/// POST /api/v1/jobs/refresh
pub async fn refresh(State(state): State<AppState>) -> Json<CollectionSummary> {
    state.jobs.refetch().await;
    Json(CollectionSummary::from(&state.jobs.snapshot()))
}

/// POST /api/v1/jobs/more
///
/// Answers immediately with the current state when a load is already
/// running or every page has been fetched.
pub async fn load_more(State(state): State<AppState>) -> Json<serde_json::Value> {
    let started = state.jobs.load_more().await;
    let summary = CollectionSummary::from(&state.jobs.snapshot());
    Json(serde_json::json!({
        "started": started,
        "collection": summary,
    }))
}
