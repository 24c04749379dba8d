pub mod applications;
pub mod jobs;
pub mod saved;
pub mod theme;

use axum::Router;
use axum::routing::{get, post};

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Jobs
        .route("/jobs", get(jobs::list))
        .route("/jobs/options", get(jobs::options))
        .route("/jobs/refresh", post(jobs::refresh))
        .route("/jobs/more", post(jobs::load_more))
        .route("/jobs/{guid}", get(jobs::get))
        // Saved jobs
        .route(
            "/saved",
            get(saved::list).post(saved::create).delete(saved::clear),
        )
        .route("/saved/{guid}", get(saved::get).delete(saved::delete))
        // Applications
        .route(
            "/applications",
            get(applications::list)
                .post(applications::create)
                .delete(applications::clear),
        )
        .route(
            "/applications/{guid}",
            get(applications::get).delete(applications::delete),
        )
        // Theme
        .route("/theme", get(theme::get).put(theme::update))
        .route("/theme/toggle", post(theme::toggle))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

/// Refuse store access until persisted data has been loaded.
fn ensure_hydrated(hydrated: bool, store: &str) -> Result<(), AppError> {
    if hydrated {
        Ok(())
    } else {
        Err(AppError::Unavailable(format!("{store} are still loading")))
    }
}
