pub mod api;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::state::AppState;

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// The full HTTP surface, without middleware layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(api::router(state))
}
