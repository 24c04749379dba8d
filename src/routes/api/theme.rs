use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::models::ThemeMode;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub mode: ThemeMode,
    pub is_dark: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTheme {
    pub mode: ThemeMode,
}

fn current(state: &AppState) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        mode: state.theme.mode(),
        is_dark: state.theme.is_dark(),
    })
}

pub async fn get(State(state): State<AppState>) -> Json<ThemeResponse> {
    current(&state)
}

pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<UpdateTheme>,
) -> Json<ThemeResponse> {
    state.theme.set(input.mode).await;
    current(&state)
}

pub async fn toggle(State(state): State<AppState>) -> Json<ThemeResponse> {
    state.theme.toggle().await;
    current(&state)
}
