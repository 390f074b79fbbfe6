use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub contacts: usize,
    pub birthdays: bool,
}

// GET /v1/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        contacts: state.directory.len(),
        birthdays: state.birthdays.is_some() && state.config.birthdays.enabled,
    })
}
