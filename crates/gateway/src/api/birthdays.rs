use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::Instrument;

use crate::runtime::birthdays::local_today;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RunBirthdaysRequest {
    /// Generate without sending. Defaults to `birthdays.dry_run`.
    #[serde(default)]
    pub dry_run: Option<bool>,
    /// Local date to run for; defaults to today in `birthdays.timezone`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

// POST /v1/birthdays/run
pub async fn run_now(
    State(state): State<AppState>,
    body: Option<Json<RunBirthdaysRequest>>,
) -> impl IntoResponse {
    let Some(job) = state.birthdays.clone() else {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "birthday announcements are not configured (birthdays.group_id is empty)" })),
        )
            .into_response();
    };

    let req = body.map(|Json(b)| b).unwrap_or_default();
    let cfg = &state.config.birthdays;
    let date = req.date.unwrap_or_else(|| local_today(&cfg.timezone));
    let dry_run = req.dry_run.unwrap_or(cfg.dry_run);

    let span = tracing::info_span!("birthday_run", %date, manual = true);
    let report = job.run_for(date, dry_run).instrument(span).await;
    Json(report).into_response()
}
