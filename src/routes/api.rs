// JSON API endpoints served by this app itself (everything vehicle-shaped
// goes through the /apix proxy instead).

use axum::{extract::State, response::{IntoResponse, Json}};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: f64,
    environment: &'static str,
    version: String,
}

const ENVIRONMENT: &str = if cfg!(debug_assertions) {
    "development"
} else {
    "production"
};

pub async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: app_state.started_at.elapsed().as_secs_f64(),
        environment: ENVIRONMENT,
        version: app_state.settings.app.version.clone(),
    })
}
