/**
 * Health Check Handler
 *
 * GET /api/health - unauthenticated liveness probe reporting process
 * uptime. Sits inside the /api rate-limit scope like everything else.
 */

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::server::state::AppState;

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since process start
    pub uptime: f64,
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}
