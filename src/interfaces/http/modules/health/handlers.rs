//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::commands::SharedPendingCommands;
use crate::application::session::SharedSessionRegistry;

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub sessions: SharedSessionRegistry,
    pub pending: SharedPendingCommands,
    pub started_at: Arc<Instant>,
}

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub connected_charge_stations: usize,
    /// Commands accepted and still waiting for the station's answer
    pub pending_commands: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        connected_charge_stations: state.sessions.count(),
        pending_commands: state.pending.len(),
    })
}
