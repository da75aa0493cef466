//! Liveness and diagnostics
//!
//! - `GET /health`: always 200 while the process is up
//! - `GET /status`: uptime, analysis counters and conversation count

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use nasdaq_agent::StatsSnapshot;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub agent_id: String,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub model: String,
    pub conversations: usize,
    pub analyses: StatsSnapshot,
    pub timestamp: DateTime<Utc>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        agent_id: state.identity.id.clone(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime().as_secs(),
        model: state.orchestrator.model().to_string(),
        conversations: state.a2a.conversations().len(),
        analyses: state.orchestrator.stats(),
        timestamp: Utc::now(),
    })
}
