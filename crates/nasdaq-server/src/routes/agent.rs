//! `GET /api/v1/agent/info`

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use nasdaq_agent::AgentDescriptor;

pub async fn info(State(state): State<AppState>) -> Json<AgentDescriptor> {
    Json(state.descriptor())
}
