//! Router construction

use crate::routes::{a2a, agent, analysis, health};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .route("/api/v1/analyze", post(analysis::analyze))
        .route("/api/v1/agent/info", get(agent::info))
        .route("/a2a", post(a2a::message))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
