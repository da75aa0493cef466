//! `POST /a2a`

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use nasdaq_agent::A2aMessage;

/// Handle one A2A envelope. Any well-formed envelope gets a 200 reply.
pub async fn message(
    State(state): State<AppState>,
    payload: Result<Json<A2aMessage>, JsonRejection>,
) -> ApiResult<Json<A2aMessage>> {
    let Json(message) = payload?;
    Ok(Json(state.a2a.handle(message).await))
}
