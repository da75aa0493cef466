//! `POST /api/v1/analyze`

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use nasdaq_agent::{AnalysisResult, Query};
use serde::Deserialize;
use tracing::error;

pub const MAX_QUERY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
}

/// Trimmed query, 1 to [`MAX_QUERY_CHARS`] characters
fn validate_query(raw: &str) -> ApiResult<&str> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "query exceeds {MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(query)
}

/// Run the analysis pipeline.
///
/// Every domain outcome, including an unresolvable query, is a 200 with the
/// terminal state inside the body.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let Json(request) = payload?;
    let query = Query::new(validate_query(&request.query)?);

    // Detached so the run still completes and is audited if the client leaves
    let orchestrator = state.orchestrator.clone();
    let result = tokio::spawn(async move { orchestrator.run(query).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Analysis task aborted");
            ApiError::Internal("analysis task aborted".to_string())
        })?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query() {
        assert_eq!(validate_query("  AAPL ").unwrap(), "AAPL");
        assert!(validate_query("   ").is_err());
        assert!(validate_query(&"a".repeat(MAX_QUERY_CHARS)).is_ok());
        assert!(validate_query(&"a".repeat(MAX_QUERY_CHARS + 1)).is_err());
        assert!(validate_query(&"é".repeat(MAX_QUERY_CHARS)).is_ok());
    }
}
