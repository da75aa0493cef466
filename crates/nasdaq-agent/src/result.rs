//! Terminal outcome of one analysis run

use crate::engine::AnalysisFailureReason;
use crate::market::DataUnavailable;
use crate::model::{Action, MarketSnapshot, Recommendation};
use crate::resolver::{ResolvedSymbol, Suggestion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Resolving,
    Fetching,
    Reasoning,
}

/// Why a run ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NoMatch,
    ParseError,
    ServiceError,
    Timeout,
}

impl From<AnalysisFailureReason> for FailureReason {
    fn from(reason: AnalysisFailureReason) -> Self {
        match reason {
            AnalysisFailureReason::ParseError => Self::ParseError,
            AnalysisFailureReason::ServiceError => Self::ServiceError,
            AnalysisFailureReason::Timeout => Self::Timeout,
        }
    }
}

/// Final classification of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerminalState {
    Completed,
    Failed {
        stage: Stage,
        reason: FailureReason,
        detail: String,
    },
}

impl TerminalState {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Failure reason, if the run failed
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Completed => None,
            Self::Failed { reason, .. } => Some(*reason),
        }
    }
}

/// Everything gathered for one query, returned to the caller and audited
///
/// Stages that did not run leave their fields empty. A failed market data
/// fetch leaves `snapshot` empty and records why in `market_data_issue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request_id: Uuid,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub symbol: Option<ResolvedSymbol>,
    pub snapshot: Option<MarketSnapshot>,
    pub market_data_issue: Option<DataUnavailable>,
    pub recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    pub latency_ms: u64,
    pub completed_at: DateTime<Utc>,
    pub terminal_state: TerminalState,
}

impl AnalysisResult {
    pub fn ticker(&self) -> Option<&str> {
        self.symbol.as_ref().map(|s| s.ticker.as_str())
    }

    pub fn action(&self) -> Option<Action> {
        self.recommendation.as_ref().map(|r| r.action)
    }

    pub fn confidence(&self) -> Option<u8> {
        self.recommendation.as_ref().map(|r| r.confidence)
    }

    pub fn is_completed(&self) -> bool {
        self.terminal_state.is_completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::DataUnavailableReason;
    use crate::resolver::ResolutionMethod;
    use crate::testing;

    fn completed() -> AnalysisResult {
        AnalysisResult {
            request_id: Uuid::new_v4(),
            query: "AAPL".to_string(),
            conversation_id: Some("conv-1".to_string()),
            symbol: Some(testing::symbol("AAPL")),
            snapshot: None,
            market_data_issue: None,
            recommendation: Some(Recommendation {
                action: Action::Buy,
                confidence: 80,
                reasoning: "Strong quarter".to_string(),
                key_factors: vec!["Services".to_string()],
                risks: vec!["Valuation".to_string()],
                summary: None,
            }),
            suggestions: Vec::new(),
            latency_ms: 1234,
            completed_at: Utc::now(),
            terminal_state: TerminalState::Completed,
        }
    }

    #[test]
    fn test_json_round_trip() {
        let result = completed();
        let json = serde_json::to_string(&result).unwrap();
        let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_round_trip_keeps_snapshot_prices() {
        for price in [938.920_727_135_853_3, 187.43, 0.1 + 0.2, 12_345.678_901_234] {
            let result = AnalysisResult {
                snapshot: Some(testing::snapshot("AAPL", price)),
                ..completed()
            };
            let json = serde_json::to_string(&result).unwrap();
            let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, result, "price {price}");
        }
    }

    #[test]
    fn test_failed_round_trip() {
        let result = AnalysisResult {
            symbol: Some(testing::symbol("ZZZZ")),
            snapshot: None,
            market_data_issue: Some(DataUnavailable {
                reason: DataUnavailableReason::UnknownTicker,
                detail: "not found".to_string(),
            }),
            recommendation: None,
            suggestions: vec![Suggestion {
                ticker: "TSLA".to_string(),
                company_name: "Tesla Inc.".to_string(),
                score: 0.5,
            }],
            terminal_state: TerminalState::Failed {
                stage: Stage::Reasoning,
                reason: FailureReason::ParseError,
                detail: "reply has no confidence field".to_string(),
            },
            ..completed()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["terminal_state"]["status"], "failed");
        assert_eq!(json["terminal_state"]["reason"], "parse_error");
        assert_eq!(json["market_data_issue"]["reason"], "unknown_ticker");
        assert_eq!(json["symbol"]["method"], "exact");

        let parsed: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, result);
        assert_eq!(parsed.symbol.unwrap().method, ResolutionMethod::Exact);
    }

    #[test]
    fn test_accessors() {
        let result = completed();
        assert_eq!(result.ticker(), Some("AAPL"));
        assert_eq!(result.action(), Some(Action::Buy));
        assert_eq!(result.confidence(), Some(80));
        assert!(result.is_completed());
        assert_eq!(result.terminal_state.failure_reason(), None);
    }
}
