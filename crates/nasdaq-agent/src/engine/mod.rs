//! Recommendation engine
//!
//! Builds a prompt from the resolved symbol and whatever market data is
//! available, makes exactly one bounded call to the reasoning service and
//! parses the reply strictly into a [`Recommendation`].

mod indicators;
mod parser;
mod prompt;

pub use indicators::{HistoricalSummary, Trend, summarize};
pub use parser::{ParseError, ParsedReply, parse_reply};
pub use prompt::PromptBuilder;

use crate::config::AgentConfig;
use crate::error::Result;
use crate::model::{MarketSnapshot, Recommendation};
use crate::resolver::ResolvedSymbol;
use nasdaq_llm::{CompletionRequest, LLMProvider, Message, StopReason};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Confidence ceiling when no market data backed the recommendation
pub const DEGRADED_CONFIDENCE_CAP: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisFailureReason {
    /// The reply did not contain a valid action and confidence
    ParseError,
    /// The reasoning service returned an error
    ServiceError,
    /// The reasoning service did not answer in time
    Timeout,
}

/// The engine could not produce a recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub reason: AnalysisFailureReason,
    pub detail: String,
}

impl AnalysisFailure {
    fn new(reason: AnalysisFailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Turns a symbol and optional snapshot into a recommendation
pub struct RecommendationEngine {
    provider: Arc<dyn LLMProvider>,
    prompts: PromptBuilder,
    model: String,
    max_tokens: usize,
    temperature: f32,
    timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AgentConfig) -> Result<Self> {
        Ok(Self {
            provider,
            prompts: PromptBuilder::new()?,
            model: config.model.clone(),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
            timeout: config.llm_timeout,
        })
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Produce a recommendation for `symbol`.
    ///
    /// The reasoning service is called once and never retried. Without a
    /// snapshot the confidence is capped at [`DEGRADED_CONFIDENCE_CAP`]
    /// whatever the service answers.
    #[instrument(skip_all, fields(ticker = %symbol.ticker, has_market_data = snapshot.is_some()))]
    pub async fn analyze(
        &self,
        symbol: &ResolvedSymbol,
        snapshot: Option<&MarketSnapshot>,
        query: &str,
    ) -> std::result::Result<Recommendation, AnalysisFailure> {
        let render = || -> std::result::Result<(String, String), minijinja::Error> {
            Ok((
                self.prompts.system_prompt()?,
                self.prompts.analysis_prompt(symbol, snapshot, query)?,
            ))
        };
        let (system, prompt) = render().map_err(|e| {
            AnalysisFailure::new(
                AnalysisFailureReason::ServiceError,
                format!("prompt rendering failed: {e}"),
            )
        })?;

        let request = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await
        {
            Err(_) => {
                warn!(timeout = ?self.timeout, "Reasoning service timed out");
                return Err(AnalysisFailure::new(
                    AnalysisFailureReason::Timeout,
                    format!("no reply within {:?}", self.timeout),
                ));
            }
            Ok(Err(err)) if err.is_timeout() => {
                warn!(error = %err, "Reasoning service timed out");
                return Err(AnalysisFailure::new(
                    AnalysisFailureReason::Timeout,
                    err.to_string(),
                ));
            }
            Ok(Err(err)) => {
                warn!(error = %err, provider = self.provider.name(), "Reasoning service failed");
                return Err(AnalysisFailure::new(
                    AnalysisFailureReason::ServiceError,
                    err.to_string(),
                ));
            }
            Ok(Ok(response)) => response,
        };

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Reasoning reply received"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(max_tokens = self.max_tokens, "Reasoning reply was truncated");
        }

        let text = response.message.text().unwrap_or_default();
        let parsed = parse_reply(&text).map_err(|e| {
            warn!(error = %e, "Unparseable reasoning reply");
            AnalysisFailure::new(AnalysisFailureReason::ParseError, e.to_string())
        })?;

        let confidence = if snapshot.is_some() {
            parsed.confidence
        } else {
            parsed.confidence.min(DEGRADED_CONFIDENCE_CAP)
        };

        Ok(Recommendation {
            action: parsed.action,
            confidence,
            reasoning: parsed.reasoning,
            key_factors: parsed.key_factors,
            risks: parsed.risks,
            summary: parsed.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;
    use crate::testing::{self, StubLlm};
    use nasdaq_llm::LLMError;

    fn engine(llm: Arc<StubLlm>) -> RecommendationEngine {
        let config = AgentConfig::builder()
            .llm_timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        RecommendationEngine::new(llm, &config).unwrap()
    }

    #[tokio::test]
    async fn test_recommendation_with_market_data() {
        let llm = Arc::new(StubLlm::replying(&testing::reply("BUY", 80)));
        let snapshot = testing::snapshot("AAPL", 150.0);

        let rec = engine(llm.clone())
            .analyze(&testing::symbol("AAPL"), Some(&snapshot), "AAPL")
            .await
            .unwrap();

        assert_eq!(rec.action, Action::Buy);
        assert_eq!(rec.confidence, 80);
        assert_eq!(llm.calls(), 1);

        let request = llm.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.3));
        assert!(request.messages[0].text().unwrap().contains("Ticker: AAPL"));
    }

    #[tokio::test]
    async fn test_confidence_capped_without_market_data() {
        let llm = Arc::new(StubLlm::replying(&testing::reply("BUY", 90)));

        let rec = engine(llm.clone())
            .analyze(&testing::symbol("AAPL"), None, "AAPL")
            .await
            .unwrap();

        assert_eq!(rec.confidence, DEGRADED_CONFIDENCE_CAP);
        let prompt = llm.last_request().unwrap().messages[0].text().unwrap();
        assert!(prompt.contains("UNAVAILABLE"));
    }

    #[tokio::test]
    async fn test_low_confidence_not_raised_by_cap() {
        let llm = Arc::new(StubLlm::replying(&testing::reply("SELL", 30)));
        let rec = engine(llm)
            .analyze(&testing::symbol("AAPL"), None, "AAPL")
            .await
            .unwrap();
        assert_eq!(rec.confidence, 30);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_error() {
        let llm = Arc::new(StubLlm::replying("I would probably hold, but who knows."));
        let failure = engine(llm)
            .analyze(&testing::symbol("AAPL"), None, "AAPL")
            .await
            .unwrap_err();
        assert_eq!(failure.reason, AnalysisFailureReason::ParseError);
    }

    #[tokio::test]
    async fn test_service_error_not_retried() {
        let llm = Arc::new(StubLlm::failing(|| {
            LLMError::RequestFailed("HTTP 500".to_string())
        }));
        let failure = engine(llm.clone())
            .analyze(&testing::symbol("AAPL"), None, "AAPL")
            .await
            .unwrap_err();
        assert_eq!(failure.reason, AnalysisFailureReason::ServiceError);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let llm = Arc::new(
            StubLlm::replying(&testing::reply("BUY", 80)).with_delay(Duration::from_secs(5)),
        );
        let failure = engine(llm.clone())
            .analyze(&testing::symbol("AAPL"), None, "AAPL")
            .await
            .unwrap_err();
        assert_eq!(failure.reason, AnalysisFailureReason::Timeout);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_client_timeout_maps_to_timeout() {
        let llm = Arc::new(StubLlm::failing(|| LLMError::Timeout("deadline".to_string())));
        let failure = engine(llm)
            .analyze(&testing::symbol("AAPL"), None, "AAPL")
            .await
            .unwrap_err();
        assert_eq!(failure.reason, AnalysisFailureReason::Timeout);
    }
}
