//! Shared fixtures and test doubles

use crate::model::{MarketSnapshot, PricePoint};
use crate::resolver::{ResolutionMethod, ResolvedSymbol, Ticker};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use nasdaq_llm::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason, TokenUsage,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Midnight UTC today; bars are laid out backwards from here
pub fn anchor() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Daily bar `days_ago` days before [`anchor`]
pub fn bar(days_ago: i64, close: f64) -> PricePoint {
    PricePoint {
        timestamp: anchor() - ChronoDuration::days(days_ago),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000_000,
    }
}

/// `n` chronological daily bars ending today, oscillating around `base`
pub fn daily_bars(n: i64, base: f64) -> Vec<PricePoint> {
    (0..n)
        .map(|i| bar(n - 1 - i, base + (i % 7) as f64 - 3.0))
        .collect()
}

pub fn snapshot(ticker: &str, price: f64) -> MarketSnapshot {
    MarketSnapshot {
        ticker: ticker.to_string(),
        price,
        volume: 1_000_000,
        week52_high: price * 1.2,
        week52_low: price * 0.8,
        previous_close: Some(price * 0.99),
        as_of: anchor(),
        history: daily_bars(120, price),
    }
}

pub fn symbol(ticker: &str) -> ResolvedSymbol {
    let symbol = ResolvedSymbol::new(Ticker::parse(ticker).unwrap(), ResolutionMethod::Exact, 1.0);
    match ticker {
        "AAPL" => symbol.with_company("Apple Inc."),
        "MSFT" => symbol.with_company("Microsoft Corporation"),
        _ => symbol,
    }
}

/// Well-formed model reply
pub fn reply(action: &str, confidence: u8) -> String {
    format!(
        "RECOMMENDATION: {action}\n\
         CONFIDENCE_SCORE: {confidence}\n\
         REASONING: Solid fundamentals and steady momentum.\n\
         KEY_FACTORS: Revenue growth, Margins, Buybacks\n\
         RISK_ASSESSMENT: Valuation; Regulation\n\
         SUMMARY: Reasonable entry point."
    )
}

enum StubOutcome {
    Reply(String),
    Fail(Box<dyn Fn() -> LLMError + Send + Sync>),
}

/// Scripted LLM provider that records every request
pub struct StubLlm {
    outcome: StubOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl StubLlm {
    pub fn replying(text: &str) -> Self {
        Self::with_outcome(StubOutcome::Reply(text.to_string()))
    }

    pub fn failing(make_error: impl Fn() -> LLMError + Send + Sync + 'static) -> Self {
        Self::with_outcome(StubOutcome::Fail(Box::new(make_error)))
    }

    fn with_outcome(outcome: StubOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for StubLlm {
    async fn complete(&self, request: CompletionRequest) -> nasdaq_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            StubOutcome::Reply(text) => Ok(CompletionResponse {
                message: Message::assistant(text.clone()),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 50,
                },
            }),
            StubOutcome::Fail(make_error) => Err(make_error()),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
