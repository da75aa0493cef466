//! Core data types shared by the pipeline stages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One inbound analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Raw user text
    pub text: String,
    /// When the request arrived
    pub received_at: DateTime<Utc>,
    /// A2A conversation the query belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl Query {
    /// Create a query received now
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
            conversation_id: None,
        }
    }

    /// Attach the A2A conversation id
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }
}

/// A single OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Point-in-time market data for one ticker
///
/// `history` is chronological, covers the configured window (six months by
/// default) and never exceeds the configured point cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub price: f64,
    pub volume: u64,
    pub week52_high: f64,
    pub week52_low: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    pub as_of: DateTime<Utc>,
    pub history: Vec<PricePoint>,
}

impl MarketSnapshot {
    /// Day change against the previous close, in percent
    pub fn change_percent(&self) -> Option<f64> {
        self.previous_close
            .filter(|prev| *prev > 0.0)
            .map(|prev| (self.price - prev) / prev * 100.0)
    }
}

/// Recommended position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

impl Action {
    /// Upper-case label used in replies and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured recommendation produced by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    /// 0-100 inclusive
    pub confidence: u8,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
