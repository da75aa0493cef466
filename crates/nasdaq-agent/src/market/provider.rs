//! Quote provider abstraction

use crate::model::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// How a provider call failed, as far as retry policy is concerned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The symbol does not exist or has no data. Never retried.
    #[error("symbol not found: {0}")]
    NotFound(String),

    /// Connection reset, refused or timed out. Retried once.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Any other provider failure. Never retried.
    #[error("provider error: {0}")]
    Rejected(String),
}

/// Source of quotes and price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Most recent bar for `ticker`
    async fn latest_quote(&self, ticker: &str) -> Result<PricePoint, ProviderError>;

    /// Daily bars for `ticker` between `start` and `end`
    async fn history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, ProviderError>;
}
