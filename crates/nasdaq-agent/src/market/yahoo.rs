//! Yahoo Finance quote provider

use super::provider::{ProviderError, QuoteProvider};
use crate::model::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Quote provider backed by the public Yahoo Finance chart API
pub struct YahooQuoteProvider {
    rate_limiter: SharedRateLimiter,
}

impl YahooQuoteProvider {
    /// Create a provider allowing `requests_per_minute` upstream calls
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    fn connector() -> Result<yahoo::YahooConnector, ProviderError> {
        yahoo::YahooConnector::new().map_err(|e| ProviderError::Rejected(e.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    async fn latest_quote(&self, ticker: &str) -> Result<PricePoint, ProviderError> {
        self.rate_limiter.until_ready().await;
        debug!(ticker, "Fetching latest quote from Yahoo Finance");

        let response = Self::connector()?
            .get_latest_quotes(ticker, "1d")
            .await
            .map_err(|e| classify(&e))?;
        let quote = response.last_quote().map_err(|e| classify(&e))?;

        Ok(to_price_point(&quote))
    }

    async fn history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        self.rate_limiter.until_ready().await;
        debug!(ticker, %start, %end, "Fetching quote history from Yahoo Finance");

        let start = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| ProviderError::Rejected(format!("Invalid start timestamp: {e}")))?;
        let end = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| ProviderError::Rejected(format!("Invalid end timestamp: {e}")))?;

        let response = Self::connector()?
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| classify(&e))?;
        let quotes = response.quotes().map_err(|e| classify(&e))?;

        Ok(quotes.iter().map(to_price_point).collect())
    }
}

fn to_price_point(quote: &yahoo::Quote) -> PricePoint {
    PricePoint {
        timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0).unwrap_or_default(),
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
    }
}

fn classify(err: &yahoo::YahooError) -> ProviderError {
    classify_message(&format!("{err} {err:?}"))
}

/// Sort a Yahoo error message into the retry classes.
///
/// The connector reports unknown symbols, empty data sets and network
/// failures through several error variants whose payloads are free text,
/// so the decision is made on the rendered message.
pub(crate) fn classify_message(message: &str) -> ProviderError {
    let lower = message.to_lowercase();

    const NOT_FOUND: &[&str] = &[
        "not found",
        "404",
        "no data",
        "noquotes",
        "no quotes",
        "noresult",
        "no result",
        "emptydataset",
        "empty data",
        "delisted",
    ];
    const TRANSIENT: &[&str] = &[
        "timed out",
        "timeout",
        "connection",
        "connect",
        "reset",
        "dns",
        "broken pipe",
    ];

    if NOT_FOUND.iter().any(|p| lower.contains(p)) {
        ProviderError::NotFound(message.to_string())
    } else if TRANSIENT.iter().any(|p| lower.contains(p)) {
        ProviderError::Transient(message.to_string())
    } else {
        ProviderError::Rejected(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        assert!(matches!(
            classify_message("fetching the data from yahoo! finance failed: 404 Not Found"),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            classify_message("NoQuotes"),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            classify_message("EmptyDataSet"),
            ProviderError::NotFound(_)
        ));
    }

    #[test]
    fn test_classify_transient() {
        assert!(matches!(
            classify_message("error sending request: connection reset by peer"),
            ProviderError::Transient(_)
        ));
        assert!(matches!(
            classify_message("operation timed out"),
            ProviderError::Transient(_)
        ));
    }

    #[test]
    fn test_classify_other() {
        assert!(matches!(
            classify_message("TooManyRequests(\"429\")"),
            ProviderError::Rejected(_)
        ));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_latest_quote_live() {
        let provider = YahooQuoteProvider::new(60);
        let quote = provider.latest_quote("AAPL").await.unwrap();
        assert!(quote.close > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol_live() {
        let provider = YahooQuoteProvider::new(60);
        let err = provider.latest_quote("XYZNOTREAL").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
