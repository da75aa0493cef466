//! Market data gateway
//!
//! Wraps a [`QuoteProvider`] with a per-attempt timeout, a single retry on
//! transient failures and a short TTL cache, and normalises the provider's
//! bars into a [`MarketSnapshot`]. A failed fetch is reported as
//! [`DataUnavailable`]; the orchestrator carries on without market data.

mod cache;
mod provider;
mod yahoo;

pub use cache::SnapshotCache;
pub use provider::{ProviderError, QuoteProvider};
pub use yahoo::YahooQuoteProvider;

#[cfg(test)]
pub use provider::MockQuoteProvider;

use crate::config::AgentConfig;
use crate::model::{MarketSnapshot, PricePoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// One initial attempt plus one retry
const MAX_ATTEMPTS: u32 = 2;
/// History fetched per attempt; the 52-week range needs a full year
const LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataUnavailableReason {
    /// The provider does not know the ticker
    UnknownTicker,
    /// Timeout, retry exhaustion or any other provider failure
    ProviderError,
}

/// Market data could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUnavailable {
    pub reason: DataUnavailableReason,
    pub detail: String,
}

impl DataUnavailable {
    pub fn unknown_ticker(detail: impl Into<String>) -> Self {
        Self {
            reason: DataUnavailableReason::UnknownTicker,
            detail: detail.into(),
        }
    }

    pub fn provider_error(detail: impl Into<String>) -> Self {
        Self {
            reason: DataUnavailableReason::ProviderError,
            detail: detail.into(),
        }
    }
}

/// Fetches and normalises market snapshots
pub struct MarketDataGateway {
    provider: Arc<dyn QuoteProvider>,
    cache: SnapshotCache,
    timeout: Duration,
    retry_backoff: Duration,
    window: chrono::Duration,
    max_points: usize,
}

impl MarketDataGateway {
    /// Create a gateway over `provider` using the timeouts and limits in `config`
    pub fn new(provider: Arc<dyn QuoteProvider>, config: &AgentConfig) -> Self {
        Self {
            provider,
            cache: SnapshotCache::new(config.cache_ttl),
            timeout: config.market_timeout,
            retry_backoff: config.retry_backoff,
            window: chrono::Duration::days(i64::from(config.history_window_days)),
            max_points: config.max_history_points,
        }
    }

    /// Snapshot cache, exposed for diagnostics
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Fetch a normalised snapshot for `ticker`.
    ///
    /// Unknown tickers fail immediately. Transient failures and timeouts are
    /// retried once; anything else becomes `ProviderError`.
    #[instrument(skip(self))]
    pub async fn fetch(&self, ticker: &str) -> Result<MarketSnapshot, DataUnavailable> {
        if let Some(snapshot) = self.cache.get(ticker).await {
            debug!("Snapshot cache hit");
            return Ok(snapshot);
        }
        debug!("Snapshot cache miss");

        let mut attempt = 0;
        loop {
            attempt += 1;

            let outcome = match tokio::time::timeout(self.timeout, self.fetch_once(ticker)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Transient(format!(
                    "no response within {:?}",
                    self.timeout
                ))),
            };

            match outcome {
                Ok(snapshot) => {
                    self.cache.insert(snapshot.clone()).await;
                    return Ok(snapshot);
                }
                Err(ProviderError::NotFound(detail)) => {
                    debug!(%detail, "Ticker unknown to provider");
                    return Err(DataUnavailable::unknown_ticker(detail));
                }
                Err(ProviderError::Transient(detail)) if attempt < MAX_ATTEMPTS => {
                    warn!(attempt, %detail, "Transient market data failure, retrying");
                    if !self.retry_backoff.is_zero() {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Market data unavailable");
                    return Err(DataUnavailable::provider_error(err.to_string()));
                }
            }
        }
    }

    async fn fetch_once(&self, ticker: &str) -> Result<MarketSnapshot, ProviderError> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(LOOKBACK_DAYS);

        // either error short-circuits the other request
        let (latest, history) = tokio::try_join!(
            self.provider.latest_quote(ticker),
            self.provider.history(ticker, start, end),
        )?;

        normalize(ticker, latest, history, end - self.window, self.max_points)
    }
}

/// Turn raw provider bars into a snapshot.
///
/// `year` is sorted and de-duplicated; the 52-week range comes from all of it
/// plus `latest`, while the returned history keeps only bars at or after
/// `cutoff`, capped to the most recent `max_points`.
pub(crate) fn normalize(
    ticker: &str,
    latest: PricePoint,
    mut year: Vec<PricePoint>,
    cutoff: DateTime<Utc>,
    max_points: usize,
) -> Result<MarketSnapshot, ProviderError> {
    year.retain(|p| p.close.is_finite() && p.close > 0.0);
    if year.is_empty() || !latest.close.is_finite() || latest.close <= 0.0 {
        return Err(ProviderError::NotFound(format!("no price data for {ticker}")));
    }

    year.sort_by_key(|p| p.timestamp);
    year.dedup_by_key(|p| p.timestamp);

    let (week52_low, week52_high) = year.iter().chain(std::iter::once(&latest)).fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), p| {
            let low = if p.low.is_finite() && p.low > 0.0 { p.low } else { p.close };
            let high = if p.high.is_finite() { p.high.max(p.close) } else { p.close };
            (lo.min(low), hi.max(high))
        },
    );

    let latest_day = latest.timestamp.date_naive();
    let previous_close = year
        .iter()
        .rev()
        .find(|p| p.timestamp.date_naive() < latest_day)
        .map(|p| p.close);

    let mut history: Vec<PricePoint> = year.into_iter().filter(|p| p.timestamp >= cutoff).collect();
    if history.len() > max_points {
        history.drain(..history.len() - max_points);
    }

    Ok(MarketSnapshot {
        ticker: ticker.to_string(),
        price: latest.close,
        volume: latest.volume,
        week52_high,
        week52_low,
        previous_close,
        as_of: latest.timestamp,
        history,
    })
}
