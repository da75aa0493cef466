//! Short-lived snapshot cache

use crate::model::MarketSnapshot;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Thread-safe per-ticker cache of fetched snapshots
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Arc<RwLock<TimedCache<String, MarketSnapshot>>>,
}

impl SnapshotCache {
    /// Create a cache whose entries expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Cached snapshot for `ticker`, if still fresh
    pub async fn get(&self, ticker: &str) -> Option<MarketSnapshot> {
        // cache_get updates hit/miss counters, so it needs the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(&ticker.to_string()).cloned()
    }

    pub async fn insert(&self, snapshot: MarketSnapshot) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(snapshot.ticker.clone(), snapshot);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        cache.insert(testing::snapshot("AAPL", 150.0)).await;

        let hit = cache.get("AAPL").await.unwrap();
        assert!((hit.price - 150.0).abs() < f64::EPSILON);
        assert!(cache.get("MSFT").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = SnapshotCache::new(Duration::from_millis(20));
        cache.insert(testing::snapshot("AAPL", 150.0)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        for ticker in ["AAPL", "MSFT", "NVDA"] {
            cache.insert(testing::snapshot(ticker, 100.0)).await;
        }
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
