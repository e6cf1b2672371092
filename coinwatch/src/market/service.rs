use crate::domain::{CacheEntry, CoinDetail, MarketSnapshot};
use crate::market::single_flight::SingleFlight;
use crate::ports::{CacheStore, MarketDataProvider};
use shared::{Error, Result, TtlMs};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache key of the aggregate top-coins snapshot
pub const TOP_COINS_KEY: &str = "top";

/// Prefix of every id-set key. Keeps the two key families disjoint whatever
/// ids a user watches.
const ID_SET_KEY_PREFIX: &str = "ids:";

/// Default freshness window for both cache families
pub const DEFAULT_TTL: TtlMs = TtlMs(30_000);

/// Market data client: fronts the upstream provider with the TTL cache.
///
/// Lookups return a fresh entry when one exists, otherwise fetch upstream
/// and replace the entry. When the fetch fails the previous entry is served
/// however old it is; only a cold key surfaces the failure.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn CacheStore<String, MarketSnapshot>>,
    flights: SingleFlight<Result<MarketSnapshot>>,
    ttl: TtlMs,
}

impl MarketDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<dyn CacheStore<String, MarketSnapshot>>,
        ttl: TtlMs,
    ) -> Self {
        Self {
            provider,
            cache,
            flights: SingleFlight::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> TtlMs {
        self.ttl
    }

    /// `ids:` followed by the sorted, deduplicated, comma-joined ids, so any
    /// ordering of one set maps to the same entry.
    pub fn cache_key_for(ids: &[String]) -> String {
        format!("{}{}", ID_SET_KEY_PREFIX, normalize_ids(ids).join(","))
    }

    /// Top 100 coins by market cap
    pub async fn top_coins(&self) -> Result<MarketSnapshot> {
        self.cached_or_fetch(TOP_COINS_KEY.to_string(), None).await
    }

    /// Market rows for an explicit id set. An empty set is answered
    /// immediately without touching the cache or upstream.
    pub async fn markets_for(&self, ids: &[String]) -> Result<MarketSnapshot> {
        if ids.is_empty() {
            return Ok(Arc::new(Vec::new()));
        }

        let ids = normalize_ids(ids);
        let key = Self::cache_key_for(&ids);
        self.cached_or_fetch(key, Some(ids)).await
    }

    /// Whatever is stored for the id set, fresh or stale, without an
    /// upstream call.
    pub async fn cached_markets(&self, ids: &[String]) -> Option<MarketSnapshot> {
        if ids.is_empty() {
            return Some(Arc::new(Vec::new()));
        }
        self.cache
            .get(&Self::cache_key_for(ids))
            .await
            .map(|entry| entry.payload)
    }

    /// Single coin detail. Never cached.
    pub async fn coin_detail(&self, id: &str) -> Result<CoinDetail> {
        debug!("Fetching coin detail for '{}'", id);
        self.provider.fetch_coin(id).await
    }

    async fn cached_or_fetch(&self, key: String, ids: Option<Vec<String>>) -> Result<MarketSnapshot> {
        let existing = self.cache.get(&key).await;
        if let Some(entry) = &existing {
            if entry.is_fresh(self.ttl) {
                debug!("Cache hit for '{}' (age {} ms)", key, entry.age_ms());
                return Ok(entry.payload.clone());
            }
        }

        match self.refresh(&key, ids).await {
            Ok(payload) => Ok(payload),
            Err(Error::UpstreamUnavailable(reason)) => {
                // Another caller may have stored a newer entry while we waited.
                match self.cache.get(&key).await.or(existing) {
                    Some(stale) => {
                        warn!(
                            "Upstream unavailable for '{}' ({}), serving entry aged {} ms",
                            key,
                            reason,
                            stale.age_ms()
                        );
                        Ok(stale.payload)
                    }
                    None => {
                        warn!("Upstream unavailable for '{}' with no cached entry: {}", key, reason);
                        Err(Error::UpstreamUnavailable(reason))
                    }
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Fetch upstream and store the result, collapsing concurrent refreshes
    /// of one key into a single call.
    async fn refresh(&self, key: &str, ids: Option<Vec<String>>) -> Result<MarketSnapshot> {
        let provider = self.provider.clone();
        let cache = self.cache.clone();
        let cache_key = key.to_string();

        self.flights
            .run(key, async move {
                let rows = provider.fetch_markets(ids.as_deref()).await?;
                info!("Fetched {} market rows for '{}'", rows.len(), cache_key);
                let entry: CacheEntry<MarketSnapshot> = cache.put(cache_key, Arc::new(rows)).await;
                Ok::<_, Error>(entry.payload)
            })
            .await
    }
}

fn normalize_ids(ids: &[String]) -> Vec<String> {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

impl std::fmt::Debug for MarketDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataService")
            .field("ttl_ms", &self.ttl.0)
            .field("entries", &self.cache.entry_count())
            .field("in_flight", &self.flights.in_flight_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryCache, StubProvider, coin};
    use tokio::time::{Duration, sleep};

    fn service(provider: Arc<StubProvider>, ttl: TtlMs) -> (MarketDataService, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::default());
        (MarketDataService::new(provider, cache.clone(), ttl), cache)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        assert_eq!(
            MarketDataService::cache_key_for(&ids(&["eth", "btc"])),
            MarketDataService::cache_key_for(&ids(&["btc", "eth"]))
        );
        assert_eq!(MarketDataService::cache_key_for(&ids(&["eth", "btc", "eth"])), "ids:btc,eth");
    }

    #[tokio::test]
    async fn test_id_named_like_top_key_does_not_touch_top_coins() {
        let provider = Arc::new(StubProvider::with_rows(vec![coin("bitcoin"), coin("ethereum")]));
        let (service, cache) = service(provider.clone(), DEFAULT_TTL);

        let rows = service.markets_for(&ids(&[TOP_COINS_KEY])).await.unwrap();
        assert!(rows.is_empty());
        assert!(cache.get(&TOP_COINS_KEY.to_string()).await.is_none());

        let top = service.top_coins().await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(provider.market_calls(), 2);
    }

    #[tokio::test]
    async fn test_top_coins_served_from_cache_within_ttl() {
        let provider = Arc::new(StubProvider::with_rows(vec![coin("bitcoin")]));
        let (service, _) = service(provider.clone(), DEFAULT_TTL);

        let first = service.top_coins().await.unwrap();
        let second = service.top_coins().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.market_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_one_refresh() {
        let provider = Arc::new(StubProvider::with_rows(vec![coin("bitcoin")]));
        let (service, cache) = service(provider.clone(), TtlMs(50));

        service.top_coins().await.unwrap();
        let before = cache.get(&TOP_COINS_KEY.to_string()).await.unwrap().cached_at;

        sleep(Duration::from_millis(80)).await;
        provider.set_rows(vec![coin("ethereum")]);

        let refreshed = service.top_coins().await.unwrap();
        assert_eq!(refreshed[0].id, "ethereum");
        assert_eq!(provider.market_calls(), 2);

        let after = cache.get(&TOP_COINS_KEY.to_string()).await.unwrap().cached_at;
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_stale_entry_served_when_upstream_fails() {
        let provider = Arc::new(StubProvider::with_rows(vec![coin("bitcoin")]));
        let (service, _) = service(provider.clone(), TtlMs(0));

        let original = service.top_coins().await.unwrap();
        provider.fail(true);

        let served = service.top_coins().await.unwrap();
        assert_eq!(served, original);
        assert_eq!(provider.market_calls(), 2);
    }

    #[tokio::test]
    async fn test_cold_failure_is_an_error() {
        let provider = Arc::new(StubProvider::failing());
        let (service, cache) = service(provider.clone(), DEFAULT_TTL);

        let result = service.top_coins().await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_reordered_id_set_hits_same_entry() {
        let provider = Arc::new(StubProvider::with_rows(vec![coin("btc"), coin("eth")]));
        let (service, _) = service(provider.clone(), DEFAULT_TTL);

        service.markets_for(&ids(&["eth", "btc"])).await.unwrap();
        service.markets_for(&ids(&["btc", "eth"])).await.unwrap();

        assert_eq!(provider.market_calls(), 1);
        assert_eq!(provider.last_ids(), Some(ids(&["btc", "eth"])));
    }

    #[tokio::test]
    async fn test_empty_id_set_short_circuits() {
        let provider = Arc::new(StubProvider::failing());
        let (service, cache) = service(provider.clone(), DEFAULT_TTL);

        let rows = service.markets_for(&[]).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(provider.market_calls(), 0);
        assert_eq!(cache.lookups(), 0);
    }

    #[tokio::test]
    async fn test_coin_detail_bypasses_cache() {
        let provider = Arc::new(StubProvider::with_rows(vec![]));
        let (service, cache) = service(provider.clone(), DEFAULT_TTL);

        service.coin_detail("bitcoin").await.unwrap();
        service.coin_detail("bitcoin").await.unwrap();

        assert_eq!(provider.detail_calls(), 2);
        assert_eq!(cache.entry_count(), 0);

        provider.fail(true);
        assert!(matches!(
            service.coin_detail("bitcoin").await,
            Err(Error::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_upstream_call() {
        let provider = Arc::new(
            StubProvider::with_rows(vec![coin("bitcoin")]).with_delay(Duration::from_millis(50)),
        );
        let (service, _) = service(provider.clone(), DEFAULT_TTL);
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.top_coins().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap()[0].id, "bitcoin");
        }

        assert_eq!(provider.market_calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_markets_ignores_freshness() {
        let provider = Arc::new(StubProvider::with_rows(vec![coin("btc")]));
        let (service, _) = service(provider.clone(), TtlMs(0));

        assert!(service.cached_markets(&ids(&["btc"])).await.is_none());
        service.markets_for(&ids(&["btc"])).await.unwrap();

        let stale = service.cached_markets(&ids(&["btc"])).await.unwrap();
        assert_eq!(stale[0].id, "btc");
        assert_eq!(provider.market_calls(), 1);
    }
}
