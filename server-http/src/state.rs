use coinwatch::auth::AuthGuard;
use coinwatch::domain::MarketSnapshot;
use coinwatch::market::MarketDataService;
use coinwatch::ports::{CacheStore, MarketDataProvider, UserRepository};
use coinwatch::watchlist::WatchlistService;
use shared::TtlMs;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<MarketDataService>,
    pub watchlists: Arc<WatchlistService>,
    pub auth_guard: Arc<dyn AuthGuard>,
}

impl AppState {
    /// Wire the services over the given adapters. One cache instance backs
    /// both the top-coins and the watchlist key families.
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<dyn CacheStore<String, MarketSnapshot>>,
        users: Arc<dyn UserRepository>,
        auth_guard: Arc<dyn AuthGuard>,
        ttl: TtlMs,
    ) -> Self {
        let market = Arc::new(MarketDataService::new(provider, cache, ttl));
        let watchlists = Arc::new(WatchlistService::new(users, market.clone()));

        Self {
            market,
            watchlists,
            auth_guard,
        }
    }
}
