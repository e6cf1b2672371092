#![deny(clippy::all)]

use crate::domain::{CacheEntry, CoinDetail, CoinMarket, User};
use async_trait::async_trait;
use shared::Result;

// Ports are the pluggable extension points for storage and upstream adapters

/// Port for the TTL cache store.
///
/// Stores never expire entries by age; freshness is decided by the caller
/// through [`CacheEntry::is_fresh`] so stale entries stay available as a
/// fallback.
#[async_trait]
pub trait CacheStore<K, V>: Send + Sync + 'static {
    async fn get(&self, key: &K) -> Option<CacheEntry<V>>;

    /// Store `payload` stamped with the current time, replacing any previous entry
    async fn put(&self, key: K, payload: V) -> CacheEntry<V>;

    fn entry_count(&self) -> u64;
}

/// Port for the upstream market-data provider
#[async_trait]
pub trait MarketDataProvider: Send + Sync + 'static {
    /// Top coins by market cap, or only the given ids when `ids` is set
    async fn fetch_markets(&self, ids: Option<&[String]>) -> Result<Vec<CoinMarket>>;

    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail>;
}

/// Port for the user-record persistence collaborator
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Insert or replace a user record
    async fn save(&self, user: User) -> Result<User>;
}
