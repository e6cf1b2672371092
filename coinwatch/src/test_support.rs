//! In-memory doubles for the ports, shared by unit tests.

use crate::domain::{CacheEntry, CoinDetail, CoinMarket, MarketSnapshot, User};
use crate::ports::{CacheStore, MarketDataProvider, UserRepository};
use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn coin(id: &str) -> CoinMarket {
    CoinMarket {
        id: id.to_string(),
        symbol: id.to_string(),
        name: id.to_uppercase(),
        image: None,
        current_price: Some(1.0),
        market_cap: None,
        market_cap_rank: None,
        total_volume: None,
        high_24h: None,
        low_24h: None,
        price_change_24h: None,
        price_change_percentage_24h: Some(0.5),
        last_updated: None,
        sparkline_in_7d: None,
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry<MarketSnapshot>>>,
    lookups: AtomicUsize,
}

impl MemoryCache {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore<String, MarketSnapshot> for MemoryCache {
    async fn get(&self, key: &String) -> Option<CacheEntry<MarketSnapshot>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn put(&self, key: String, payload: MarketSnapshot) -> CacheEntry<MarketSnapshot> {
        let entry = CacheEntry::new(payload);
        self.entries.lock().unwrap().insert(key, entry.clone());
        entry
    }

    fn entry_count(&self) -> u64 {
        self.entries.lock().unwrap().len() as u64
    }
}

/// Provider that filters its canned rows by the requested ids and counts
/// every attempt, including failed ones.
pub struct StubProvider {
    rows: Mutex<Vec<CoinMarket>>,
    failing: AtomicBool,
    delay: Option<Duration>,
    market_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    last_ids: Mutex<Option<Vec<String>>>,
}

impl StubProvider {
    pub fn with_rows(rows: Vec<CoinMarket>) -> Self {
        Self {
            rows: Mutex::new(rows),
            failing: AtomicBool::new(false),
            delay: None,
            market_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            last_ids: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let provider = Self::with_rows(Vec::new());
        provider.fail(true);
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rows(&self, rows: Vec<CoinMarket>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn last_ids(&self) -> Option<Vec<String>> {
        self.last_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn fetch_markets(&self, ids: Option<&[String]>) -> Result<Vec<CoinMarket>> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ids.lock().unwrap() = ids.map(|ids| ids.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable("stub failure".to_string()));
        }

        let rows = self.rows.lock().unwrap().clone();
        Ok(match ids {
            Some(ids) => rows.into_iter().filter(|row| ids.contains(&row.id)).collect(),
            None => rows,
        })
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable("stub failure".to_string()));
        }

        let raw = serde_json::json!({ "id": id, "symbol": id, "name": id });
        serde_json::from_value(raw).map_err(|e| Error::Internal(e.to_string()))
    }
}

/// User repository kept in a map, with a switch to fail every call.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
    one_shot: Mutex<Option<User>>,
    failing: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryUserRepository {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: &str) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    /// Answer the next `find_by_id` with `user` instead of the stored record
    pub fn answer_next_read(&self, user: User) {
        *self.one_shot.lock().unwrap() = Some(user);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Persistence("stub failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if let Some(user) = self.one_shot.lock().unwrap().take() {
            return Ok(Some(user));
        }
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn save(&self, user: User) -> Result<User> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.users.lock().unwrap().insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
