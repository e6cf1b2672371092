use crate::domain::{MarketSnapshot, User, WatchlistItem};
use crate::market::{MAX_IDS_PER_REQUEST, MarketDataService};
use crate::ports::UserRepository;
use chrono::Utc;
use shared::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Mutates and enriches per-user watchlists.
///
/// Every mutation is a whole-list read-modify-write against the user
/// repository. Concurrent writers for one user are not serialized; the last
/// save wins.
pub struct WatchlistService {
    users: Arc<dyn UserRepository>,
    market: Arc<MarketDataService>,
}

impl WatchlistService {
    pub fn new(users: Arc<dyn UserRepository>, market: Arc<MarketDataService>) -> Self {
        Self { users, market }
    }

    /// Append a coin. Fails with `DuplicateWatchlistEntry` without writing
    /// when the id is already watched.
    pub async fn add(&self, user_id: &str, coin_id: &str, coin_name: &str) -> Result<Vec<WatchlistItem>> {
        let coin_id = coin_id.trim();
        let coin_name = coin_name.trim();
        if coin_id.is_empty() {
            return Err(Error::InvalidInput("coinId is required".to_string()));
        }
        if coin_name.is_empty() {
            return Err(Error::InvalidInput("coinName is required".to_string()));
        }

        let mut user = self.load(user_id).await?;
        if user.watchlist.iter().any(|item| item.coin_id == coin_id) {
            debug!("User '{}' already watches '{}'", user_id, coin_id);
            return Err(Error::DuplicateWatchlistEntry(coin_id.to_string()));
        }

        // The whole list is enriched with one upstream page
        if user.watchlist.len() >= MAX_IDS_PER_REQUEST {
            return Err(Error::InvalidInput(format!(
                "watchlist is limited to {} coins",
                MAX_IDS_PER_REQUEST
            )));
        }

        user.watchlist.push(WatchlistItem::new(coin_id, coin_name));
        let saved = self.persist(user).await?;
        info!("User '{}' added '{}' to watchlist", user_id, coin_id);
        Ok(saved.watchlist)
    }

    /// Drop every item with `coin_id`. Removing an id that is not watched
    /// succeeds and returns the list unchanged.
    pub async fn remove(&self, user_id: &str, coin_id: &str) -> Result<Vec<WatchlistItem>> {
        let coin_id = coin_id.trim();
        let mut user = self.load(user_id).await?;
        let before = user.watchlist.len();
        user.watchlist.retain(|item| item.coin_id != coin_id);

        if user.watchlist.len() == before {
            debug!("User '{}' does not watch '{}'", user_id, coin_id);
        }

        let saved = self.persist(user).await?;
        info!("User '{}' removed '{}' from watchlist", user_id, coin_id);
        Ok(saved.watchlist)
    }

    /// Watchlist enriched with live market rows.
    ///
    /// An empty watchlist returns at once. If enrichment fails upstream, the
    /// watchlist is read again and the cached entry for its current
    /// composition is served; with no such entry the failure propagates.
    pub async fn list(&self, user_id: &str) -> Result<MarketSnapshot> {
        let ids = self.load(user_id).await?.coin_ids();
        if ids.is_empty() {
            return Ok(Arc::new(Vec::new()));
        }

        match self.market.markets_for(&ids).await {
            Ok(rows) => Ok(rows),
            Err(Error::UpstreamUnavailable(reason)) => {
                let current = self.load(user_id).await?.coin_ids();
                match self.market.cached_markets(&current).await {
                    Some(rows) => {
                        warn!(
                            "Serving cached watchlist data for user '{}' after upstream failure",
                            user_id
                        );
                        Ok(rows)
                    }
                    None => Err(Error::UpstreamUnavailable(reason)),
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn load(&self, user_id: &str) -> Result<User> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .unwrap_or_else(|| User::new(user_id)))
    }

    async fn persist(&self, mut user: User) -> Result<User> {
        user.updated_at = Utc::now();
        self.users.save(user).await
    }
}
