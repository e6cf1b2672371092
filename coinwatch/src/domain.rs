use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::TtlMs;
use std::collections::HashMap;
use std::sync::Arc;

/// A cached payload and the moment it was stored.
///
/// Entries are never mutated; a refresh replaces the whole entry.
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub cached_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn new(payload: V) -> Self {
        Self {
            payload,
            cached_at: Utc::now(),
        }
    }

    pub fn age_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.cached_at)
            .num_milliseconds()
    }

    /// `now - cached_at < ttl`
    pub fn is_fresh(&self, ttl: TtlMs) -> bool {
        self.age_ms() < ttl.0 as i64
    }
}

/// Market snapshot rows as stored in the cache and returned to clients.
pub type MarketSnapshot = Arc<Vec<CoinMarket>>;

/// One row of the provider's `/coins/markets` listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub sparkline_in_7d: Option<Sparkline>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// Per-coin detail from the provider's `/coins/{id}` endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Description,
    #[serde(default)]
    pub image: CoinImage,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub links: CoinLinks,
    #[serde(default)]
    pub market_data: Option<CoinMarketData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub en: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinImage {
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinLinks {
    #[serde(default)]
    pub homepage: Vec<String>,
}

/// Prices are keyed by quote currency (`usd`, `eur`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinMarketData {
    #[serde(default)]
    pub current_price: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub market_cap: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub total_volume: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub high_24h: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub low_24h: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub coin_id: String,
    pub coin_name: String,
}

impl WatchlistItem {
    pub fn new(coin_id: impl Into<String>, coin_name: impl Into<String>) -> Self {
        Self {
            coin_id: coin_id.into(),
            coin_name: coin_name.into(),
        }
    }
}

/// The slice of the user record this service owns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub watchlist: Vec<WatchlistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            watchlist: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn coin_ids(&self) -> Vec<String> {
        self.watchlist.iter().map(|item| item.coin_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_entry_freshness() {
        let entry = CacheEntry::new(1u8);
        assert!(entry.is_fresh(TtlMs(30_000)));
        assert!(!entry.is_fresh(TtlMs(0)));

        let old = CacheEntry {
            payload: 1u8,
            cached_at: Utc::now() - Duration::seconds(31),
        };
        assert!(!old.is_fresh(TtlMs(30_000)));
    }

    #[test]
    fn test_coin_market_tolerates_nulls() {
        let raw = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 64000.5,
            "market_cap": null,
            "market_cap_rank": 1,
            "price_change_percentage_24h": -1.25,
            "sparkline_in_7d": { "price": [1.0, 2.0] },
            "roi": null
        }"#;
        let coin: CoinMarket = serde_json::from_str(raw).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.market_cap, None);
        assert_eq!(coin.sparkline_in_7d.unwrap().price, vec![1.0, 2.0]);
    }

    #[test]
    fn test_watchlist_item_wire_names() {
        let item = WatchlistItem::new("bitcoin", "Bitcoin");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["coinId"], "bitcoin");
        assert_eq!(json["coinName"], "Bitcoin");
    }
}
