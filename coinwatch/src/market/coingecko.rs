//! CoinGecko v3 adapter for the [`MarketDataProvider`] port.
//!
//! Endpoints used:
//! 1. `/coins/markets` - top 100 by market cap, or an explicit id set
//! 2. `/coins/{id}` - single coin detail

use crate::domain::{CoinDetail, CoinMarket};
use crate::ports::MarketDataProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const USER_AGENT: &str = concat!("coinwatch/", env!("CARGO_PKG_VERSION"));
const TOP_COINS_PAGE_SIZE: usize = 100;
/// Largest `per_page` the markets endpoint honours
pub const MAX_IDS_PER_REQUEST: usize = 250;
const QUOTE_CURRENCY: &str = "usd";

#[derive(Debug, Clone)]
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// An id set is fetched in one page sized to the set, so it must not
    /// exceed [`MAX_IDS_PER_REQUEST`].
    fn markets_query(ids: Option<&[String]>) -> Result<Vec<(&'static str, String)>> {
        let page_size = match ids {
            Some(ids) if ids.len() > MAX_IDS_PER_REQUEST => {
                return Err(Error::InvalidInput(format!(
                    "at most {} ids per request, got {}",
                    MAX_IDS_PER_REQUEST,
                    ids.len()
                )));
            }
            Some(ids) => ids.len().max(1),
            None => TOP_COINS_PAGE_SIZE,
        };

        let mut query = vec![
            ("vs_currency", QUOTE_CURRENCY.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", page_size.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "true".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        if let Some(ids) = ids {
            query.push(("ids", ids.join(",")));
        }
        Ok(query)
    }

    /// Provider ids are lowercase slugs such as `bitcoin` or `usd-coin`
    fn is_valid_coin_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Upstream request to {} failed: {}", path, e);
            Error::UpstreamUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Upstream rate limited request to {}", path);
            }
            return Err(Error::UpstreamUnavailable(format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_markets(&self, ids: Option<&[String]>) -> Result<Vec<CoinMarket>> {
        let query = Self::markets_query(ids)?;
        self.get_json("/coins/markets", &query).await
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail> {
        if !Self::is_valid_coin_id(id) {
            return Err(Error::InvalidInput(format!("invalid coin id '{}'", id)));
        }

        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
        ];
        self.get_json(&format!("/coins/{}", id), &query).await
    }
}
