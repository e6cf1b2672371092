use std::str::FromStr;
use tracing::warn;

use crate::TtlMs;

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub data_dir: String,
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    pub upstream_timeout_secs: u64,
    pub cache_ttl: TtlMs,
    pub cache_max_entries: u64,
    /// `(token, user_id)` pairs seeded into the session store at startup
    pub static_tokens: Vec<(String, String)>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
    const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_CACHE_TTL_MS: u64 = 30_000;
    const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1024;

    pub fn from_env() -> Self {
        Self {
            host: std::env::var("COINWATCH_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string()),
            http_port: parse_env("COINWATCH_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            data_dir: std::env::var("COINWATCH_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
            coingecko_base_url: std::env::var("COINWATCH_COINGECKO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| Self::DEFAULT_COINGECKO_BASE_URL.to_string()),
            coingecko_api_key: std::env::var("COINWATCH_COINGECKO_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            upstream_timeout_secs: parse_env(
                "COINWATCH_UPSTREAM_TIMEOUT_SECS",
                Self::DEFAULT_UPSTREAM_TIMEOUT_SECS,
            ),
            cache_ttl: TtlMs(parse_env("COINWATCH_CACHE_TTL_MS", Self::DEFAULT_CACHE_TTL_MS)),
            cache_max_entries: parse_env(
                "COINWATCH_CACHE_MAX_ENTRIES",
                Self::DEFAULT_CACHE_MAX_ENTRIES,
            ),
            static_tokens: std::env::var("COINWATCH_STATIC_TOKENS")
                .map(|raw| parse_static_tokens(&raw))
                .unwrap_or_default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse_env<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Parse `token:user_id,token:user_id`. Malformed pairs are skipped.
pub fn parse_static_tokens(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| match pair.split_once(':') {
            Some((token, user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Some((token.to_string(), user_id.to_string()))
            }
            _ => {
                warn!("Ignoring malformed static token entry");
                None
            }
        })
        .collect()
}
