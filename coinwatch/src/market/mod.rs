pub mod coingecko;
pub mod service;
pub mod single_flight;

pub use coingecko::{CoinGeckoProvider, MAX_IDS_PER_REQUEST};
pub use service::{DEFAULT_TTL, MarketDataService, TOP_COINS_KEY};
pub use single_flight::SingleFlight;
