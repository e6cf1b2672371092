pub mod crypto;
pub mod health;
pub mod watchlist;

pub use crypto::{coin_detail, top_coins};
pub use health::health_check;
pub use watchlist::{add_to_watchlist, get_watchlist, remove_from_watchlist};
