//! Market-data caching and watchlist core.
//!
//! `ports` declares the seams (cache store, upstream provider, user
//! repository); `market` and `watchlist` hold the services built on them.

pub mod auth;
pub mod domain;
pub mod market;
pub mod persistence;
pub mod ports;
pub mod watchlist;

#[cfg(test)]
pub(crate) mod test_support;
