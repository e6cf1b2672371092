// shared/src/lib.rs

/// Workspace-wide error type.
///
/// `Clone` so a single upstream result can be handed to every caller
/// awaiting the same in-flight fetch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("coin already in watchlist: {0}")]
    DuplicateWatchlistEntry(String),
    #[error("persistence: {0}")]
    Persistence(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlMs(pub u64);

impl TtlMs {
    pub fn as_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.0)
    }
}

pub mod config;
