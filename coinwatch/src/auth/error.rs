use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Storage error: {0}")]
    Storage(String),
}
