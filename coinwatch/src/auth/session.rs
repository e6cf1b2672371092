use chrono::Utc;
use std::time::Duration;

/// Opaque bearer token issued by the credential service
pub type SessionToken = String;

/// Get current timestamp in milliseconds since Unix epoch
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// An issued bearer credential and the user it resolves to
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: String,
    pub created_at: u64,         // UTC timestamp in milliseconds
    pub expires_at: Option<u64>, // None = never expires
}

impl Session {
    /// Create a session that expires `ttl_ms` from now
    pub fn new(token: SessionToken, user_id: impl Into<String>, ttl_ms: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            token,
            user_id: user_id.into(),
            created_at: now,
            expires_at: Some(now.saturating_add(ttl_ms)),
        }
    }

    /// Create a session with no expiry, used for provisioned tokens
    pub fn permanent(token: SessionToken, user_id: impl Into<String>) -> Self {
        Self {
            token,
            user_id: user_id.into(),
            created_at: current_timestamp_ms(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => current_timestamp_ms() >= expires_at,
            None => false,
        }
    }

    /// Remaining lifetime, `None` for permanent sessions
    pub fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| Duration::from_millis(expires_at.saturating_sub(current_timestamp_ms())))
    }
}
