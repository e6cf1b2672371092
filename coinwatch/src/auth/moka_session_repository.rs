use super::error::AuthError;
use super::session::{Session, SessionToken};
use super::session_store::SessionRepository;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

/// Evicts each session when its own `expires_at` passes
struct SessionExpiry;

impl Expiry<SessionToken, Session> for SessionExpiry {
    fn expire_after_create(
        &self,
        _token: &SessionToken,
        session: &Session,
        _created_at: Instant,
    ) -> Option<Duration> {
        session.remaining_ttl()
    }
}

/// Moka-based in-memory session repository
pub struct MokaSessionRepository {
    sessions: Cache<SessionToken, Session>,
}

impl MokaSessionRepository {
    /// Create a new Moka session repository with an optional capacity bound
    pub fn new(max_sessions: Option<u64>) -> Self {
        let mut builder = Cache::builder().expire_after(SessionExpiry);

        if let Some(capacity) = max_sessions {
            builder = builder.max_capacity(capacity);
        }

        Self {
            sessions: builder.build(),
        }
    }
}

impl Default for MokaSessionRepository {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl SessionRepository for MokaSessionRepository {
    async fn insert_session(&self, session: Session) -> Result<(), AuthError> {
        self.sessions.insert(session.token.clone(), session).await;
        Ok(())
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session, AuthError> {
        let session = self
            .sessions
            .get(token)
            .await
            .ok_or(AuthError::InvalidToken)?;

        // Expiry runs lazily; double-check before trusting the entry
        if session.is_expired() {
            self.sessions.invalidate(token).await;
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }
}
