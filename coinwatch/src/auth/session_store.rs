use super::error::AuthError;
use super::session::{Session, SessionToken};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for session storage operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store an issued session as-is
    async fn insert_session(&self, session: Session) -> Result<(), AuthError>;

    /// Get a live session by token
    async fn get_session(&self, token: &SessionToken) -> Result<Session, AuthError>;
}

/// Session store service
pub struct SessionStore<S: SessionRepository> {
    repository: Arc<S>,
}

impl<S: SessionRepository> SessionStore<S> {
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    /// Register provisioned `(token, user_id)` pairs that never expire
    pub async fn seed_tokens(&self, tokens: &[(String, String)]) -> Result<usize, AuthError> {
        for (token, user_id) in tokens {
            self.repository
                .insert_session(Session::permanent(token.clone(), user_id.clone()))
                .await?;
        }
        Ok(tokens.len())
    }

    /// Validate a session token and return the live session
    pub async fn validate_session(&self, token: &SessionToken) -> Result<Session, AuthError> {
        self.repository.get_session(token).await
    }
}
