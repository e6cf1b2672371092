use super::error::AuthError;
use super::session_store::{SessionRepository, SessionStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Identity attached to a request once its credential has been verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Resolves a bearer credential to a user identity
#[async_trait]
pub trait AuthGuard: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Guard that accepts tokens held by the session store
pub struct SessionAuthGuard<S: SessionRepository> {
    sessions: Arc<SessionStore<S>>,
}

impl<S: SessionRepository> SessionAuthGuard<S> {
    pub fn new(sessions: Arc<SessionStore<S>>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl<S: SessionRepository + 'static> AuthGuard for SessionAuthGuard<S> {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let session = self.sessions.validate_session(&token.to_string()).await?;
        Ok(AuthenticatedUser {
            user_id: session.user_id,
        })
    }
}
