// Public API
pub mod error;
pub mod guard;
pub mod moka_session_repository;
pub mod session;
pub mod session_store;

// Re-export commonly used types
pub use error::AuthError;
pub use guard::{AuthGuard, AuthenticatedUser, SessionAuthGuard};
pub use moka_session_repository::MokaSessionRepository;
pub use session::{current_timestamp_ms, Session, SessionToken};
pub use session_store::{SessionRepository, SessionStore};
