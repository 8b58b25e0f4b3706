//! Domain service for authentication.
//!
//! Handles login, registration and the signed session tokens that carry the
//! caller's identity, roles and resolved permissions between requests.

use crate::domain::Actor;
use crate::models::User;
use crate::services::ServiceError;
use crate::services::user_service::Registration;

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub token: String,
    pub ttl: chrono::Duration,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a session.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] when the email is unknown or the password wrong.
    async fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError>;

    /// Creates an account and signs the new user in.
    async fn register(&self, registration: Registration) -> Result<Session, ServiceError>;

    /// Resolves the user's role into permissions and signs a token.
    async fn issue(&self, user: &User) -> Result<Session, ServiceError>;

    /// Validates a token and returns the caller it was issued to.
    fn authenticate(&self, token: &str) -> Result<Actor, ServiceError>;
}
