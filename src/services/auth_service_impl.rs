//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::{hash_password_blocking, verify_password};
use crate::db::{PasswordMatch, Store};
use crate::domain::Actor;
use crate::models::User;
use crate::models::user::normalize_email;
use crate::services::auth_service::{AuthService, Session};
use crate::services::error::infra;
use crate::services::token::TokenIssuer;
use crate::services::user_service::Registration;
use crate::services::{RoleService, ServiceError, UserService};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    tokens: TokenIssuer,
    users: Arc<dyn UserService>,
    roles: Arc<dyn RoleService>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        security: SecurityConfig,
        users: Arc<dyn UserService>,
        roles: Arc<dyn RoleService>,
    ) -> Self {
        Self {
            tokens: TokenIssuer::new(&security),
            store,
            security,
            users,
            roles,
        }
    }

    /// Replaces a plain-text password with a hash. Failure never blocks the login.
    async fn migrate_legacy_password(&self, user: &User, password: String) {
        let result = async {
            let hash = hash_password_blocking(password, self.security.clone()).await?;
            self.store.users().update_password(user.id, hash).await
        }
        .await;

        match result {
            Ok(()) => info!(user_id = %user.id, "Migrated legacy plain-text password"),
            Err(e) => warn!(user_id = %user.id, error = ?e, "Failed to migrate legacy password"),
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let credentials = self
            .store
            .users()
            .get_by_email(&normalize_email(email))
            .await
            .map_err(infra("Failed to look up user for login"))?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let matched = verify_password(credentials.password, password.to_string())
            .await
            .map_err(infra("Failed to verify password"))?;

        match matched {
            PasswordMatch::Mismatch => {
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            PasswordMatch::Legacy if self.security.auto_migrate_password_hashes => {
                self.migrate_legacy_password(&credentials.user, password.to_string())
                    .await;
            }
            PasswordMatch::Legacy | PasswordMatch::Hashed => {}
        }

        self.issue(&credentials.user).await
    }

    async fn register(&self, registration: Registration) -> Result<Session, ServiceError> {
        let user = self.users.register(registration).await?;
        self.issue(&user).await
    }

    async fn issue(&self, user: &User) -> Result<Session, ServiceError> {
        let roles = vec![user.role];

        // A user whose role is missing from the role table is a deployment fault, not a client error.
        let permissions = match self.roles.permissions_for(&roles).await {
            Ok(permissions) => permissions,
            Err(ServiceError::NotFound(message)) => {
                return Err(infra("Failed to resolve permissions")(anyhow::anyhow!(message)));
            }
            Err(e) => return Err(e),
        };

        let actor = Actor {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles,
            permissions,
        };

        let token = self
            .tokens
            .issue(&actor)
            .map_err(|e| infra("Failed to sign session token")(e.into()))?;

        Ok(Session {
            actor,
            token,
            ttl: self.tokens.ttl(),
        })
    }

    fn authenticate(&self, token: &str) -> Result<Actor, ServiceError> {
        self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            ServiceError::Unauthorized("Invalid or expired session".to_string())
        })
    }
}
