//! Domain service for user accounts.

use crate::domain::query::{Page, UserQuery};
use crate::domain::{Actor, ObjectId, UserRole};
use crate::models::User;
use crate::services::ServiceError;

/// A self-service sign-up. New accounts always start with the default role.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub given_name: String,
    pub family_name: String,
}

/// Fields a caller may replace on an account.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub role: Option<UserRole>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list(&self, query: &UserQuery) -> Result<Page<User>, ServiceError>;

    /// Returns `None` when no such user exists.
    async fn get_by_id(&self, id: ObjectId) -> Result<Option<User>, ServiceError>;

    /// Looks a user up by email after trimming and lowercasing it.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    /// # Errors
    ///
    /// Returns [`ServiceError::Conflict`] when the normalised email is taken.
    async fn register(&self, registration: Registration) -> Result<User, ServiceError>;

    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless the caller edits their own account
    /// or may edit any user; changing a role additionally needs `canAssignRoles`.
    async fn update(&self, actor: &Actor, id: ObjectId, update: UserUpdate) -> Result<User, ServiceError>;

    async fn delete(&self, actor: &Actor, id: ObjectId) -> Result<(), ServiceError>;
}
