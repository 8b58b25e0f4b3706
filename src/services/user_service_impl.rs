//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{Store, UserWrite};
use crate::domain::events::{Collection, EditEvent, EditOp};
use crate::domain::query::{Page, UserQuery};
use crate::domain::{Actor, ObjectId, Permission, UserRole, time};
use crate::models::user::normalize_email;
use crate::models::{NewUser, User, UserChanges};
use crate::services::error::infra;
use crate::services::user_service::{Registration, UserService, UserUpdate};
use crate::services::ServiceError;

const EMAIL_TAKEN: &str = "Email already registered";

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash(&self, password: String) -> Result<String, ServiceError> {
        hash_password_blocking(password, self.security.clone())
            .await
            .map_err(infra("Failed to hash password"))
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list(&self, query: &UserQuery) -> Result<Page<User>, ServiceError> {
        self.store
            .users()
            .find(query)
            .await
            .map_err(infra("Failed to list users"))
    }

    async fn get_by_id(&self, id: ObjectId) -> Result<Option<User>, ServiceError> {
        self.store
            .users()
            .get_by_id(id)
            .await
            .map_err(infra("Failed to fetch user"))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = self
            .store
            .users()
            .get_by_email(&normalize_email(email))
            .await
            .map_err(infra("Failed to fetch user by email"))?;

        Ok(user.map(|credentials| credentials.user))
    }

    async fn register(&self, registration: Registration) -> Result<User, ServiceError> {
        let email = normalize_email(&registration.email);
        if email.is_empty() {
            return Err(ServiceError::Validation("Email is required".to_string()));
        }

        let new_user = NewUser {
            id: ObjectId::new(),
            email,
            password: self.hash(registration.password).await?,
            given_name: registration.given_name.trim().to_string(),
            family_name: registration.family_name.trim().to_string(),
            role: UserRole::default(),
            created_on: time::now(),
        };
        let event = EditEvent::new(Collection::User, EditOp::Insert, new_user.id).with_changes(
            json!({
                "email": new_user.email,
                "givenName": new_user.given_name,
                "familyName": new_user.family_name,
                "role": new_user.role,
            }),
        );

        let user = match self
            .store
            .users()
            .insert(new_user, &event)
            .await
            .map_err(infra("Failed to register user"))?
        {
            UserWrite::Saved(user) => user,
            UserWrite::EmailTaken => return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string())),
            UserWrite::NotFound => return Err(ServiceError::not_found("User")),
        };

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn update(&self, actor: &Actor, id: ObjectId, update: UserUpdate) -> Result<User, ServiceError> {
        if !actor.can_edit_user(id) {
            return Err(ServiceError::Forbidden(
                "You are not allowed to edit this user".to_string(),
            ));
        }
        if update.role.is_some() && !actor.has(Permission::CanAssignRoles) {
            return Err(ServiceError::Forbidden(
                "You are not allowed to change roles".to_string(),
            ));
        }

        let password = match update.password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let changes = UserChanges {
            email: update.email.as_deref().map(normalize_email),
            password,
            given_name: update.given_name.map(|name| name.trim().to_string()),
            family_name: update.family_name.map(|name| name.trim().to_string()),
            role: update.role,
        };

        if changes.is_empty() {
            return Err(ServiceError::Validation("No changes supplied".to_string()));
        }
        if changes.email.as_deref() == Some("") {
            return Err(ServiceError::Validation("Email is required".to_string()));
        }

        let mut recorded = serde_json::to_value(&changes)
            .map_err(|e| infra("Failed to encode user changes")(e.into()))?;
        if changes.password.is_some() {
            recorded["passwordChanged"] = json!(true);
        }
        let event = EditEvent::new(Collection::User, EditOp::Update, id)
            .with_changes(recorded)
            .by(actor.id);

        let user = match self
            .store
            .users()
            .update(id, &changes, &time::now(), &event)
            .await
            .map_err(infra("Failed to update user"))?
        {
            UserWrite::Saved(user) => user,
            UserWrite::EmailTaken => return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string())),
            UserWrite::NotFound => return Err(ServiceError::not_found("User")),
        };

        Ok(user)
    }

    async fn delete(&self, actor: &Actor, id: ObjectId) -> Result<(), ServiceError> {
        let event = EditEvent::new(Collection::User, EditOp::Delete, id).by(actor.id);
        let deleted = self
            .store
            .users()
            .delete(id, &event)
            .await
            .map_err(infra("Failed to delete user"))?;

        if !deleted {
            return Err(ServiceError::not_found("User"));
        }

        info!(user_id = %id, deleted_by = %actor.id, "User deleted");
        Ok(())
    }
}
