//! `SeaORM` implementation of the `RoleService` trait.

use async_trait::async_trait;
use tracing::warn;

use crate::db::Store;
use crate::models::Role;
use crate::services::error::infra;
use crate::services::{RoleService, ServiceError};

pub struct SeaOrmRoleService {
    store: Store,
}

impl SeaOrmRoleService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleService for SeaOrmRoleService {
    async fn find_role(&self, name: &str) -> Result<Role, ServiceError> {
        let role = self
            .store
            .roles()
            .find(name)
            .await
            .map_err(infra("Failed to look up role"))?;

        role.ok_or_else(|| {
            warn!(role = name, "Role lookup for unknown role");
            ServiceError::NotFound(format!("Role '{name}' does not exist"))
        })
    }

    async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        self.store
            .roles()
            .list()
            .await
            .map_err(infra("Failed to list roles"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Permission, UserRole};

    async fn service() -> SeaOrmRoleService {
        // One connection so every query sees the same in-memory database
        let store = Store::with_pool_options("sqlite::memory:", 1, 1).await.unwrap();
        SeaOrmRoleService::new(store)
    }

    #[tokio::test]
    async fn seeded_roles_match_the_defaults() {
        let roles = service().await;

        let listed = roles.list_roles().await.unwrap();
        assert_eq!(listed.len(), UserRole::ALL.len());

        for role in UserRole::ALL {
            let found = roles.find_role(role.as_str()).await.unwrap();
            assert_eq!(found.permissions, role.default_permissions());
        }
    }

    #[tokio::test]
    async fn unknown_role_is_not_found() {
        let err = service().await.find_role("Admin").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn permissions_are_unioned() {
        let permissions = service()
            .await
            .permissions_for(&[UserRole::User, UserRole::QualityAnalyst])
            .await
            .unwrap();

        assert!(permissions.contains(&Permission::CanCloseAnyBug));
        assert!(permissions.contains(&Permission::CanViewData));
        assert!(!permissions.contains(&Permission::CanAssignRoles));
    }
}
