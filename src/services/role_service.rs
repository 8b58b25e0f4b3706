//! Domain service for role lookup and permission resolution.

use std::collections::BTreeSet;

use crate::domain::{Permission, UserRole};
use crate::models::Role;
use crate::services::ServiceError;

#[async_trait::async_trait]
pub trait RoleService: Send + Sync {
    /// Looks up a role by name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when no such role exists.
    async fn find_role(&self, name: &str) -> Result<Role, ServiceError>;

    async fn list_roles(&self) -> Result<Vec<Role>, ServiceError>;

    /// Union of the permission sets of every given role. Fails if any role is missing.
    async fn permissions_for(&self, roles: &[UserRole]) -> Result<BTreeSet<Permission>, ServiceError> {
        let mut permissions = BTreeSet::new();
        for role in roles {
            permissions.extend(self.find_role(role.as_str()).await?.permissions);
        }
        Ok(permissions)
    }
}
