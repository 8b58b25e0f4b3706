use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::entities::{prelude::*, roles};
use crate::models::Role;

impl TryFrom<roles::Model> for Role {
    type Error = anyhow::Error;

    fn try_from(model: roles::Model) -> Result<Self> {
        Ok(Self {
            permissions: serde_json::from_str(&model.permissions)
                .with_context(|| format!("Role {} has corrupt permissions", model.name))?,
            name: model.name,
        })
    }
}

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(&self, name: &str) -> Result<Option<Role>> {
        let role = Roles::find_by_id(name.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query role")?;

        role.map(Role::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Role>> {
        Roles::find()
            .order_by_asc(roles::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list roles")?
            .into_iter()
            .map(Role::try_from)
            .collect()
    }
}
