//! Roles, permissions and the authenticated caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    User,
    Developer,
    #[serde(rename = "Quality Analyst")]
    QualityAnalyst,
    #[serde(rename = "Business Analyst")]
    BusinessAnalyst,
    #[serde(rename = "Product Manager")]
    ProductManager,
    #[serde(rename = "Technical Manager")]
    TechnicalManager,
}

impl UserRole {
    pub const ALL: [Self; 6] = [
        Self::User,
        Self::Developer,
        Self::QualityAnalyst,
        Self::BusinessAnalyst,
        Self::ProductManager,
        Self::TechnicalManager,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Developer => "Developer",
            Self::QualityAnalyst => "Quality Analyst",
            Self::BusinessAnalyst => "Business Analyst",
            Self::ProductManager => "Product Manager",
            Self::TechnicalManager => "Technical Manager",
        }
    }

    /// Permission set seeded into the role table for this role.
    #[must_use]
    pub fn default_permissions(&self) -> BTreeSet<Permission> {
        use Permission::{
            CanAddComments, CanAssignRoles, CanClassifyAnyBug, CanCloseAnyBug, CanEditAnyBug,
            CanEditAnyUser, CanEditIfAssigned, CanEditMyBug, CanReassignAnyBug,
            CanReassignIfAssigned, CanViewData,
        };

        let base = [CanViewData, CanAddComments, CanEditMyBug];
        let extra: &[Permission] = match self {
            Self::User => &[],
            Self::Developer => &[CanEditIfAssigned, CanReassignIfAssigned],
            Self::QualityAnalyst => &[CanEditIfAssigned, CanReassignIfAssigned, CanCloseAnyBug],
            Self::BusinessAnalyst => &[
                CanEditAnyBug,
                CanCloseAnyBug,
                CanClassifyAnyBug,
                CanReassignAnyBug,
            ],
            Self::ProductManager => &[
                CanEditAnyBug,
                CanCloseAnyBug,
                CanClassifyAnyBug,
                CanReassignAnyBug,
                CanEditAnyUser,
            ],
            Self::TechnicalManager => &Permission::ALL,
        };

        base.into_iter().chain(extra.iter().copied()).collect()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    CanViewData,
    CanAddComments,
    CanEditMyBug,
    CanEditIfAssigned,
    CanReassignIfAssigned,
    CanEditAnyBug,
    CanCloseAnyBug,
    CanClassifyAnyBug,
    CanReassignAnyBug,
    CanEditAnyUser,
    CanAssignRoles,
}

impl Permission {
    pub const ALL: [Self; 11] = [
        Self::CanViewData,
        Self::CanAddComments,
        Self::CanEditMyBug,
        Self::CanEditIfAssigned,
        Self::CanReassignIfAssigned,
        Self::CanEditAnyBug,
        Self::CanCloseAnyBug,
        Self::CanClassifyAnyBug,
        Self::CanReassignAnyBug,
        Self::CanEditAnyUser,
        Self::CanAssignRoles,
    ];
}

/// The authenticated caller, as carried by the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ObjectId,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<UserRole>,
    pub permissions: BTreeSet<Permission>,
}

impl Actor {
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    #[must_use]
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        self.roles.iter().any(|role| roles.contains(role))
    }

    #[must_use]
    pub fn can_edit_user(&self, user_id: ObjectId) -> bool {
        self.id == user_id || self.has(Permission::CanEditAnyUser)
    }

    /// Editing descriptive fields or moving status (other than closing).
    #[must_use]
    pub fn can_edit_bug(&self, created_by: ObjectId, assigned_to: Option<ObjectId>) -> bool {
        self.has(Permission::CanEditAnyBug)
            || (created_by == self.id && self.has(Permission::CanEditMyBug))
            || (assigned_to == Some(self.id) && self.has(Permission::CanEditIfAssigned))
    }

    #[must_use]
    pub fn can_reassign_bug(&self, assigned_to: Option<ObjectId>) -> bool {
        self.has(Permission::CanReassignAnyBug)
            || (assigned_to == Some(self.id) && self.has(Permission::CanReassignIfAssigned))
    }

    #[must_use]
    pub fn can_close_bug(&self) -> bool {
        self.has(Permission::CanCloseAnyBug)
    }
}
