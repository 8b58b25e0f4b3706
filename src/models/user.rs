use serde::Serialize;

use crate::domain::{ObjectId, UserRole};

/// A user as exposed outside the store. The password never leaves the repository
/// except through [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ObjectId,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_on: String,
    pub last_updated: Option<String>,
}

/// A user together with the stored password (hash or legacy plain text).
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: ObjectId,
    pub email: String,
    pub password: String,
    pub given_name: String,
    pub family_name: String,
    pub role: UserRole,
    pub created_on: String,
}

/// Partial replacement of user fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl UserChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.given_name.is_none()
            && self.family_name.is_none()
            && self.role.is_none()
    }
}

#[must_use]
pub fn full_name(given_name: &str, family_name: &str) -> String {
    format!("{given_name} {family_name}").trim().to_string()
}

/// Emails are compared and stored trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(full_name("Ada", "Lovelace"), "Ada Lovelace");
        assert_eq!(full_name("Ada", ""), "Ada");
    }

    #[test]
    fn password_never_reaches_the_audit_trail() {
        let changes = UserChanges {
            password: Some("$argon2id$...".to_string()),
            given_name: Some("Ada".to_string()),
            ..UserChanges::default()
        };
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            serde_json::json!({ "givenName": "Ada" })
        );
    }
}
