use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tokio::task;

use super::{contains_pattern, edit, fold, folded_contains, is_unique_violation, order, parse_id};
use crate::config::SecurityConfig;
use crate::domain::events::EditEvent;
use crate::domain::query::{Page, UserQuery, UserSortField};
use crate::domain::time::format_timestamp;
use crate::domain::ObjectId;
use crate::entities::{prelude::*, users};
use crate::models::user::full_name;
use crate::models::{NewUser, User, UserChanges, UserCredentials};

/// Result of a write that can collide with the unique email constraint.
#[derive(Debug)]
pub enum UserWrite {
    Saved(User),
    NotFound,
    EmailTaken,
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self> {
        Ok(Self {
            id: parse_id(&model.id)?,
            full_name: full_name(&model.given_name, &model.family_name),
            role: model
                .role
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("User {} has an unknown role", model.id))?,
            email: model.email,
            given_name: model.given_name,
            family_name: model.family_name,
            created_on: model.created_on,
            last_updated: model.last_updated,
        })
    }
}

impl TryFrom<users::Model> for UserCredentials {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self> {
        let password = model.password.clone();
        Ok(Self {
            user: User::try_from(model)?,
            password,
        })
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// One page of users matching the query, plus the unpaginated total.
    pub async fn find(&self, query: &UserQuery) -> Result<Page<User>> {
        let select = Self::filtered(query);

        let total = select
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;

        let models = Self::sorted(select, query)
            .offset(query.pagination.skip())
            .limit(query.pagination.page_size)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        let items = models
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, total, query.pagination))
    }

    fn filtered(query: &UserQuery) -> Select<Users> {
        let mut select = Users::find();

        // Emails are stored lowercased already
        if let Some(keywords) = &query.keywords {
            let pattern = contains_pattern(keywords);
            select = select.filter(
                Condition::any()
                    .add(folded_contains(users::Column::GivenNameFolded, &pattern))
                    .add(folded_contains(users::Column::FamilyNameFolded, &pattern))
                    .add(folded_contains(users::Column::Email, &pattern)),
            );
        }

        if let Some(role) = &query.role {
            select = select.filter(users::Column::Role.eq(role.as_str()));
        }

        if let Some(before) = query.age.created_on_or_before {
            select = select.filter(users::Column::CreatedOn.lte(format_timestamp(before)));
        }

        if let Some(after) = query.age.created_on_or_after {
            select = select.filter(users::Column::CreatedOn.gte(format_timestamp(after)));
        }

        select
    }

    fn sorted(mut select: Select<Users>, query: &UserQuery) -> Select<Users> {
        for (field, direction) in &query.sort {
            let column = match field {
                UserSortField::GivenName => users::Column::GivenName,
                UserSortField::FamilyName => users::Column::FamilyName,
                UserSortField::Role => users::Column::Role,
                UserSortField::CreatedOn => users::Column::CreatedOn,
            };
            select = select.order_by(column, order(*direction));
        }
        select.order_by_asc(users::Column::Id)
    }

    pub async fn get_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        let user = Users::find_by_id(id.to_hex())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    /// Exact lookup; callers normalise the email first.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(UserCredentials::try_from).transpose()
    }

    /// Inserts the user and its audit entry in one transaction.
    pub async fn insert(&self, user: NewUser, event: &EditEvent) -> Result<UserWrite> {
        let model = users::ActiveModel {
            id: Set(user.id.to_hex()),
            email: Set(user.email),
            password: Set(user.password),
            given_name_folded: Set(fold(&user.given_name)),
            family_name_folded: Set(fold(&user.family_name)),
            given_name: Set(user.given_name),
            family_name: Set(user.family_name),
            role: Set(user.role.as_str().to_string()),
            created_on: Set(user.created_on),
            last_updated: Set(None),
        };

        let txn = self.conn.begin().await?;

        match Users::insert(model).exec_without_returning(&txn).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(UserWrite::EmailTaken),
            Err(e) => return Err(e).context("Failed to insert user"),
        }

        edit::append(&txn, event).await?;

        let saved = Users::find_by_id(user.id.to_hex())
            .one(&txn)
            .await
            .context("Failed to read back inserted user")?;

        txn.commit().await?;

        Ok(match saved {
            Some(model) => UserWrite::Saved(User::try_from(model)?),
            None => UserWrite::NotFound,
        })
    }

    /// Partial replacement recorded as `event`; `changes.password` must already be hashed.
    pub async fn update(
        &self,
        id: ObjectId,
        changes: &UserChanges,
        now: &str,
        event: &EditEvent,
    ) -> Result<UserWrite> {
        let mut active = users::ActiveModel {
            last_updated: Set(Some(now.to_string())),
            ..Default::default()
        };
        if let Some(email) = &changes.email {
            active.email = Set(email.clone());
        }
        if let Some(password) = &changes.password {
            active.password = Set(password.clone());
        }
        if let Some(given_name) = &changes.given_name {
            active.given_name_folded = Set(fold(given_name));
            active.given_name = Set(given_name.clone());
        }
        if let Some(family_name) = &changes.family_name {
            active.family_name_folded = Set(fold(family_name));
            active.family_name = Set(family_name.clone());
        }
        if let Some(role) = changes.role {
            active.role = Set(role.as_str().to_string());
        }

        let txn = self.conn.begin().await?;

        let result = Users::update_many()
            .set(active)
            .filter(users::Column::Id.eq(id.to_hex()))
            .exec(&txn)
            .await;

        match result {
            Ok(result) if result.rows_affected == 0 => return Ok(UserWrite::NotFound),
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(UserWrite::EmailTaken),
            Err(e) => return Err(e).context("Failed to update user"),
        }

        edit::append(&txn, event).await?;

        let saved = Users::find_by_id(id.to_hex())
            .one(&txn)
            .await
            .context("Failed to read back updated user")?;

        txn.commit().await?;

        Ok(match saved {
            Some(model) => UserWrite::Saved(User::try_from(model)?),
            None => UserWrite::NotFound,
        })
    }

    pub async fn update_password(&self, id: ObjectId, password_hash: String) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::Password,
                sea_orm::sea_query::Expr::value(password_hash),
            )
            .filter(users::Column::Id.eq(id.to_hex()))
            .exec(&self.conn)
            .await
            .context("Failed to store migrated password hash")?;

        Ok(())
    }

    /// Deletes the user and records `event`. `false` when there was nothing to delete.
    pub async fn delete(&self, id: ObjectId, event: &EditEvent) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let result = Users::delete_by_id(id.to_hex())
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected == 0 {
            return Ok(false);
        }

        edit::append(&txn, event).await?;
        txn.commit().await?;

        Ok(true)
    }
}

/// Hash a password using Argon2id with the configured cost.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.hash_rounds,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hashes on the blocking pool so request handling is never stalled by Argon2.
pub async fn hash_password_blocking(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

/// How a stored password matched a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMatch {
    Hashed,
    /// Stored as plain text by an older deployment; should be re-hashed.
    Legacy,
    Mismatch,
}

/// Checks a candidate password against the stored value.
///
/// Anything that does not parse as a PHC string is treated as a legacy
/// plain-text password and compared directly.
pub async fn verify_password(stored: String, candidate: String) -> Result<PasswordMatch> {
    task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored) else {
            return if stored == candidate {
                PasswordMatch::Legacy
            } else {
                PasswordMatch::Mismatch
            };
        };

        if Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
        {
            PasswordMatch::Hashed
        } else {
            PasswordMatch::Mismatch
        }
    })
    .await
    .context("Password verification task panicked")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> SecurityConfig {
        SecurityConfig {
            hash_rounds: 1,
            argon2_memory_cost_kib: 1024,
            ..SecurityConfig::default()
        }
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let hash = hash_password_blocking("hunter22".to_string(), cheap())
            .await
            .unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert_eq!(
            verify_password(hash.clone(), "hunter22".to_string()).await.unwrap(),
            PasswordMatch::Hashed
        );
        assert_eq!(
            verify_password(hash, "hunter23".to_string()).await.unwrap(),
            PasswordMatch::Mismatch
        );
    }

    #[tokio::test]
    async fn plain_text_passwords_are_legacy() {
        assert_eq!(
            verify_password("letmein".to_string(), "letmein".to_string())
                .await
                .unwrap(),
            PasswordMatch::Legacy
        );
        assert_eq!(
            verify_password("letmein".to_string(), "nope".to_string())
                .await
                .unwrap(),
            PasswordMatch::Mismatch
        );
    }
}
