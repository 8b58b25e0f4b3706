//! Audit events recorded for every successful mutation.
//!
//! Each event becomes one append-only entry in the `Edits` collection.

use serde::Serialize;
use std::fmt;

use super::ObjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    User,
    Bug,
    Comment,
}

impl Collection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bug => "bug",
            Self::Comment => "comment",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditOp {
    Insert,
    Update,
    Delete,
    Classify,
    Assign,
    Transition,
}

impl EditOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Classify => "classify",
            Self::Assign => "assign",
            Self::Transition => "transition",
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation about to be written to the audit log.
#[derive(Clone, Debug)]
pub struct EditEvent {
    pub collection: Collection,
    pub op: EditOp,
    pub target_id: ObjectId,
    pub changes: serde_json::Value,
    pub auth_user_id: Option<ObjectId>,
}

impl EditEvent {
    #[must_use]
    pub fn new(collection: Collection, op: EditOp, target_id: ObjectId) -> Self {
        Self {
            collection,
            op,
            target_id,
            changes: serde_json::Value::Null,
            auth_user_id: None,
        }
    }

    #[must_use]
    pub fn with_changes(mut self, changes: serde_json::Value) -> Self {
        self.changes = changes;
        self
    }

    #[must_use]
    pub const fn by(mut self, user_id: ObjectId) -> Self {
        self.auth_user_id = Some(user_id);
        self
    }
}
