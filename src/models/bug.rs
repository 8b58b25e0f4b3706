use serde::Serialize;

use crate::domain::{BugClassification, BugStatus, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: String,
    pub classification: BugClassification,
    pub status: BugStatus,
    pub created_on: String,
    pub created_by_id: ObjectId,
    pub created_by_name: String,
    pub assigned_to_id: Option<ObjectId>,
    pub assigned_to_name: Option<String>,
    pub classified_on: Option<String>,
    pub closed_on: Option<String>,
    pub closed_by_id: Option<ObjectId>,
    pub closed_by_name: Option<String>,
    pub last_updated: Option<String>,
    pub last_updated_by: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NewBug {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: String,
    pub created_on: String,
    pub created_by_id: ObjectId,
    pub created_by_name: String,
}

/// Partial replacement of bug fields.
///
/// Nullable columns use `Option<Option<_>>`: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_to_reproduce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<BugClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classified_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BugStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<Option<ObjectId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_on: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by_id: Option<Option<ObjectId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by_name: Option<Option<String>>,
}

impl BugChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.steps_to_reproduce.is_none()
            && self.classification.is_none()
            && self.classified_on.is_none()
            && self.status.is_none()
            && self.assigned_to_id.is_none()
            && self.assigned_to_name.is_none()
            && self.closed_on.is_none()
            && self.closed_by_id.is_none()
            && self.closed_by_name.is_none()
    }
}
