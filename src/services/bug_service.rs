//! Domain service for bug reports.

use crate::domain::query::{BugQuery, Page};
use crate::domain::{Actor, BugClassification, BugStatus, ObjectId};
use crate::models::{Bug, Edit};
use crate::services::ServiceError;

#[derive(Debug, Clone)]
pub struct BugReport {
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: String,
}

/// Descriptive fields a caller may replace.
#[derive(Debug, Clone, Default)]
pub struct BugEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub steps_to_reproduce: Option<String>,
}

#[async_trait::async_trait]
pub trait BugService: Send + Sync {
    async fn list(&self, query: &BugQuery) -> Result<Page<Bug>, ServiceError>;

    /// Returns `None` when no such bug exists.
    async fn get(&self, id: ObjectId) -> Result<Option<Bug>, ServiceError>;

    async fn create(&self, actor: &Actor, report: BugReport) -> Result<Bug, ServiceError>;

    async fn update(&self, actor: &Actor, id: ObjectId, edit: BugEdit) -> Result<Bug, ServiceError>;

    async fn classify(
        &self,
        actor: &Actor,
        id: ObjectId,
        classification: BugClassification,
    ) -> Result<Bug, ServiceError>;

    /// Assigns the bug to a user, or unassigns it with `None`.
    async fn assign(
        &self,
        actor: &Actor,
        id: ObjectId,
        assignee: Option<ObjectId>,
    ) -> Result<Bug, ServiceError>;

    /// Moves the bug along the status transition table.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for a move the table does not allow.
    async fn transition(&self, actor: &Actor, id: ObjectId, to: BugStatus) -> Result<Bug, ServiceError>;

    async fn close(&self, actor: &Actor, id: ObjectId) -> Result<Bug, ServiceError> {
        self.transition(actor, id, BugStatus::Closed).await
    }

    /// Audit trail of the bug, oldest first.
    async fn history(&self, id: ObjectId) -> Result<Vec<Edit>, ServiceError>;
}
