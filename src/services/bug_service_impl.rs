//! `SeaORM` implementation of the `BugService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{BugWrite, Store};
use crate::domain::events::{Collection, EditEvent, EditOp};
use crate::domain::query::{BugQuery, Page};
use crate::domain::{Actor, BugClassification, BugStatus, ObjectId, Permission, time};
use crate::models::{Bug, BugChanges, Edit, NewBug};
use crate::services::audit::AuditLog;
use crate::services::bug_service::{BugEdit, BugReport, BugService};
use crate::services::error::infra;
use crate::services::ServiceError;

pub struct SeaOrmBugService {
    store: Store,
    audit: AuditLog,
}

impl SeaOrmBugService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            audit: AuditLog::new(store.clone()),
            store,
        }
    }

    async fn require(&self, id: ObjectId) -> Result<Bug, ServiceError> {
        self.get(id).await?.ok_or_else(|| ServiceError::not_found("Bug"))
    }

    /// Writes `changes` together with their audit entry. A transition passes
    /// the status it was validated against; the write is refused if it moved.
    async fn apply(
        &self,
        actor: &Actor,
        id: ObjectId,
        op: EditOp,
        changes: BugChanges,
        expected_status: Option<BugStatus>,
    ) -> Result<Bug, ServiceError> {
        let recorded = serde_json::to_value(&changes)
            .map_err(|e| infra("Failed to encode bug changes")(e.into()))?;
        let event = EditEvent::new(Collection::Bug, op, id)
            .with_changes(recorded)
            .by(actor.id);

        let written = self
            .store
            .bugs()
            .update(id, &changes, expected_status, &time::now(), actor.id, &event)
            .await
            .map_err(infra("Failed to update bug"))?;

        match written {
            BugWrite::Saved(bug) => Ok(bug),
            BugWrite::NotFound => Err(ServiceError::not_found("Bug")),
            BugWrite::StatusChanged => Err(ServiceError::Conflict(
                "The bug status changed while this request was processed".to_string(),
            )),
        }
    }
}

fn forbidden(action: &str) -> ServiceError {
    ServiceError::Forbidden(format!("You are not allowed to {action} this bug"))
}

fn required(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[async_trait]
impl BugService for SeaOrmBugService {
    async fn list(&self, query: &BugQuery) -> Result<Page<Bug>, ServiceError> {
        self.store
            .bugs()
            .find(query)
            .await
            .map_err(infra("Failed to list bugs"))
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Bug>, ServiceError> {
        self.store
            .bugs()
            .get(id)
            .await
            .map_err(infra("Failed to fetch bug"))
    }

    async fn create(&self, actor: &Actor, report: BugReport) -> Result<Bug, ServiceError> {
        required("title", &report.title)?;

        let new_bug = NewBug {
            id: ObjectId::new(),
            title: report.title.trim().to_string(),
            description: report.description,
            steps_to_reproduce: report.steps_to_reproduce,
            created_on: time::now(),
            created_by_id: actor.id,
            created_by_name: actor.full_name.clone(),
        };
        let event = EditEvent::new(Collection::Bug, EditOp::Insert, new_bug.id)
            .with_changes(serde_json::json!({
                "title": new_bug.title,
                "description": new_bug.description,
                "stepsToReproduce": new_bug.steps_to_reproduce,
            }))
            .by(actor.id);

        let bug = self
            .store
            .bugs()
            .insert(new_bug, &event)
            .await
            .map_err(infra("Failed to create bug"))?;

        info!(bug_id = %bug.id, created_by = %actor.id, "Bug created");
        Ok(bug)
    }

    async fn update(&self, actor: &Actor, id: ObjectId, edit: BugEdit) -> Result<Bug, ServiceError> {
        let bug = self.require(id).await?;
        if !actor.can_edit_bug(bug.created_by_id, bug.assigned_to_id) {
            return Err(forbidden("edit"));
        }
        if let Some(title) = &edit.title {
            required("title", title)?;
        }

        let changes = BugChanges {
            title: edit.title.map(|title| title.trim().to_string()),
            description: edit.description,
            steps_to_reproduce: edit.steps_to_reproduce,
            ..BugChanges::default()
        };
        if changes.is_empty() {
            return Err(ServiceError::Validation("No changes supplied".to_string()));
        }

        self.apply(actor, id, EditOp::Update, changes, None).await
    }

    async fn classify(
        &self,
        actor: &Actor,
        id: ObjectId,
        classification: BugClassification,
    ) -> Result<Bug, ServiceError> {
        if !actor.has(Permission::CanClassifyAnyBug) {
            return Err(forbidden("classify"));
        }
        self.require(id).await?;

        let changes = BugChanges {
            classification: Some(classification),
            classified_on: Some(time::now()),
            ..BugChanges::default()
        };

        self.apply(actor, id, EditOp::Classify, changes, None).await
    }

    async fn assign(
        &self,
        actor: &Actor,
        id: ObjectId,
        assignee: Option<ObjectId>,
    ) -> Result<Bug, ServiceError> {
        let bug = self.require(id).await?;
        if !actor.can_reassign_bug(bug.assigned_to_id) {
            return Err(forbidden("reassign"));
        }

        let assignee_name = match assignee {
            Some(user_id) => {
                let user = self
                    .store
                    .users()
                    .get_by_id(user_id)
                    .await
                    .map_err(infra("Failed to look up assignee"))?
                    .ok_or_else(|| {
                        ServiceError::Validation(format!("User {user_id} does not exist"))
                    })?;
                Some(user.full_name)
            }
            None => None,
        };

        let changes = BugChanges {
            assigned_to_id: Some(assignee),
            assigned_to_name: Some(assignee_name),
            ..BugChanges::default()
        };

        self.apply(actor, id, EditOp::Assign, changes, None).await
    }

    async fn transition(&self, actor: &Actor, id: ObjectId, to: BugStatus) -> Result<Bug, ServiceError> {
        let bug = self.require(id).await?;

        let allowed = if to == BugStatus::Closed {
            actor.can_close_bug()
        } else {
            actor.can_edit_bug(bug.created_by_id, bug.assigned_to_id)
        };
        if !allowed {
            return Err(forbidden(if to == BugStatus::Closed { "close" } else { "edit" }));
        }

        let status = bug
            .status
            .transition_to(to)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let mut changes = BugChanges {
            status: Some(status),
            ..BugChanges::default()
        };
        if status == BugStatus::Closed {
            changes.closed_on = Some(Some(time::now()));
            changes.closed_by_id = Some(Some(actor.id));
            changes.closed_by_name = Some(Some(actor.full_name.clone()));
        } else if bug.status == BugStatus::Closed {
            changes.closed_on = Some(None);
            changes.closed_by_id = Some(None);
            changes.closed_by_name = Some(None);
        }

        let updated = self
            .apply(actor, id, EditOp::Transition, changes, Some(bug.status))
            .await?;
        info!(bug_id = %id, from = %bug.status, to = %status, "Bug status changed");
        Ok(updated)
    }

    async fn history(&self, id: ObjectId) -> Result<Vec<Edit>, ServiceError> {
        self.require(id).await?;
        self.audit.history(id).await
    }
}
