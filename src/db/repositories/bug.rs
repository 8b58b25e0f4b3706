use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use super::{contains_pattern, edit, fold, folded_contains, order, parse_id, parse_optional_id};
use crate::domain::events::EditEvent;
use crate::domain::query::{BugQuery, BugSortField, Page};
use crate::domain::time::format_timestamp;
use crate::domain::{BugClassification, BugStatus, ObjectId};
use crate::entities::{bugs, prelude::*};
use crate::models::{Bug, BugChanges, NewBug};

impl TryFrom<bugs::Model> for Bug {
    type Error = anyhow::Error;

    fn try_from(model: bugs::Model) -> Result<Self> {
        let unknown = |e: String| anyhow::anyhow!("Bug {}: {e}", model.id);

        Ok(Self {
            id: parse_id(&model.id)?,
            classification: model.classification.parse().map_err(unknown)?,
            status: model.status.parse().map_err(unknown)?,
            created_by_id: parse_id(&model.created_by_id)?,
            assigned_to_id: parse_optional_id(model.assigned_to_id)?,
            closed_by_id: parse_optional_id(model.closed_by_id)?,
            last_updated_by: parse_optional_id(model.last_updated_by)?,
            title: model.title,
            description: model.description,
            steps_to_reproduce: model.steps_to_reproduce,
            created_on: model.created_on,
            created_by_name: model.created_by_name,
            assigned_to_name: model.assigned_to_name,
            classified_on: model.classified_on,
            closed_on: model.closed_on,
            closed_by_name: model.closed_by_name,
            last_updated: model.last_updated,
        })
    }
}

/// Result of a bug update.
#[derive(Debug)]
pub enum BugWrite {
    Saved(Bug),
    NotFound,
    /// The status changed since the caller read it.
    StatusChanged,
}

pub struct BugRepository {
    conn: DatabaseConnection,
}

impl BugRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(&self, query: &BugQuery) -> Result<Page<Bug>> {
        let select = Self::filtered(query);

        let total = select
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count bugs")?;

        let models = Self::sorted(select, query)
            .offset(query.pagination.skip())
            .limit(query.pagination.page_size)
            .all(&self.conn)
            .await
            .context("Failed to list bugs")?;

        let items = models
            .into_iter()
            .map(Bug::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, total, query.pagination))
    }

    fn filtered(query: &BugQuery) -> Select<Bugs> {
        let mut select = Bugs::find();

        if let Some(keywords) = &query.keywords {
            let pattern = contains_pattern(keywords);
            select = select.filter(
                Condition::any()
                    .add(folded_contains(bugs::Column::TitleFolded, &pattern))
                    .add(folded_contains(bugs::Column::DescriptionFolded, &pattern))
                    .add(folded_contains(bugs::Column::StepsToReproduceFolded, &pattern)),
            );
        }

        if let Some(classification) = &query.classification {
            select = select.filter(bugs::Column::Classification.eq(classification.as_str()));
        }

        if let Some(status) = &query.status {
            select = select.filter(bugs::Column::Status.eq(status.as_str()));
        }

        if let Some(assigned_to) = &query.assigned_to {
            select = select.filter(bugs::Column::AssignedToId.eq(assigned_to.to_lowercase()));
        }

        if let Some(before) = query.age.created_on_or_before {
            select = select.filter(bugs::Column::CreatedOn.lte(format_timestamp(before)));
        }

        if let Some(after) = query.age.created_on_or_after {
            select = select.filter(bugs::Column::CreatedOn.gte(format_timestamp(after)));
        }

        select
    }

    fn sorted(mut select: Select<Bugs>, query: &BugQuery) -> Select<Bugs> {
        for (field, direction) in &query.sort {
            let column = match field {
                BugSortField::Title => bugs::Column::Title,
                BugSortField::Classification => bugs::Column::Classification,
                BugSortField::AssignedToName => bugs::Column::AssignedToName,
                BugSortField::CreatedByName => bugs::Column::CreatedByName,
                BugSortField::CreatedOn => bugs::Column::CreatedOn,
            };
            select = select.order_by(column, order(*direction));
        }
        select.order_by_asc(bugs::Column::Id)
    }

    pub async fn get(&self, id: ObjectId) -> Result<Option<Bug>> {
        let bug = Bugs::find_by_id(id.to_hex())
            .one(&self.conn)
            .await
            .context("Failed to query bug by ID")?;

        bug.map(Bug::try_from).transpose()
    }

    /// Inserts the bug and its audit entry in one transaction.
    pub async fn insert(&self, bug: NewBug, event: &EditEvent) -> Result<Bug> {
        let id = bug.id;
        let model = bugs::ActiveModel {
            id: Set(bug.id.to_hex()),
            title_folded: Set(fold(&bug.title)),
            description_folded: Set(fold(&bug.description)),
            steps_to_reproduce_folded: Set(fold(&bug.steps_to_reproduce)),
            title: Set(bug.title),
            description: Set(bug.description),
            steps_to_reproduce: Set(bug.steps_to_reproduce),
            classification: Set(BugClassification::default().as_str().to_string()),
            status: Set(BugStatus::default().as_str().to_string()),
            created_on: Set(bug.created_on),
            created_by_id: Set(bug.created_by_id.to_hex()),
            created_by_name: Set(bug.created_by_name),
            assigned_to_id: Set(None),
            assigned_to_name: Set(None),
            classified_on: Set(None),
            closed_on: Set(None),
            closed_by_id: Set(None),
            closed_by_name: Set(None),
            last_updated: Set(None),
            last_updated_by: Set(None),
        };

        let txn = self.conn.begin().await?;

        Bugs::insert(model)
            .exec_without_returning(&txn)
            .await
            .context("Failed to insert bug")?;

        edit::append(&txn, event).await?;

        let saved = Bugs::find_by_id(id.to_hex())
            .one(&txn)
            .await
            .context("Failed to read back inserted bug")?
            .ok_or_else(|| anyhow::anyhow!("Bug {id} vanished after insert"))?;

        txn.commit().await?;

        Bug::try_from(saved)
    }

    /// Applies a partial replacement, stamps the editor and records `event`,
    /// all in one transaction.
    ///
    /// With `expected_status` set the write only lands while the bug still
    /// has that status, so concurrent transitions cannot skip the state table.
    pub async fn update(
        &self,
        id: ObjectId,
        changes: &BugChanges,
        expected_status: Option<BugStatus>,
        now: &str,
        editor: ObjectId,
        event: &EditEvent,
    ) -> Result<BugWrite> {
        let hex = |value: &Option<ObjectId>| value.map(|id| id.to_hex());

        let mut active = bugs::ActiveModel {
            last_updated: Set(Some(now.to_string())),
            last_updated_by: Set(Some(editor.to_hex())),
            ..Default::default()
        };
        if let Some(title) = &changes.title {
            active.title_folded = Set(fold(title));
            active.title = Set(title.clone());
        }
        if let Some(description) = &changes.description {
            active.description_folded = Set(fold(description));
            active.description = Set(description.clone());
        }
        if let Some(steps) = &changes.steps_to_reproduce {
            active.steps_to_reproduce_folded = Set(fold(steps));
            active.steps_to_reproduce = Set(steps.clone());
        }
        if let Some(classification) = changes.classification {
            active.classification = Set(classification.as_str().to_string());
        }
        if let Some(classified_on) = &changes.classified_on {
            active.classified_on = Set(Some(classified_on.clone()));
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(assigned_to_id) = &changes.assigned_to_id {
            active.assigned_to_id = Set(hex(assigned_to_id));
        }
        if let Some(assigned_to_name) = &changes.assigned_to_name {
            active.assigned_to_name = Set(assigned_to_name.clone());
        }
        if let Some(closed_on) = &changes.closed_on {
            active.closed_on = Set(closed_on.clone());
        }
        if let Some(closed_by_id) = &changes.closed_by_id {
            active.closed_by_id = Set(hex(closed_by_id));
        }
        if let Some(closed_by_name) = &changes.closed_by_name {
            active.closed_by_name = Set(closed_by_name.clone());
        }

        let mut update = Bugs::update_many()
            .set(active)
            .filter(bugs::Column::Id.eq(id.to_hex()));
        if let Some(status) = expected_status {
            update = update.filter(bugs::Column::Status.eq(status.as_str()));
        }

        let txn = self.conn.begin().await?;

        let result = update.exec(&txn).await.context("Failed to update bug")?;

        if result.rows_affected == 0 {
            let exists = Bugs::find_by_id(id.to_hex())
                .one(&txn)
                .await
                .context("Failed to query bug after update")?
                .is_some();
            return Ok(if exists {
                BugWrite::StatusChanged
            } else {
                BugWrite::NotFound
            });
        }

        edit::append(&txn, event).await?;

        let saved = Bugs::find_by_id(id.to_hex())
            .one(&txn)
            .await
            .context("Failed to read back updated bug")?;

        txn.commit().await?;

        Ok(match saved {
            Some(model) => BugWrite::Saved(Bug::try_from(model)?),
            None => BugWrite::NotFound,
        })
    }
}
