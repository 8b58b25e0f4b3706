use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{parse_id, parse_optional_id};
use crate::domain::events::EditEvent;
use crate::domain::{ObjectId, time};
use crate::entities::{edits, prelude::*};
use crate::models::Edit;

impl TryFrom<edits::Model> for Edit {
    type Error = anyhow::Error;

    fn try_from(model: edits::Model) -> Result<Self> {
        Ok(Self {
            id: parse_id(&model.id)?,
            target_id: parse_id(&model.target_id)?,
            auth_user_id: parse_optional_id(model.auth_user_id)?,
            changes: serde_json::from_str(&model.changes)
                .with_context(|| format!("Edit {} has corrupt changes", model.id))?,
            timestamp: model.timestamp,
            collection: model.collection,
            op: model.op,
        })
    }
}

/// Appends one audit entry on `db`.
///
/// Writers pass the transaction that carries the mutation itself, so the
/// entry and the change it describes commit or roll back together.
pub(crate) async fn append<C: ConnectionTrait>(db: &C, event: &EditEvent) -> Result<ObjectId> {
    tracing::debug!(
        collection = event.collection.as_str(),
        op = %event.op,
        target = %event.target_id,
        "Recording edit"
    );

    let id = ObjectId::new();
    let model = edits::ActiveModel {
        id: Set(id.to_hex()),
        timestamp: Set(time::now()),
        collection: Set(event.collection.as_str().to_string()),
        op: Set(event.op.as_str().to_string()),
        target_id: Set(event.target_id.to_hex()),
        changes: Set(event.changes.to_string()),
        auth_user_id: Set(event.auth_user_id.map(|id| id.to_hex())),
    };

    Edits::insert(model)
        .exec_without_returning(db)
        .await
        .context("Failed to append audit entry")?;

    Ok(id)
}

/// Read access to the audit log.
pub struct EditRepository {
    conn: DatabaseConnection,
}

impl EditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every entry recorded against a document, oldest first.
    pub async fn history(&self, target_id: ObjectId) -> Result<Vec<Edit>> {
        Edits::find()
            .filter(edits::Column::TargetId.eq(target_id.to_hex()))
            .order_by_asc(edits::Column::Timestamp)
            .order_by_asc(edits::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to read audit history")?
            .into_iter()
            .map(Edit::try_from)
            .collect()
    }
}
