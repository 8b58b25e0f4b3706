use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{edit, parse_id};
use crate::domain::ObjectId;
use crate::domain::events::EditEvent;
use crate::entities::{comments, prelude::*};
use crate::models::Comment;

impl TryFrom<comments::Model> for Comment {
    type Error = anyhow::Error;

    fn try_from(model: comments::Model) -> Result<Self> {
        Ok(Self {
            id: parse_id(&model.id)?,
            bug_id: parse_id(&model.bug_id)?,
            author_id: parse_id(&model.author_id)?,
            author_name: model.author_name,
            content: model.content,
            created_on: model.created_on,
        })
    }
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Comments on a bug, oldest first.
    pub async fn list_for_bug(&self, bug_id: ObjectId) -> Result<Vec<Comment>> {
        Comments::find()
            .filter(comments::Column::BugId.eq(bug_id.to_hex()))
            .order_by_asc(comments::Column::CreatedOn)
            .order_by_asc(comments::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?
            .into_iter()
            .map(Comment::try_from)
            .collect()
    }

    pub async fn get(&self, bug_id: ObjectId, comment_id: ObjectId) -> Result<Option<Comment>> {
        let comment = Comments::find_by_id(comment_id.to_hex())
            .filter(comments::Column::BugId.eq(bug_id.to_hex()))
            .one(&self.conn)
            .await
            .context("Failed to query comment")?;

        comment.map(Comment::try_from).transpose()
    }

    pub async fn insert(&self, comment: Comment, event: &EditEvent) -> Result<Comment> {
        let model = comments::ActiveModel {
            id: Set(comment.id.to_hex()),
            bug_id: Set(comment.bug_id.to_hex()),
            author_id: Set(comment.author_id.to_hex()),
            author_name: Set(comment.author_name.clone()),
            content: Set(comment.content.clone()),
            created_on: Set(comment.created_on.clone()),
        };

        let txn = self.conn.begin().await?;

        Comments::insert(model)
            .exec_without_returning(&txn)
            .await
            .context("Failed to insert comment")?;

        edit::append(&txn, event).await?;
        txn.commit().await?;

        Ok(comment)
    }
}
