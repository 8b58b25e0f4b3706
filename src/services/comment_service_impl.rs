//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::domain::events::{Collection, EditEvent, EditOp};
use crate::domain::{Actor, ObjectId, Permission, time};
use crate::models::Comment;
use crate::services::comment_service::CommentService;
use crate::services::error::infra;
use crate::services::ServiceError;

pub struct SeaOrmCommentService {
    store: Store,
}

impl SeaOrmCommentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn require_bug(&self, bug_id: ObjectId) -> Result<(), ServiceError> {
        self.store
            .bugs()
            .get(bug_id)
            .await
            .map_err(infra("Failed to fetch bug"))?
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("Bug"))
    }
}

#[async_trait]
impl CommentService for SeaOrmCommentService {
    async fn list_for_bug(&self, bug_id: ObjectId) -> Result<Vec<Comment>, ServiceError> {
        self.require_bug(bug_id).await?;
        self.store
            .comments()
            .list_for_bug(bug_id)
            .await
            .map_err(infra("Failed to list comments"))
    }

    async fn get(&self, bug_id: ObjectId, comment_id: ObjectId) -> Result<Option<Comment>, ServiceError> {
        self.store
            .comments()
            .get(bug_id, comment_id)
            .await
            .map_err(infra("Failed to fetch comment"))
    }

    async fn add(&self, actor: &Actor, bug_id: ObjectId, content: String) -> Result<Comment, ServiceError> {
        if !actor.has(Permission::CanAddComments) {
            return Err(ServiceError::Forbidden(
                "You are not allowed to comment".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(ServiceError::Validation("content is required".to_string()));
        }
        self.require_bug(bug_id).await?;

        let comment = Comment {
            id: ObjectId::new(),
            bug_id,
            author_id: actor.id,
            author_name: actor.full_name.clone(),
            content,
            created_on: time::now(),
        };
        let event = EditEvent::new(Collection::Comment, EditOp::Insert, comment.id)
            .with_changes(serde_json::json!({
                "bugId": comment.bug_id,
                "content": comment.content,
            }))
            .by(actor.id);

        self.store
            .comments()
            .insert(comment, &event)
            .await
            .map_err(infra("Failed to add comment"))
    }
}
