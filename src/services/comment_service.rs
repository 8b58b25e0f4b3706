//! Domain service for bug comments.

use crate::domain::{Actor, ObjectId};
use crate::models::Comment;
use crate::services::ServiceError;

#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    /// Comments on a bug, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when the bug does not exist.
    async fn list_for_bug(&self, bug_id: ObjectId) -> Result<Vec<Comment>, ServiceError>;

    async fn get(&self, bug_id: ObjectId, comment_id: ObjectId) -> Result<Option<Comment>, ServiceError>;

    async fn add(&self, actor: &Actor, bug_id: ObjectId, content: String) -> Result<Comment, ServiceError>;
}
