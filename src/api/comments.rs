use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::{CommentRequest, ValidatedJson, present};
use super::{ApiError, ApiResponse, AppState};
use crate::domain::{Actor, ObjectId};
use crate::models::Comment;

/// GET /bugs/{bugId}/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(bug_id): Path<ObjectId>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = state.comment_service().list_for_bug(bug_id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// GET /bugs/{bugId}/comments/{commentId}
pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path((bug_id, comment_id)): Path<(ObjectId, ObjectId)>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let comment = state
        .comment_service()
        .get(bug_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment", comment_id))?;

    Ok(Json(ApiResponse::success(comment)))
}

/// POST /bugs/{bugId}/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(bug_id): Path<ObjectId>,
    ValidatedJson(payload): ValidatedJson<CommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let content = present(payload.content, "content")?;
    let comment = state.comment_service().add(&actor, bug_id, content).await?;
    Ok(Json(ApiResponse::success(comment)))
}
