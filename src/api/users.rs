use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{UpdateUserRequest, ValidatedJson};
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserListResponse};
use crate::domain::query::{UserListParams, UserQuery};
use crate::domain::{Actor, ObjectId, UserRole};
use crate::models::User;
use crate::services::UserUpdate;

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<UserListResponse>>, ApiError> {
    let query = UserQuery::from_params(params, chrono::Utc::now());
    let page = state.user_service().list(&query).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

/// GET /users/{userId}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<ObjectId>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .user_service()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    Ok(Json(ApiResponse::success(user)))
}

/// PATCH /users/{userId}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(user_id): Path<ObjectId>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let role = payload
        .role
        .as_deref()
        .map(str::parse::<UserRole>)
        .transpose()
        .map_err(ApiError::validation)?;

    let update = UserUpdate {
        email: payload.email,
        password: payload.password,
        given_name: payload.given_name,
        family_name: payload.family_name,
        role,
    };

    let user = state.user_service().update(&actor, user_id, update).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{userId}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(user_id): Path<ObjectId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.user_service().delete(&actor, user_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("User {user_id} deleted"),
    })))
}
