use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{
    AssignBugRequest, BugStatusRequest, ClassifyBugRequest, CreateBugRequest, UpdateBugRequest,
    ValidatedJson, present,
};
use super::{ApiError, ApiResponse, AppState, BugListResponse};
use crate::domain::query::{BugListParams, BugQuery};
use crate::domain::{Actor, BugClassification, BugStatus, ObjectId};
use crate::models::{Bug, Edit};
use crate::services::{BugEdit, BugReport};

/// GET /bugs
pub async fn list_bugs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BugListParams>,
) -> Result<Json<ApiResponse<BugListResponse>>, ApiError> {
    let query = BugQuery::from_params(params, chrono::Utc::now());
    let page = state.bug_service().list(&query).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

/// GET /bugs/{bugId}
pub async fn get_bug(
    State(state): State<Arc<AppState>>,
    Path(bug_id): Path<ObjectId>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let bug = state
        .bug_service()
        .get(bug_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bug", bug_id))?;

    Ok(Json(ApiResponse::success(bug)))
}

/// POST /bugs
pub async fn create_bug(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidatedJson(payload): ValidatedJson<CreateBugRequest>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let report = BugReport {
        title: present(payload.title, "title")?,
        description: present(payload.description, "description")?,
        steps_to_reproduce: present(payload.steps_to_reproduce, "stepsToReproduce")?,
    };

    let bug = state.bug_service().create(&actor, report).await?;
    tracing::info!(bug_id = %bug.id, "Bug reported");
    Ok(Json(ApiResponse::success(bug)))
}

/// PATCH /bugs/{bugId}
pub async fn update_bug(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(bug_id): Path<ObjectId>,
    ValidatedJson(payload): ValidatedJson<UpdateBugRequest>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let edit = BugEdit {
        title: payload.title,
        description: payload.description,
        steps_to_reproduce: payload.steps_to_reproduce,
    };

    let bug = state.bug_service().update(&actor, bug_id, edit).await?;
    Ok(Json(ApiResponse::success(bug)))
}

/// PATCH /bugs/{bugId}/classify
pub async fn classify_bug(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(bug_id): Path<ObjectId>,
    ValidatedJson(payload): ValidatedJson<ClassifyBugRequest>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let classification: BugClassification = present(payload.classification, "classification")?
        .parse()
        .map_err(ApiError::validation)?;

    let bug = state
        .bug_service()
        .classify(&actor, bug_id, classification)
        .await?;
    Ok(Json(ApiResponse::success(bug)))
}

/// PATCH /bugs/{bugId}/assign
///
/// A missing or null `assignedToId` unassigns the bug.
pub async fn assign_bug(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(bug_id): Path<ObjectId>,
    ValidatedJson(payload): ValidatedJson<AssignBugRequest>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let assignee = payload
        .assigned_to_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| ApiError::InvalidId("assignedToId".to_string()))?;

    let bug = state.bug_service().assign(&actor, bug_id, assignee).await?;
    Ok(Json(ApiResponse::success(bug)))
}

/// PATCH /bugs/{bugId}/status
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(bug_id): Path<ObjectId>,
    ValidatedJson(payload): ValidatedJson<BugStatusRequest>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let status: BugStatus = present(payload.status, "status")?
        .parse()
        .map_err(ApiError::validation)?;

    let bug = state.bug_service().transition(&actor, bug_id, status).await?;
    Ok(Json(ApiResponse::success(bug)))
}

/// PATCH /bugs/{bugId}/close
pub async fn close_bug(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(bug_id): Path<ObjectId>,
) -> Result<Json<ApiResponse<Bug>>, ApiError> {
    let bug = state.bug_service().close(&actor, bug_id).await?;
    tracing::info!(bug_id = %bug_id, "Bug closed");
    Ok(Json(ApiResponse::success(bug)))
}

/// GET /bugs/{bugId}/history
pub async fn bug_history(
    State(state): State<Arc<AppState>>,
    Path(bug_id): Path<ObjectId>,
) -> Result<Json<ApiResponse<Vec<Edit>>>, ApiError> {
    let edits = state.bug_service().history(bug_id).await?;
    Ok(Json(ApiResponse::success(edits)))
}
