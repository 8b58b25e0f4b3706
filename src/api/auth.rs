use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;

use super::validation::{LoginRequest, RegisterRequest, ValidatedJson, present};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::{Actor, Permission, UserRole};
use crate::services::{Registration, Session};

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE: &str = "authToken";

const NOT_LOGGED_IN: &str = "You must be logged in";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: Actor,
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller from the session cookie or an `Authorization: Bearer` header.
///
/// Requests without a token pass through anonymously and are turned away by the
/// gates below; a token that fails verification is rejected outright.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(&jar, &headers) {
        let actor = state.auth_service().authenticate(&token)?;
        tracing::Span::current().record("user_id", tracing::field::display(actor.id));
        request.extensions_mut().insert(actor);
    }

    Ok(next.run(request).await)
}

fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(AUTH_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// Admits only callers holding one of the given roles.
pub async fn require_role(
    State(roles): State<&'static [UserRole]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = request
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.to_string()))?;

    if !actor.has_any_role(roles) {
        let names: Vec<&str> = roles.iter().map(UserRole::as_str).collect();
        return Err(ApiError::Forbidden(format!(
            "This action requires one of the roles: {}",
            names.join(", ")
        )));
    }

    Ok(next.run(request).await)
}

/// Admits only callers whose resolved permission set contains `permission`.
pub async fn require_permission(
    State(permission): State<Permission>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = request
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.to_string()))?;

    if !actor.has(permission) {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.to_string()))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let email = present(payload.email, "email")?;
    let password = present(payload.password, "password")?;

    let session = state.auth_service().login(&email, &password).await?;
    tracing::info!(user_id = %session.actor.id, "User logged in");

    Ok(start_session(&state, jar, session))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let registration = Registration {
        email: present(payload.email, "email")?,
        password: present(payload.password, "password")?,
        given_name: present(payload.given_name, "givenName")?,
        family_name: present(payload.family_name, "familyName")?,
    };

    let session = state.auth_service().register(registration).await?;

    Ok(start_session(&state, jar, session))
}

/// POST /auth/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));
    (
        jar,
        Json(ApiResponse::success(MessageResponse {
            message: "Logged out".to_string(),
        })),
    )
}

/// GET /auth/me
pub async fn me(actor: Actor) -> Json<ApiResponse<Actor>> {
    Json(ApiResponse::success(actor))
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    session: Session,
) -> (CookieJar, Json<ApiResponse<SessionResponse>>) {
    let max_age = time::Duration::seconds(session.ttl.num_seconds());
    let cookie = Cookie::build((AUTH_COOKIE, session.token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config().server.secure_cookies)
        .path("/")
        .max_age(max_age);

    (
        jar.add(cookie),
        Json(ApiResponse::success(SessionResponse {
            user: session.actor,
            token: session.token,
            expires_in: session.ttl.num_seconds(),
        })),
    )
}
