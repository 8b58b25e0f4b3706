use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::domain::{Permission, UserRole};
use crate::services::{AuthService, BugService, CommentService, UserService};
use crate::state::SharedState;

mod assets;
pub mod auth;
mod bugs;
mod comments;
mod error;
mod ids;
mod observability;
mod system;
mod types;
pub mod users;
pub mod validation;

pub use error::ApiError;
pub use types::*;

/// Roles allowed to delete accounts.
const ACCOUNT_ADMINS: &[UserRole] = &[UserRole::TechnicalManager];

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn bug_service(&self) -> &Arc<dyn BugService> {
        &self.shared.bug_service
    }

    #[must_use]
    pub fn comment_service(&self) -> &Arc<dyn CommentService> {
        &self.shared.comment_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .fallback(api_not_found)
        .with_state(state.clone());

    Router::new()
        .nest("/api", api_router)
        .fallback(assets::serve_asset)
        .layer(cors_layer(&state.config().server.cors_allowed_origins))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
        AllowOrigin::list(origins)
    };

    // Credentialed requests need explicit methods and headers
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/metrics", get(observability::get_metrics))
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let readers = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{userId}", get(users::get_user))
        .route("/bugs", get(bugs::list_bugs))
        .route("/bugs/{bugId}", get(bugs::get_bug))
        .route("/bugs/{bugId}/history", get(bugs::bug_history))
        .route("/bugs/{bugId}/comments", get(comments::list_comments))
        .route(
            "/bugs/{bugId}/comments/{commentId}",
            get(comments::get_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            Permission::CanViewData,
            auth::require_permission,
        ));

    let commenters = Router::new()
        .route("/bugs/{bugId}/comments", post(comments::add_comment))
        .route_layer(middleware::from_fn_with_state(
            Permission::CanAddComments,
            auth::require_permission,
        ));

    let admins = Router::new()
        .route("/users/{userId}", delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(
            ACCOUNT_ADMINS,
            auth::require_role,
        ));

    // Finer rules depend on the target document and live in the services
    let members = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users/{userId}", patch(users::update_user))
        .route("/bugs", post(bugs::create_bug))
        .route("/bugs/{bugId}", patch(bugs::update_bug))
        .route("/bugs/{bugId}/classify", patch(bugs::classify_bug))
        .route("/bugs/{bugId}/assign", patch(bugs::assign_bug))
        .route("/bugs/{bugId}/status", patch(bugs::change_status))
        .route("/bugs/{bugId}/close", patch(bugs::close_bug));

    Router::new()
        .merge(readers)
        .merge(commenters)
        .merge(admins)
        .merge(members)
        .route_layer(middleware::from_fn(ids::validate_path_ids))
        .route_layer(middleware::from_fn_with_state(state, auth::authenticate))
}
