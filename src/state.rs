use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, BugService, CommentService, RoleService, SeaOrmAuthService, SeaOrmBugService,
    SeaOrmCommentService, SeaOrmRoleService, SeaOrmUserService, UserService,
};

/// Configuration, the store handle and every domain service, built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub role_service: Arc<dyn RoleService>,

    pub auth_service: Arc<dyn AuthService>,

    pub bug_service: Arc<dyn BugService>,

    pub comment_service: Arc<dyn CommentService>,
}

impl SharedState {
    /// Connects to the store (applying migrations) and wires the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::connect(&config.database).await?;
        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        ));
        let role_service: Arc<dyn RoleService> = Arc::new(SeaOrmRoleService::new(store.clone()));
        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
            user_service.clone(),
            role_service.clone(),
        ));
        let bug_service: Arc<dyn BugService> = Arc::new(SeaOrmBugService::new(store.clone()));
        let comment_service: Arc<dyn CommentService> =
            Arc::new(SeaOrmCommentService::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            user_service,
            role_service,
            auth_service,
            bug_service,
            comment_service,
        }
    }
}
