pub mod audit;
pub mod error;
pub mod token;

pub use error::ServiceError;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthService, Session};
pub use auth_service_impl::SeaOrmAuthService;

pub mod role_service;
pub mod role_service_impl;
pub use role_service::RoleService;
pub use role_service_impl::SeaOrmRoleService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{Registration, UserService, UserUpdate};
pub use user_service_impl::SeaOrmUserService;

pub mod bug_service;
pub mod bug_service_impl;
pub use bug_service::{BugEdit, BugReport, BugService};
pub use bug_service_impl::SeaOrmBugService;

pub mod comment_service;
pub mod comment_service_impl;
pub use comment_service::CommentService;
pub use comment_service_impl::SeaOrmCommentService;
