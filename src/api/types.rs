use serde::Serialize;

use crate::domain::query::Page;
use crate::models::{Bug, User};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn invalid(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }
}

/// One schema violation in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    /// camelCase name of the offending field
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total_users: u64,
    pub total_pages: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl From<Page<User>> for UserListResponse {
    fn from(page: Page<User>) -> Self {
        Self {
            total_users: page.total,
            total_pages: page.total_pages,
            page_number: page.pagination.page_number,
            page_size: page.pagination.page_size,
            users: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugListResponse {
    pub bugs: Vec<Bug>,
    pub total_bugs: u64,
    pub total_pages: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl From<Page<Bug>> for BugListResponse {
    fn from(page: Page<Bug>) -> Self {
        Self {
            total_bugs: page.total,
            total_pages: page.total_pages,
            page_number: page.pagination.page_number,
            page_size: page.pagination.page_size,
            bugs: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
