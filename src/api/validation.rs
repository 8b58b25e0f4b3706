//! Request body schemas and the extractor that enforces them.
//!
//! Required fields are declared as `Option` and checked with `required` so a
//! body missing several fields reports all of them at once. Unknown fields are
//! dropped by serde.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{ApiError, FieldError};
use crate::domain::{BugClassification, BugStatus, ObjectId, UserRole};

/// A request body that can be normalised and then validated.
pub trait Schema: DeserializeOwned + Validate {
    /// Runs before validation; trims and canonicalises input.
    fn sanitize(&mut self) {}
}

/// JSON body that has been sanitised and validated.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Schema + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejected_body)?;

        value.sanitize();
        value
            .validate()
            .map_err(|errors| ApiError::InvalidFields(field_errors(&errors)))?;

        Ok(Self(value))
    }
}

fn rejected_body(rejection: JsonRejection) -> ApiError {
    let kind = match rejection {
        JsonRejection::MissingJsonContentType(_) => "contentType",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::JsonDataError(_) => "type",
        _ => "body",
    };

    ApiError::InvalidFields(vec![FieldError {
        message: rejection.body_text(),
        path: String::new(),
        kind: kind.to_string(),
    }])
}

/// Flattens validator output into `{message, path, type}` entries ordered by path.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            let path = camel_case(&field);
            errors.iter().map(move |error| FieldError {
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| format!("{path} is invalid"), ToString::to_string),
                path: path.clone(),
                kind: error.code.to_string(),
            })
        })
        .collect()
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn trim(value: &mut Option<String>) {
    if let Some(inner) = value {
        let trimmed = inner.trim();
        if trimmed.len() != inner.len() {
            *inner = trimmed.to_string();
        }
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_role(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<UserRole>()
        .map(|_| ())
        .map_err(|e| invalid("role", e))
}

fn validate_classification(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<BugClassification>()
        .map(|_| ())
        .map_err(|e| invalid("classification", e))
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<BugStatus>()
        .map(|_| ())
        .map_err(|e| invalid("status", e))
}

fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    ObjectId::parse_str(value)
        .map(|_| ())
        .map_err(|_| invalid("objectId", format!("{value} is not a valid ObjectId")))
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(required(message = "email is required"))]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(required(message = "password is required"))]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: Option<String>,
}

impl Schema for LoginRequest {
    fn sanitize(&mut self) {
        trim(&mut self.email);
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(required(message = "email is required"))]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(required(message = "password is required"))]
    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: Option<String>,

    #[validate(required(message = "givenName is required"))]
    #[validate(length(min = 1, max = 50, message = "givenName must be 1 to 50 characters"))]
    pub given_name: Option<String>,

    #[validate(required(message = "familyName is required"))]
    #[validate(length(min = 1, max = 50, message = "familyName must be 1 to 50 characters"))]
    pub family_name: Option<String>,
}

impl Schema for RegisterRequest {
    fn sanitize(&mut self) {
        trim(&mut self.email);
        trim(&mut self.given_name);
        trim(&mut self.family_name);
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: Option<String>,

    #[validate(length(min = 1, max = 50, message = "givenName must be 1 to 50 characters"))]
    pub given_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "familyName must be 1 to 50 characters"))]
    pub family_name: Option<String>,

    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
}

impl Schema for UpdateUserRequest {
    fn sanitize(&mut self) {
        trim(&mut self.email);
        trim(&mut self.given_name);
        trim(&mut self.family_name);
        trim(&mut self.role);
    }
}

// ============================================================================
// Bugs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugRequest {
    #[validate(required(message = "title is required"))]
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[validate(required(message = "description is required"))]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(required(message = "stepsToReproduce is required"))]
    #[validate(length(max = 5000, message = "stepsToReproduce must be at most 5000 characters"))]
    pub steps_to_reproduce: Option<String>,
}

impl Schema for CreateBugRequest {
    fn sanitize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.description);
        trim(&mut self.steps_to_reproduce);
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBugRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 5000, message = "stepsToReproduce must be at most 5000 characters"))]
    pub steps_to_reproduce: Option<String>,
}

impl Schema for UpdateBugRequest {
    fn sanitize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.description);
        trim(&mut self.steps_to_reproduce);
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyBugRequest {
    #[validate(required(message = "classification is required"))]
    #[validate(custom(function = "validate_classification"))]
    pub classification: Option<String>,
}

impl Schema for ClassifyBugRequest {
    fn sanitize(&mut self) {
        trim(&mut self.classification);
    }
}

/// `assignedToId` absent or null unassigns the bug.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignBugRequest {
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to_id: Option<String>,
}

impl Schema for AssignBugRequest {
    fn sanitize(&mut self) {
        trim(&mut self.assigned_to_id);
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BugStatusRequest {
    #[validate(required(message = "status is required"))]
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
}

impl Schema for BugStatusRequest {
    fn sanitize(&mut self) {
        trim(&mut self.status);
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[validate(required(message = "content is required"))]
    #[validate(length(min = 1, max = 5000, message = "content must be 1 to 5000 characters"))]
    pub content: Option<String>,
}

impl Schema for CommentRequest {
    fn sanitize(&mut self) {
        trim(&mut self.content);
    }
}

/// Unwraps a field that validation has already proven present.
pub fn present<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of<T: Schema>(json: &str) -> Vec<FieldError> {
        let mut value: T = serde_json::from_str(json).unwrap();
        value.sanitize();
        value
            .validate()
            .map_or_else(|e| field_errors(&e), |()| Vec::new())
    }

    fn paths(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn every_missing_field_is_reported() {
        let errors = errors_of::<RegisterRequest>(r#"{"email": "ada@example.com"}"#);
        assert_eq!(paths(&errors), vec!["familyName", "givenName", "password"]);
        assert!(errors.iter().all(|e| e.kind == "required"));
        assert_eq!(errors[1].message, "givenName is required");
    }

    #[test]
    fn valid_registration_passes_and_is_trimmed() {
        let mut value: RegisterRequest = serde_json::from_str(
            r#"{"email": " ada@example.com ", "password": "correct horse",
                "givenName": " Ada ", "familyName": "Lovelace", "isAdmin": true}"#,
        )
        .unwrap();
        value.sanitize();
        assert!(value.validate().is_ok());
        assert_eq!(value.email.as_deref(), Some("ada@example.com"));
        assert_eq!(value.given_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn blank_title_fails_length() {
        let errors = errors_of::<CreateBugRequest>(
            r#"{"title": "   ", "description": "", "stepsToReproduce": ""}"#,
        );
        assert_eq!(paths(&errors), vec!["title"]);
        assert_eq!(errors[0].kind, "length");
    }

    #[test]
    fn enumerations_are_checked() {
        let errors = errors_of::<BugStatusRequest>(r#"{"status": "done"}"#);
        assert_eq!(paths(&errors), vec!["status"]);
        assert_eq!(errors[0].message, "Unknown bug status: done");

        assert!(errors_of::<BugStatusRequest>(r#"{"status": "inProgress"}"#).is_empty());
        assert!(errors_of::<UpdateUserRequest>(r#"{"role": "Developer"}"#).is_empty());
        assert_eq!(
            paths(&errors_of::<UpdateUserRequest>(r#"{"role": "Admin"}"#)),
            vec!["role"]
        );
    }

    #[test]
    fn assignment_requires_a_well_formed_id() {
        assert!(errors_of::<AssignBugRequest>(r#"{"assignedToId": null}"#).is_empty());
        let errors = errors_of::<AssignBugRequest>(r#"{"assignedToId": "xyz"}"#);
        assert_eq!(paths(&errors), vec!["assignedToId"]);
        assert_eq!(errors[0].message, "xyz is not a valid ObjectId");
    }

    #[test]
    fn camel_case_paths() {
        assert_eq!(camel_case("steps_to_reproduce"), "stepsToReproduce");
        assert_eq!(camel_case("email"), "email");
    }
}
