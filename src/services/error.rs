//! The closed set of failures every service operation can report.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Infrastructure {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

/// Logs a store failure and wraps it with a domain message.
///
/// ```ignore
/// store.users().get_by_id(id).await.map_err(infra("Failed to fetch user"))?;
/// ```
pub fn infra(message: &'static str) -> impl FnOnce(anyhow::Error) -> ServiceError {
    move |source| {
        tracing::error!(error = ?source, "{message}");
        ServiceError::Infrastructure {
            message: message.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_errors_keep_their_source() {
        let err = infra("Failed to list bugs")(anyhow::anyhow!("disk I/O error"));
        assert_eq!(err.to_string(), "Failed to list bugs");
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("disk I/O error".to_string())
        );
    }

    #[test]
    fn not_found_message() {
        assert_eq!(ServiceError::not_found("Bug").to_string(), "Bug not found");
    }
}
