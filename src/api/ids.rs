use axum::{
    extract::{RawPathParams, Request, rejection::RawPathParamsRejection},
    middleware::Next,
    response::Response,
};

use super::ApiError;
use crate::domain::ObjectId;

/// Rejects the request when any path parameter named `*Id` is not a
/// well-formed identifier, before a handler or store is touched.
pub async fn validate_path_ids(
    params: Result<RawPathParams, RawPathParamsRejection>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Ok(params) = params
        && let Some(name) = first_invalid(params.iter())
    {
        return Err(ApiError::InvalidId(name));
    }

    Ok(next.run(request).await)
}

fn first_invalid<'a>(mut params: impl Iterator<Item = (&'a str, &'a str)>) -> Option<String> {
    params
        .find(|(name, value)| name.ends_with("Id") && ObjectId::parse_str(value).is_err())
        .map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::first_invalid;

    const VALID: &str = "65f0c0ffee0000000000abcd";

    #[test]
    fn only_id_parameters_are_checked() {
        assert_eq!(first_invalid([("bugId", VALID)].into_iter()), None);
        assert_eq!(first_invalid([("slug", "anything")].into_iter()), None);
        assert_eq!(
            first_invalid([("bugId", VALID), ("commentId", "42")].into_iter()),
            Some("commentId".to_string())
        );
        assert_eq!(
            first_invalid([("userId", "")].into_iter()),
            Some("userId".to_string())
        );
    }
}
