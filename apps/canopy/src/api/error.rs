//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use canopy_core::CoreError;
use serde_json::json;

/// Errors returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    RateLimited,
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Internal(msg) => msg,
            ApiError::Unauthorized => "Unauthorized",
            ApiError::RateLimited => "Too many requests",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownSpecies(_) => ApiError::NotFound(err.to_string()),
            CoreError::InvalidSpecies { .. }
            | CoreError::NonFiniteSensor { .. }
            | CoreError::InvalidDeviceId(_) => ApiError::BadRequest(err.to_string()),
            CoreError::Storage(_) | CoreError::Encoding(_) => {
                tracing::error!(error = %err, "storage failure");
                ApiError::Internal("storage failure".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_statuses() {
        let not_found = ApiError::from(CoreError::UnknownSpecies("baobab".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert!(not_found.message().contains("baobab"));

        let bad = ApiError::from(CoreError::InvalidDeviceId("empty".into()));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(ApiError::Unauthorized.message(), "Unauthorized");
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
