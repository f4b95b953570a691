//! API key check for device posts.
//!
//! Devices send the key either as `x-api-key: <key>` or as
//! `Authorization: Bearer <key>`. Comparison is constant time.

use super::error::ApiError;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The key presented by the request, if any.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        return value.to_str().ok();
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Accept the request when no key is configured, or when the presented
/// key matches the configured one.
pub fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let Some(presented) = presented_key(headers) else {
        tracing::warn!("sensor post without api key");
        return Err(ApiError::Unauthorized);
    };
    if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        tracing::warn!("sensor post with wrong api key");
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(name, HeaderValue::from_static(value));
        map
    }

    #[test]
    fn open_when_no_key_configured() {
        assert!(authorize(&HeaderMap::new(), None).is_ok());
    }

    #[test]
    fn missing_key_rejected() {
        assert!(matches!(
            authorize(&HeaderMap::new(), Some("k")),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn both_header_styles_accepted() {
        assert!(authorize(&headers("x-api-key", "s3cret"), Some("s3cret")).is_ok());
        assert!(authorize(&headers("authorization", "Bearer s3cret"), Some("s3cret")).is_ok());
    }

    #[test]
    fn wrong_or_prefix_key_rejected() {
        assert!(authorize(&headers("x-api-key", "s3cre"), Some("s3cret")).is_err());
        assert!(authorize(&headers("authorization", "s3cret"), Some("s3cret")).is_err());
    }
}
