//! PSK-based authentication module.
//!
//! Reads are public so view-only clients can follow the roster; anything that
//! changes it needs the admin key. A key that is sent but wrong is rejected on
//! every route, so a client holding a revoked key finds out on its next poll.
//! Keys are compared in constant time.

use axum::{
    extract::Request,
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};
use crate::models::Role;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Outcome of checking a request's key against the configured PSK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    /// No PSK configured (dev mode); everything is allowed
    Open,
    Missing,
    Valid,
    Invalid,
}

/// Key from `x-api-key`, else from `Authorization: Bearer`.
pub fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

pub fn check_key(headers: &HeaderMap, expected_psk: Option<&str>) -> KeyCheck {
    let Some(expected) = expected_psk else {
        return KeyCheck::Open;
    };

    match provided_key(headers) {
        Some(provided) if constant_time_compare(provided, expected) => KeyCheck::Valid,
        Some(_) => KeyCheck::Invalid,
        None => KeyCheck::Missing,
    }
}

/// Role granted to a request: admin with the key, viewer without one.
/// A wrong key is rejected rather than downgraded.
pub fn resolve_role(headers: &HeaderMap, expected_psk: Option<&str>) -> Result<Role, AppError> {
    match check_key(headers, expected_psk) {
        KeyCheck::Open | KeyCheck::Valid => Ok(Role::Admin),
        KeyCheck::Missing => Ok(Role::Viewer),
        KeyCheck::Invalid => Err(AppError::Unauthorized("Invalid API key".to_string())),
    }
}

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    match check_key(request.headers(), expected_psk.as_deref()) {
        KeyCheck::Open | KeyCheck::Valid => next.run(request).await,
        KeyCheck::Invalid => unauthorized_response("Invalid API key"),
        KeyCheck::Missing if is_read(request.method()) => next.run(request).await,
        KeyCheck::Missing => unauthorized_response("Missing or invalid API key"),
    }
}

fn is_read(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
        },
        revision_id: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
        assert!(!constant_time_compare("short", "much-longer-key"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_bearer_token_is_accepted() {
        let headers = headers("authorization", "Bearer secret");
        assert_eq!(provided_key(&headers), Some("secret"));
        assert_eq!(check_key(&headers, Some("secret")), KeyCheck::Valid);
    }

    #[test]
    fn test_resolve_role() {
        let none = HeaderMap::new();
        assert_eq!(resolve_role(&none, Some("secret")).unwrap(), Role::Viewer);
        assert_eq!(resolve_role(&none, None).unwrap(), Role::Admin);

        let good = headers(API_KEY_HEADER, "secret");
        assert_eq!(resolve_role(&good, Some("secret")).unwrap(), Role::Admin);

        let bad = headers(API_KEY_HEADER, "guess");
        assert!(matches!(
            resolve_role(&bad, Some("secret")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
