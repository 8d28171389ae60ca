use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::state::AppState;

/// Reject requests that do not carry the admin bearer token.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = bearer_token(request.headers().get(header::AUTHORIZATION))
        .is_some_and(|token| token_matches(token, &state.admin_token));

    if !authorized {
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

fn bearer_token(header: Option<&HeaderValue>) -> Option<&str> {
    let raw = header?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn token_matches(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let value = HeaderValue::from_static("Bearer abc123");
        assert_eq!(bearer_token(Some(&value)), Some("abc123"));
        assert_eq!(bearer_token(Some(&HeaderValue::from_static("Basic abc"))), None);
        assert_eq!(bearer_token(Some(&HeaderValue::from_static("Bearer  "))), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("secret", "secret"));
        assert!(!token_matches("secret", "secreT"));
        assert!(!token_matches("secret", "secret-longer"));
    }
}
