//! Authorization for scheduler-triggered endpoints.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Header the deployment platform's scheduler attaches to cron
/// invocations; it is stripped from external traffic at the edge.
pub const SCHEDULED_INVOCATION_HEADER: &str = "x-scheduled-invocation";

/// A worker-trigger request is authorized by the scheduled-invocation
/// header or by presenting the shared worker secret. With no secret
/// configured, only scheduled invocations pass.
pub fn authorize_worker(headers: &HeaderMap, secret: Option<&str>) -> bool {
    if headers.contains_key(SCHEDULED_INVOCATION_HEADER) {
        return true;
    }

    let Some(secret) = secret else {
        return false;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == secret)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn scheduled_header_is_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert(SCHEDULED_INVOCATION_HEADER, HeaderValue::from_static("1"));
        assert!(authorize_worker(&headers, None));
        assert!(authorize_worker(&headers, Some("s3cret")));
    }

    #[test]
    fn bearer_secret_must_match() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(authorize_worker(&headers, Some("s3cret")));
        assert!(!authorize_worker(&headers, Some("other")));
        assert!(!authorize_worker(&headers, None));
    }

    #[test]
    fn unauthenticated_requests_are_rejected() {
        let headers = HeaderMap::new();
        assert!(!authorize_worker(&headers, Some("s3cret")));
        assert!(!authorize_worker(&headers, None));
    }
}
