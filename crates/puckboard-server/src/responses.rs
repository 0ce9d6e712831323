// crates/puckboard-server/src/responses.rs
// ============================================================================
// Module: Response Mapping
// Description: Error envelope and conditional-GET response helpers.
// Purpose: Keep HTTP mapping of errors and cache headers in one place.
// Dependencies: axum, puckboard-cache, puckboard-core
// ============================================================================

//! ## Overview
//! [`error_response`] renders the `{success:false, error, error_code?,
//! processing_time_ms, ts}` envelope, attaching the `WWW-Authenticate:
//! Bearer` challenge to every `unauthorized`. [`cached_json_response`] runs
//! the conditional-GET evaluation (sanitize, hash, compare) and renders
//! either `304` or `200` with `ETag` and `Cache-Control` headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use puckboard_cache::ConditionalOutcome;
use puckboard_cache::evaluate_conditional;
use puckboard_core::ApiError;
use puckboard_core::ErrorBody;
use puckboard_core::ErrorKind;
use serde_json::Value;

// ============================================================================
// SECTION: Error Responses
// ============================================================================

/// Renders an [`ApiError`] as its wire envelope.
#[must_use]
pub fn error_response(error: &ApiError, processing_time_ms: u64) -> Response {
    let status =
        StatusCode::from_u16(error.kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody::from_error(error, processing_time_ms);
    let mut response = (status, Json(body)).into_response();
    if error.kind == ErrorKind::Unauthorized {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
}

// ============================================================================
// SECTION: Conditional Responses
// ============================================================================

/// Extracts the client's `If-None-Match` validator.
#[must_use]
pub fn if_none_match(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::IF_NONE_MATCH).and_then(|value| value.to_str().ok())
}

/// Renders a payload with ETag/Cache-Control, honoring `If-None-Match`.
#[must_use]
pub fn cached_json_response(
    payload: Value,
    client_validator: Option<&str>,
    max_age_secs: u64,
    swr_secs: u64,
) -> Response {
    match evaluate_conditional(payload, client_validator, max_age_secs, swr_secs) {
        ConditionalOutcome::NotModified {
            headers,
        } => {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            apply_cache_headers(&mut response, &headers.etag, &headers.cache_control);
            response
        }
        ConditionalOutcome::Fresh {
            payload,
            headers,
        } => {
            let mut response = Json(payload).into_response();
            apply_cache_headers(&mut response, &headers.etag, &headers.cache_control);
            response
        }
    }
}

/// Applies `ETag` and `Cache-Control` headers when well-formed.
fn apply_cache_headers(response: &mut Response, etag: &str, cache_control: &str) {
    if !etag.is_empty()
        && let Ok(value) = HeaderValue::from_str(etag)
    {
        response.headers_mut().insert(header::ETAG, value);
    }
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use axum::http::StatusCode;
    use axum::http::header;
    use puckboard_core::ApiError;
    use serde_json::json;

    use super::cached_json_response;
    use super::error_response;

    #[test]
    fn unauthorized_responses_carry_the_bearer_challenge() {
        let response = error_response(&ApiError::unauthorized_missing(), 3);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).map(|v| v.to_str().unwrap()),
            Some("Bearer")
        );
    }

    #[test]
    fn other_errors_do_not_carry_the_challenge() {
        let response = error_response(&ApiError::not_found("clip"), 1);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn fresh_payload_gets_etag_and_cache_control() {
        let response = cached_json_response(json!({"data": [1, 2]}), None, 120, 600);
        assert_eq!(response.status(), StatusCode::OK);
        let etag = response.headers().get(header::ETAG).expect("etag").to_str().unwrap();
        assert_eq!(etag.len(), 64);
        let cache = response
            .headers()
            .get(header::CACHE_CONTROL)
            .expect("cache-control")
            .to_str()
            .unwrap();
        assert_eq!(cache, "public, max-age=120, stale-while-revalidate=600");
    }

    #[test]
    fn matching_validator_returns_304() {
        let first = cached_json_response(json!({"data": [1, 2]}), None, 120, 600);
        let etag =
            first.headers().get(header::ETAG).expect("etag").to_str().unwrap().to_string();
        let second = cached_json_response(json!({"data": [1, 2]}), Some(&etag), 120, 600);
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert!(second.headers().get(header::ETAG).is_some());
    }
}
