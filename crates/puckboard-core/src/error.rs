// crates/puckboard-core/src/error.rs
// ============================================================================
// Module: Error Taxonomy
// Description: Stable error kinds and the wire error envelope.
// Purpose: Map every failure to one HTTP-visible kind in one place.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`ApiError`] carries a stable [`ErrorKind`], a human-readable message, and
//! an optional machine code (`bad_format`, `invalid_credentials`, ...). The
//! HTTP layer maps kinds to status codes; upstream and storage failures are
//! surfaced while per-tool failures inside the orchestrator are downgraded to
//! warnings by the caller, not here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// Stable error classification.
///
/// # Invariants
/// - Variants map 1:1 to HTTP status codes via [`ErrorKind::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated but not permitted.
    Forbidden,
    /// Resource does not exist (or is owned by someone else).
    NotFound,
    /// Malformed request input.
    BadRequest,
    /// State conflict.
    Conflict,
    /// Upstream timed out.
    GatewayTimeout,
    /// Upstream failed or returned garbage.
    BadGateway,
    /// Unexpected internal failure.
    Internal,
    /// Dependency not configured or temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::BadRequest => 400,
            Self::Conflict => 409,
            Self::GatewayTimeout => 504,
            Self::BadGateway => 502,
            Self::Internal => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::Conflict => "conflict",
            Self::GatewayTimeout => "gateway_timeout",
            Self::BadGateway => "bad_gateway",
            Self::Internal => "internal",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }
}

// ============================================================================
// SECTION: Api Error
// ============================================================================

/// Error surfaced to HTTP clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct ApiError {
    /// Stable classification.
    pub kind: ErrorKind,
    /// Human-readable message (already redacted).
    pub message: String,
    /// Optional machine-readable sub-code.
    pub code: Option<&'static str>,
}

impl ApiError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    /// Attaches a machine-readable sub-code.
    #[must_use]
    pub const fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Missing-credential failure.
    #[must_use]
    pub fn unauthorized_missing() -> Self {
        Self::new(ErrorKind::Unauthorized, "Missing credentials").with_code("missing")
    }

    /// Malformed-token failure.
    #[must_use]
    pub fn unauthorized_bad_format() -> Self {
        Self::new(ErrorKind::Unauthorized, "Invalid token format").with_code("bad_format")
    }

    /// Wrong-secret failure.
    #[must_use]
    pub fn unauthorized_invalid_credentials() -> Self {
        Self::new(ErrorKind::Unauthorized, "Invalid credentials").with_code("invalid_credentials")
    }

    /// Access-denied failure.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Missing-resource failure.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Malformed-input failure.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Upstream-failure wrapper preserving the remote status for logs.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadGateway, message)
    }

    /// Upstream-timeout wrapper.
    #[must_use]
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GatewayTimeout, message)
    }

    /// Internal failure with an operator-safe message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Dependency-unavailable failure.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

// ============================================================================
// SECTION: Wire Envelope
// ============================================================================

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false for errors.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
    /// Machine-readable sub-code when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Time spent before failing.
    pub processing_time_ms: u64,
    /// Envelope timestamp.
    pub ts: Timestamp,
}

impl ErrorBody {
    /// Builds the wire body for an [`ApiError`].
    #[must_use]
    pub fn from_error(error: &ApiError, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            error: error.message.clone(),
            error_code: error.code.map(str::to_string),
            processing_time_ms,
            ts: Timestamp::now(),
        }
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

    use super::ApiError;
    use super::ErrorBody;
    use super::ErrorKind;

    #[test]
    fn kinds_map_to_expected_status_codes() {
        assert_eq!(ErrorKind::Unauthorized.http_status(), 401);
        assert_eq!(ErrorKind::Forbidden.http_status(), 403);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::BadRequest.http_status(), 400);
        assert_eq!(ErrorKind::GatewayTimeout.http_status(), 504);
        assert_eq!(ErrorKind::BadGateway.http_status(), 502);
        assert_eq!(ErrorKind::ServiceUnavailable.http_status(), 503);
    }

    #[test]
    fn auth_constructors_attach_sub_codes() {
        assert_eq!(ApiError::unauthorized_missing().code, Some("missing"));
        assert_eq!(ApiError::unauthorized_bad_format().code, Some("bad_format"));
        assert_eq!(
            ApiError::unauthorized_invalid_credentials().code,
            Some("invalid_credentials")
        );
    }

    #[test]
    fn error_body_carries_the_contract_fields() {
        let error = ApiError::bad_request("window must be positive");
        let body = ErrorBody::from_error(&error, 7);
        assert!(!body.success);
        assert_eq!(body.error, "window must be positive");
        assert_eq!(body.processing_time_ms, 7);
        let value = serde_json::to_value(&body).expect("serialize");
        assert!(value.get("ts").is_some());
    }
}
