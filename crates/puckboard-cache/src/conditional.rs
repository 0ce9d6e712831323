// crates/puckboard-cache/src/conditional.rs
// ============================================================================
// Module: Conditional GET
// Description: ETag evaluation for large deterministic payloads.
// Purpose: Decide 200-with-ETag versus 304 in one place.
// Dependencies: puckboard-core, serde_json
// ============================================================================

//! ## Overview
//! For large deterministic payloads the server computes a stable ETag
//! (canonical JSON, volatile fields stripped, NaN sanitized) and honors
//! `If-None-Match`. [`evaluate_conditional`] returns either the sanitized
//! payload with headers or a not-modified marker; handlers translate these
//! into `200`/`304` responses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use puckboard_core::hashing::etag_for_payload;
use puckboard_core::sanitize::sanitized;
use serde_json::Value;

// ============================================================================
// SECTION: Headers
// ============================================================================

/// Cache headers attached to conditional responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    /// Strong validator for the payload.
    pub etag: String,
    /// `Cache-Control` header value.
    pub cache_control: String,
}

impl CacheHeaders {
    /// Builds headers for a payload ETag and freshness policy.
    #[must_use]
    pub fn new(etag: String, max_age_secs: u64, swr_secs: u64) -> Self {
        Self {
            etag,
            cache_control: format!(
                "public, max-age={max_age_secs}, stale-while-revalidate={swr_secs}"
            ),
        }
    }
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of a conditional-GET evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalOutcome {
    /// Client validator matched; serve `304` with headers only.
    NotModified {
        /// Headers for the `304` response.
        headers: CacheHeaders,
    },
    /// Serve the sanitized payload with headers.
    Fresh {
        /// Sanitized payload body.
        payload: Value,
        /// Headers for the `200` response.
        headers: CacheHeaders,
    },
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a payload against an optional `If-None-Match` header.
///
/// The payload is sanitized (non-finite floats become null) before both
/// hashing and return, so the body a client receives always hashes to the
/// ETag it was served with. Hash failures degrade to an unconditional fresh
/// response without an ETag rather than failing the request.
#[must_use]
pub fn evaluate_conditional(
    payload: Value,
    if_none_match: Option<&str>,
    max_age_secs: u64,
    swr_secs: u64,
) -> ConditionalOutcome {
    let clean = sanitized(payload);
    let Ok(etag) = etag_for_payload(&clean) else {
        return ConditionalOutcome::Fresh {
            payload: clean,
            headers: CacheHeaders::new(String::new(), max_age_secs, swr_secs),
        };
    };
    let headers = CacheHeaders::new(etag, max_age_secs, swr_secs);
    let matched = if_none_match
        .map(|candidate| candidate.trim().trim_matches('"') == headers.etag)
        .unwrap_or(false);
    if matched {
        ConditionalOutcome::NotModified {
            headers,
        }
    } else {
        ConditionalOutcome::Fresh {
            payload: clean,
            headers,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
