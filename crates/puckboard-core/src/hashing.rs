// crates/puckboard-core/src/hashing.rs
// ============================================================================
// Module: Payload Hashing
// Description: Canonical-JSON SHA-256 digests for ETag validation.
// Purpose: Make identical payloads hash identically across processes.
// Dependencies: serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! ETags are hex SHA-256 digests of the canonical JSON (RFC 8785) form of a
//! payload with volatile fields stripped and non-finite floats sanitized to
//! null first. Serving the same payload therefore always yields the same
//! validator regardless of map ordering or process restarts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::sanitize::sanitize_in_place;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Top-level fields excluded from ETag hashing because they change per serve.
pub const VOLATILE_FIELDS: &[&str] = &["timestamp", "ts", "fetched_at"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while hashing payloads.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical serialization failed.
    #[error("canonical serialization failed: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Computes the ETag for a response payload.
///
/// Volatile top-level fields are removed and non-finite floats replaced with
/// null before canonicalization, so re-serving a cached payload produces the
/// same tag.
///
/// # Errors
///
/// Returns [`HashError`] when canonical serialization fails.
pub fn etag_for_payload(payload: &Value) -> Result<String, HashError> {
    let mut stripped = payload.clone();
    if let Value::Object(map) = &mut stripped {
        for field in VOLATILE_FIELDS {
            map.remove(*field);
        }
    }
    sanitize_in_place(&mut stripped);
    let canonical = serde_jcs::to_vec(&stripped)
        .map_err(|err| HashError::Canonicalization(err.to_string()))?;
    Ok(hex_digest(&canonical))
}

/// Computes the hex SHA-256 digest of raw bytes.
#[must_use]
pub fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = std::fmt::Write::write_fmt(&mut out, format_args!("{byte:02x}"));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
