// crates/puckboard-nhl/src/lib.rs
// ============================================================================
// Module: Puckboard NHL Proxy
// Description: Read-through proxy for a fixed set of upstream NHL endpoints.
// Purpose: Validate, fetch, normalize, and cache upstream payloads.
// Dependencies: puckboard-core, puckboard-cache, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Each wrapper validates input shape, consults the TTL cache, issues a
//! bounded outbound GET following redirects, validates the response shape,
//! normalizes heterogeneous fields, and stores the envelope under the
//! surface's TTL. Upstream failures map onto the serving error taxonomy:
//! timeout becomes `gateway_timeout`, network and non-2xx failures become
//! `bad_gateway`, malformed bodies become `bad_gateway (invalid_response)`.
//!
//! Security posture: upstream bodies are untrusted input; every field access
//! goes through shape-tolerant extraction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod normalize;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::NhlClient;
pub use client::UpstreamError;
pub use normalize::normalize_standings;
pub use normalize::team_summary_from_standings;
