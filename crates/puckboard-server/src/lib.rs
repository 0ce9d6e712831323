// crates/puckboard-server/src/lib.rs
// ============================================================================
// Module: Puckboard Server
// Description: Versioned HTTP surface over the serving components.
// Purpose: Wire auth, caching, metrics, media, market, and the orchestrator
//          into one axum application.
// Dependencies: axum, puckboard-* crates, tokio
// ============================================================================

//! ## Overview
//! The server crate assembles the HTTP application: the principal table and
//! both auth resolvers, the audit sink with credential redaction, the error
//! envelope mapping, and the versioned route tree (`/api/v1`, `/api/v2`).
//! Handlers are plain functions over [`state::AppState`] so tests drive them
//! directly with in-memory fixtures.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod responses;
pub mod routes;
pub mod state;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use routes::build_router;
pub use state::AppState;
