// crates/puckboard-core/src/core/mod.rs
// ============================================================================
// Module: Core Domain Types
// Description: Identifiers, principals, conversations, and query envelopes.
// Purpose: Group the domain submodules shared across the backend.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Domain submodules for the Puckboard backend. Types here are plain data
//! with validation at construction; behavior lives in the consuming crates.

/// Conversation and turn types.
pub mod conversation;
/// Validated identifier newtypes.
pub mod identifiers;
/// Query envelope, tool result, and analytics types.
pub mod query;
/// Timestamp wrapper for response envelopes.
pub mod time;
/// Principals, roles, and preferences.
pub mod user;
