// crates/puckboard-core/src/lib.rs
// ============================================================================
// Module: Puckboard Core
// Description: Domain types, errors, and interfaces for the serving backend.
// Purpose: Define the shared vocabulary used by every Puckboard crate.
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! This crate defines the domain model of the Puckboard hockey-analytics
//! backend: principals and roles, conversations, tool results, analytics
//! blocks, the error taxonomy, numeric sanitization, and canonical-payload
//! hashing. Interfaces decouple the serving layer from tool, signing, and
//! conversation-store backends.
//! Invariants:
//! - Error kinds are stable for programmatic handling and HTTP mapping.
//! - Sanitized payloads never contain non-finite floats.
//!
//! Security posture: request inputs are untrusted; validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod error;
pub mod hashing;
pub mod interfaces;
pub mod sanitize;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::conversation::Conversation;
pub use core::conversation::Turn;
pub use core::conversation::TurnRole;
pub use core::conversation::derive_title;
pub use core::identifiers::ClipId;
pub use core::identifiers::ConversationId;
pub use core::identifiers::GameDate;
pub use core::identifiers::GameId;
pub use core::identifiers::PlayerId;
pub use core::identifiers::Season;
pub use core::identifiers::TeamCode;
pub use core::query::AnalyticsBlock;
pub use core::query::AnalyticsKind;
pub use core::query::ClipSummary;
pub use core::query::QueryResponse;
pub use core::query::QueryType;
pub use core::query::StreamEvent;
pub use core::query::ToolResult;
pub use core::time::Timestamp;
pub use core::user::Preferences;
pub use core::user::Role;
pub use core::user::User;
pub use core::user::normalize_player_id;
pub use error::ApiError;
pub use error::ErrorBody;
pub use error::ErrorKind;
pub use interfaces::ConversationStore;
pub use interfaces::ConversationStoreError;
pub use interfaces::QueryTool;
pub use interfaces::SignError;
pub use interfaces::ToolError;
pub use interfaces::ToolOutput;
pub use interfaces::ToolRequest;
pub use interfaces::UrlSigner;
