// crates/puckboard-core/src/interfaces/mod.rs
// ============================================================================
// Module: Puckboard Interfaces
// Description: Backend-agnostic interfaces for tools, signing, and memory.
// Purpose: Define the contract surfaces used by the serving runtime.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the orchestrator and media layer integrate with
//! external systems without embedding backend-specific details.
//! Implementations must be deterministic with respect to their inputs and
//! fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::conversation::Conversation;
use crate::core::conversation::Turn;
use crate::core::identifiers::ConversationId;
use crate::core::query::QueryType;
use crate::core::user::User;

// ============================================================================
// SECTION: Query Tool
// ============================================================================

/// Request handed to a query tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Original query text.
    pub query: String,
    /// Classified query type driving tool behavior.
    pub query_type: QueryType,
    /// Tool-specific parameters extracted during classification.
    pub params: Value,
}

/// Successful tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Tool-specific payload (sanitized by the tool).
    pub data: Value,
    /// Citations contributed by this invocation.
    #[serde(default)]
    pub citations: Vec<String>,
    /// Text evidence snippets for the answer assembly.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Tool invocation errors.
///
/// # Invariants
/// - Variants are stable; the orchestrator downgrades them to warnings.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool exceeded its deadline.
    #[error("tool timed out after {0:?}")]
    Timeout(Duration),
    /// Backing dependency is not configured or reachable.
    #[error("tool unavailable: {0}")]
    Unavailable(String),
    /// Tool ran but failed.
    #[error("tool failed: {0}")]
    Failed(String),
}

/// One orchestrator tool (vector search, tabular query, metrics, clips, ...).
#[async_trait::async_trait]
pub trait QueryTool: Send + Sync {
    /// Stable tool name used in results and warnings.
    fn name(&self) -> &'static str;

    /// Returns true when this tool should run for the given query type.
    fn handles(&self, query_type: QueryType) -> bool;

    /// Invokes the tool for one request.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the tool cannot produce output; the
    /// orchestrator records the failure as a warning.
    async fn invoke(&self, request: &ToolRequest, user: &User) -> Result<ToolOutput, ToolError>;
}

// ============================================================================
// SECTION: Conversation Store
// ============================================================================

/// Conversation store errors.
#[derive(Debug, Error)]
pub enum ConversationStoreError {
    /// Conversation does not exist for this owner.
    ///
    /// Returned for both truly-missing ids and ids owned by someone else so
    /// that ownership is never disclosed.
    #[error("conversation not found")]
    NotFound,
    /// Invalid input (empty title on rename).
    #[error("invalid conversation input: {0}")]
    Invalid(String),
    /// Backing store failed.
    #[error("conversation store failure: {0}")]
    Storage(String),
}

/// Owner-scoped conversation memory.
pub trait ConversationStore: Send + Sync {
    /// Creates a conversation for the owner and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationStoreError::Storage`] on backend failure.
    fn create(&self, owner: &User, title: &str) -> Result<Conversation, ConversationStoreError>;

    /// Lists the owner's conversations, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationStoreError::Storage`] on backend failure.
    fn list(&self, owner: &User) -> Result<Vec<Conversation>, ConversationStoreError>;

    /// Fetches one conversation, enforcing owner scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationStoreError::NotFound`] for unknown or
    /// foreign-owned ids.
    fn get(
        &self,
        owner: &User,
        id: &ConversationId,
    ) -> Result<Conversation, ConversationStoreError>;

    /// Appends a turn in receipt order.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationStoreError::NotFound`] for unknown or
    /// foreign-owned ids.
    fn append_turn(
        &self,
        owner: &User,
        id: &ConversationId,
        turn: Turn,
    ) -> Result<(), ConversationStoreError>;

    /// Renames a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationStoreError::Invalid`] for empty titles and
    /// [`ConversationStoreError::NotFound`] for unknown or foreign ids.
    fn rename(
        &self,
        owner: &User,
        id: &ConversationId,
        title: &str,
    ) -> Result<(), ConversationStoreError>;

    /// Deletes a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationStoreError::NotFound`] for unknown or
    /// foreign-owned ids.
    fn delete(&self, owner: &User, id: &ConversationId) -> Result<(), ConversationStoreError>;
}

// ============================================================================
// SECTION: Url Signer
// ============================================================================

/// URL signing errors.
#[derive(Debug, Error)]
pub enum SignError {
    /// Storage URI was not understood.
    #[error("invalid storage uri: {0}")]
    InvalidUri(String),
    /// Signing backend failed.
    #[error("signing failed: {0}")]
    Backend(String),
}

/// Signs object-storage URIs into time-limited GET URLs.
#[async_trait::async_trait]
pub trait UrlSigner: Send + Sync {
    /// Produces a presigned GET URL valid for `expires_in`.
    ///
    /// # Errors
    ///
    /// Returns [`SignError`] when the URI is invalid or the backend fails.
    async fn presign_get(&self, storage_uri: &str, expires_in: Duration)
    -> Result<String, SignError>;
}
