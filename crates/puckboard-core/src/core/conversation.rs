// crates/puckboard-core/src/core/conversation.rs
// ============================================================================
// Module: Conversations
// Description: Conversation and turn records with owner scoping.
// Purpose: Model per-user conversation memory for the orchestrator.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Conversation`] is owned by exactly one user and holds an ordered
//! sequence of turns. Turns are appended in receipt order; the store enforces
//! owner scoping so other users observe `not_found` rather than `forbidden`
//! (no existence disclosure across owners).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ConversationId;
use crate::core::query::AnalyticsBlock;
use crate::core::query::ToolResult;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a derived conversation title.
const MAX_DERIVED_TITLE_CHARS: usize = 48;

// ============================================================================
// SECTION: Turns
// ============================================================================

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Turn written by the user.
    User,
    /// Turn written by the assistant.
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Turn author.
    pub role: TurnRole,
    /// Turn text.
    pub text: String,
    /// Tool results attached to assistant turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<ToolResult>>,
    /// Analytics blocks attached to assistant turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Vec<AnalyticsBlock>>,
    /// Citations attached to assistant turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    /// Receipt timestamp.
    pub ts: Timestamp,
}

// ============================================================================
// SECTION: Conversation
// ============================================================================

/// Conversation record owned by a single user.
///
/// # Invariants
/// - `turns` are ordered by receipt; appends never reorder.
/// - `updated_ts >= created_ts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server-issued identifier.
    pub conversation_id: ConversationId,
    /// Owning username; all access is scoped to this owner.
    pub owner_user_id: String,
    /// Display title, derived from the first user turn until renamed.
    pub title: String,
    /// Creation timestamp.
    pub created_ts: Timestamp,
    /// Last-append or rename timestamp.
    pub updated_ts: Timestamp,
    /// Ordered turn sequence.
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// Returns a listing summary (id, title, timestamps, turn count).
    #[must_use]
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "conversation_id": self.conversation_id,
            "title": self.title,
            "created_ts": self.created_ts,
            "updated_ts": self.updated_ts,
            "turn_count": self.turns.len(),
        })
    }
}

// ============================================================================
// SECTION: Title Derivation
// ============================================================================

/// Derives a display title from the first user turn.
///
/// Whitespace is collapsed and the result truncated on a character boundary;
/// empty input falls back to a fixed placeholder.
#[must_use]
pub fn derive_title(first_user_text: &str) -> String {
    let collapsed = first_user_text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "New conversation".to_string();
    }
    if collapsed.chars().count() <= MAX_DERIVED_TITLE_CHARS {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_DERIVED_TITLE_CHARS).collect();
    format!("{}…", truncated.trim_end())
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

    use super::derive_title;

    #[test]
    fn derive_title_collapses_whitespace() {
        assert_eq!(derive_title("  how is   Suzuki \n trending? "), "how is Suzuki trending?");
    }

    #[test]
    fn derive_title_truncates_long_input() {
        let long = "compare the power play entries of every Atlantic division rival this season";
        let title = derive_title(long);
        assert!(title.ends_with('…'));
        assert!(title.chars().count() <= 49);
    }

    #[test]
    fn derive_title_falls_back_on_empty_input() {
        assert_eq!(derive_title("   "), "New conversation");
    }
}
