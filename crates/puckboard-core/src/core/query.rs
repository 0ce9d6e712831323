// crates/puckboard-core/src/core/query.rs
// ============================================================================
// Module: Query Envelopes
// Description: Tool results, analytics blocks, and the query response shape.
// Purpose: Define the orchestrator's wire contract in one place.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Types exchanged between the orchestrator, its tools, and the HTTP layer.
//! [`ToolResult`] and [`AnalyticsBlock`] are immutable once produced; the
//! [`QueryResponse`] envelope carries every contract field of the query API.
//! The streaming variant emits [`StreamEvent`] values whose final event is
//! always the assembled response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ConversationId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Query Type
// ============================================================================

/// Classified intent of a user query.
///
/// # Invariants
/// - Variants are stable wire labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Individual player performance questions.
    PlayerPerformance,
    /// Team-level analytics questions.
    TeamAnalytics,
    /// Single-game breakdowns.
    GameAnalysis,
    /// Head-to-head matchup questions.
    Matchup,
    /// Tactical / system questions.
    Tactical,
    /// Raw statistical lookups.
    Statistical,
    /// Video clip retrieval requests.
    ClipRetrieval,
    /// Input too short or ambiguous to dispatch tools.
    Clarification,
}

impl QueryType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerPerformance => "player_performance",
            Self::TeamAnalytics => "team_analytics",
            Self::GameAnalysis => "game_analysis",
            Self::Matchup => "matchup",
            Self::Tactical => "tactical",
            Self::Statistical => "statistical",
            Self::ClipRetrieval => "clip_retrieval",
            Self::Clarification => "clarification",
        }
    }
}

// ============================================================================
// SECTION: Tool Result
// ============================================================================

/// Outcome of one tool invocation, immutable after production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that produced this result.
    pub tool_name: String,
    /// True when the tool completed without error.
    pub success: bool,
    /// Tool-specific payload (already sanitized by the tool).
    pub data: Value,
    /// Wall-clock time spent inside the tool.
    pub elapsed_ms: u64,
    /// Citations contributed by this tool.
    #[serde(default)]
    pub citations: Vec<String>,
    /// Error description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Analytics Blocks
// ============================================================================

/// Kind of analytics block promoted into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsKind {
    /// Single headline statistic.
    Stat,
    /// Chart-ready series payload.
    Chart,
    /// Tabular payload.
    Table,
    /// Video clip collection.
    Clips,
}

/// Lightweight clip reference carried inside a clips analytics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSummary {
    /// External clip identifier.
    pub clip_id: String,
    /// Display title.
    pub title: String,
    /// Player featured in the clip.
    pub player_name: String,
    /// Formatted game context (opponent, date).
    pub game_info: String,
    /// Event type label (goal, shot, entry, ...).
    pub event_type: String,
    /// Free-form description.
    pub description: String,
    /// Playback URL (API-relative or signed).
    pub file_url: String,
    /// Thumbnail URL.
    pub thumbnail_url: String,
    /// Duration in seconds.
    pub duration_s: f64,
    /// Retrieval relevance, 0-1.
    pub relevance_score: f64,
}

/// One analytics block of a query response; never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsBlock {
    /// Block kind.
    #[serde(rename = "type")]
    pub kind: AnalyticsKind,
    /// Display title.
    pub title: String,
    /// Kind-specific payload.
    pub payload: Value,
    /// Presentation metadata.
    pub metadata: Value,
    /// Clip collection for [`AnalyticsKind::Clips`] blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clips: Option<Vec<ClipSummary>>,
}

// ============================================================================
// SECTION: Query Response Envelope
// ============================================================================

/// Full response envelope of the query API.
///
/// # Invariants
/// - `success` stays true while at least one tool succeeded; per-tool
///   failures surface in `warnings`, not as request failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Overall request outcome.
    pub success: bool,
    /// Assembled natural-language answer.
    pub response: String,
    /// Classified query type label.
    pub query_type: String,
    /// Per-tool results in completion order.
    pub tool_results: Vec<ToolResult>,
    /// End-to-end processing time.
    pub processing_time_ms: u64,
    /// Merged text evidence snippets.
    pub evidence: Vec<String>,
    /// Deduplicated citations.
    pub citations: Vec<String>,
    /// Promoted analytics blocks.
    pub analytics: Vec<AnalyticsBlock>,
    /// Role label of the requesting principal.
    pub user_role: String,
    /// Conversation the turns were appended to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// Envelope timestamp (volatile; excluded from ETag hashing).
    pub timestamp: Timestamp,
    /// Fatal tool errors (all-tools-failed case).
    #[serde(default)]
    pub errors: Vec<String>,
    /// Non-fatal warnings, including `clarification_required`.
    #[serde(default)]
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Stream Events
// ============================================================================

/// Server-sent event emitted by the streaming query variant.
///
/// # Invariants
/// - The final event of a stream is always `FinalResponse` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Progress note for the client.
    Status {
        /// Human-readable status line.
        message: String,
    },
    /// One tool finished; emitted in completion order.
    ToolResult {
        /// The finished tool's result.
        data: ToolResult,
    },
    /// Stream terminator carrying the assembled response.
    FinalResponse {
        /// The full response envelope.
        data: QueryResponse,
    },
    /// Stream terminator for fatal failures.
    Error {
        /// Short operator-facing message.
        message: String,
        /// Error detail.
        error: String,
    },
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

    use serde_json::json;

    use super::AnalyticsBlock;
    use super::AnalyticsKind;
    use super::QueryResponse;
    use super::QueryType;
    use super::StreamEvent;
    use super::ToolResult;
    use crate::core::time::Timestamp;

    #[test]
    fn envelope_parse_serialize_parse_preserves_contract_fields() {
        let response = QueryResponse {
            success: true,
            response: "Suzuki leads the rush.".to_string(),
            query_type: QueryType::PlayerPerformance.as_str().to_string(),
            tool_results: vec![ToolResult {
                tool_name: "parquet_query".to_string(),
                success: true,
                data: json!({"rows": 3}),
                elapsed_ms: 12,
                citations: vec!["mtl_player_games".to_string()],
                error: None,
            }],
            processing_time_ms: 48,
            evidence: vec!["xGF% 54.2 over last 10".to_string()],
            citations: vec!["mtl_player_games".to_string()],
            analytics: vec![AnalyticsBlock {
                kind: AnalyticsKind::Stat,
                title: "Form".to_string(),
                payload: json!({"pfi": 61.5}),
                metadata: json!({}),
                clips: None,
            }],
            user_role: "analyst".to_string(),
            conversation_id: None,
            timestamp: Timestamp::from_unix_seconds(1_736_899_200),
            errors: vec![],
            warnings: vec![],
        };
        let encoded = serde_json::to_string(&response).expect("serialize");
        let decoded: QueryResponse = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, response);
    }

    #[test]
    fn stream_events_tag_with_snake_case_type() {
        let event = StreamEvent::Status {
            message: "Processing query".to_string(),
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["type"], "status");
        let error = StreamEvent::Error {
            message: "Query processing failed".to_string(),
            error: "deadline exceeded".to_string(),
        };
        let value = serde_json::to_value(&error).expect("serialize");
        assert_eq!(value["type"], "error");
    }

    #[test]
    fn analytics_kind_uses_wire_labels() {
        let block = AnalyticsBlock {
            kind: AnalyticsKind::Clips,
            title: "Video Highlights".to_string(),
            payload: serde_json::json!({}),
            metadata: serde_json::json!({}),
            clips: Some(vec![]),
        };
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(value["type"], "clips");
    }
}
