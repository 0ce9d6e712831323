// crates/puckboard-orchestrator/src/service/tests.rs
// ============================================================================
// Module: Orchestrator Service Tests
// Description: Pipeline tests with scripted in-memory tools.
// Purpose: Validate gating, merging, persistence, and streaming order.
// Dependencies: puckboard-orchestrator
// ============================================================================

//! ## Overview
//! Exercises the query pipeline with scripted tools: the clarification gate,
//! citation dedup, clip deduplication across tools, conversation
//! persistence and growth, the all-tools-failed path, and streaming event
//! order.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test assertions use expect/unwrap for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use puckboard_core::AnalyticsKind;
use puckboard_core::ConversationStore;
use puckboard_core::Preferences;
use puckboard_core::QueryTool;
use puckboard_core::QueryType;
use puckboard_core::Role;
use puckboard_core::StreamEvent;
use puckboard_core::ToolError;
use puckboard_core::ToolOutput;
use puckboard_core::ToolRequest;
use puckboard_core::User;
use serde_json::json;

use super::Orchestrator;
use super::QueryOptions;
use crate::memory::InMemoryConversationStore;
use crate::registry::ToolRegistry;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Scripted tool returning a fixed output.
struct ScriptedTool {
    /// Registered name.
    name: &'static str,
    /// Output payload.
    data: serde_json::Value,
    /// Citations returned.
    citations: Vec<String>,
    /// Whether to fail.
    fail: bool,
}

#[async_trait::async_trait]
impl QueryTool for ScriptedTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handles(&self, _query_type: QueryType) -> bool {
        true
    }

    async fn invoke(&self, _request: &ToolRequest, _user: &User) -> Result<ToolOutput, ToolError> {
        if self.fail {
            return Err(ToolError::Failed("scripted failure".to_string()));
        }
        Ok(ToolOutput {
            data: self.data.clone(),
            citations: self.citations.clone(),
            evidence: vec![format!("{} evidence", self.name)],
        })
    }
}

/// One clip payload value.
fn clip(clip_id: &str) -> serde_json::Value {
    json!({
        "clip_id": clip_id,
        "title": format!("Clip {clip_id}"),
        "player_name": "Nick Suzuki",
        "game_info": "MTL vs BOS",
        "event_type": "goal",
        "description": "wrister",
        "file_url": format!("/api/v1/clips/{clip_id}/video"),
        "thumbnail_url": format!("/api/v1/clips/{clip_id}/thumbnail"),
        "duration_s": 12.0,
        "relevance_score": 0.9,
    })
}

/// Analyst user fixture.
fn user() -> User {
    User {
        user_id: "analyst_hughes".to_string(),
        role: Role::Analyst,
        display_name: "Kent Hughes".to_string(),
        team_access: BTreeSet::from(["MTL".to_string()]),
        preferences: Preferences::default(),
    }
}

/// Builds an orchestrator over the given tools.
fn orchestrator(tools: Vec<ScriptedTool>) -> (Arc<Orchestrator>, Arc<InMemoryConversationStore>) {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(Arc::new(tool)).expect("register");
    }
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(registry),
        Arc::clone(&store) as Arc<dyn ConversationStore>,
        Duration::from_secs(30),
    ));
    (orchestrator, store)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn clarification_gate_short_circuits_without_tools() {
    let (orchestrator, store) = orchestrator(vec![ScriptedTool {
        name: "should_not_run",
        data: json!({}),
        citations: vec![],
        fail: false,
    }]);
    let response = orchestrator.process_query("hi", &user(), &QueryOptions::default()).await;
    assert!(response.success);
    assert_eq!(response.query_type, "clarification");
    assert_eq!(response.warnings, vec!["clarification_required".to_string()]);
    assert!(response.tool_results.is_empty());
    // The gate persists nothing.
    assert!(store.list(&user()).expect("list").is_empty());
}

#[tokio::test]
async fn citations_merge_deduplicated_and_evidence_joins() {
    let (orchestrator, _) = orchestrator(vec![
        ScriptedTool {
            name: "alpha",
            data: json!({}),
            citations: vec!["shared".to_string(), "alpha_only".to_string()],
            fail: false,
        },
        ScriptedTool {
            name: "beta",
            data: json!({}),
            citations: vec!["shared".to_string(), "beta_only".to_string()],
            fail: false,
        },
    ]);
    let response = orchestrator
        .process_query("how is the team power play trending", &user(), &QueryOptions::default())
        .await;
    assert!(response.success);
    assert_eq!(
        response.citations.iter().filter(|c| c.as_str() == "shared").count(),
        1
    );
    assert!(response.citations.contains(&"alpha_only".to_string()));
    assert!(response.citations.contains(&"beta_only".to_string()));
    assert_eq!(response.evidence.len(), 2);
}

#[tokio::test]
async fn clips_from_multiple_tools_dedupe_into_one_block() {
    let (orchestrator, _) = orchestrator(vec![
        ScriptedTool {
            name: "clips_primary",
            data: json!({"clips": [clip("c1"), clip("c2")]}),
            citations: vec![],
            fail: false,
        },
        ScriptedTool {
            name: "clips_secondary",
            data: json!({"clips": [clip("c2"), clip("c3")]}),
            citations: vec![],
            fail: false,
        },
    ]);
    let response = orchestrator
        .process_query("show me clips of Suzuki goals", &user(), &QueryOptions::default())
        .await;
    let clip_blocks: Vec<_> = response
        .analytics
        .iter()
        .filter(|block| block.kind == AnalyticsKind::Clips)
        .collect();
    assert_eq!(clip_blocks.len(), 1);
    let clips = clip_blocks[0].clips.as_ref().expect("clips");
    assert_eq!(clips.len(), 3);
    assert_eq!(clip_blocks[0].title, "Video Highlights (3 clips)");
}

#[tokio::test]
async fn partial_failure_downgrades_to_warning() {
    let (orchestrator, _) = orchestrator(vec![
        ScriptedTool {
            name: "works",
            data: json!({}),
            citations: vec![],
            fail: false,
        },
        ScriptedTool {
            name: "breaks",
            data: json!({}),
            citations: vec![],
            fail: true,
        },
    ]);
    let response = orchestrator
        .process_query("team pace over the last ten", &user(), &QueryOptions::default())
        .await;
    assert!(response.success);
    assert!(response.warnings.contains(&"breaks_failed".to_string()));
    assert!(response.errors.is_empty());
}

#[tokio::test]
async fn all_tools_failing_fails_the_request() {
    let (orchestrator, _) = orchestrator(vec![ScriptedTool {
        name: "breaks",
        data: json!({}),
        citations: vec![],
        fail: true,
    }]);
    let response = orchestrator
        .process_query("team pace over the last ten", &user(), &QueryOptions::default())
        .await;
    assert!(!response.success);
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn resending_grows_the_same_conversation_monotonically() {
    let (orchestrator, store) = orchestrator(vec![ScriptedTool {
        name: "works",
        data: json!({}),
        citations: vec![],
        fail: false,
    }]);
    let me = user();
    let first = orchestrator
        .process_query("how is Suzuki playing lately", &me, &QueryOptions::default())
        .await;
    let conversation_id = first.conversation_id.clone().expect("created");
    let after_first = store.get(&me, &conversation_id).expect("get").turns.len();

    let second = orchestrator
        .process_query(
            "how is Suzuki playing lately",
            &me,
            &QueryOptions {
                conversation_id: Some(conversation_id.clone()),
                ..QueryOptions::default()
            },
        )
        .await;
    assert_eq!(second.conversation_id.as_ref(), Some(&conversation_id));
    assert_eq!(second.user_role, first.user_role);
    let after_second = store.get(&me, &conversation_id).expect("get").turns.len();
    assert!(after_second > after_first);
    assert_eq!(after_second, 4);
}

#[tokio::test]
async fn unknown_conversation_id_falls_back_to_a_new_one() {
    let (orchestrator, _) = orchestrator(vec![ScriptedTool {
        name: "works",
        data: json!({}),
        citations: vec![],
        fail: false,
    }]);
    let response = orchestrator
        .process_query(
            "how is Suzuki playing lately",
            &user(),
            &QueryOptions {
                conversation_id: Some(puckboard_core::ConversationId::new("conv-missing")),
                ..QueryOptions::default()
            },
        )
        .await;
    let id = response.conversation_id.expect("created");
    assert_ne!(id.as_str(), "conv-missing");
}

#[tokio::test]
async fn streaming_emits_tool_results_then_the_final_envelope_last() {
    let (orchestrator, _) = orchestrator(vec![ScriptedTool {
        name: "works",
        data: json!({}),
        citations: vec![],
        fail: false,
    }]);
    let mut receiver = orchestrator.process_query_streaming(
        "team pace over the last ten".to_string(),
        user(),
        QueryOptions::default(),
    );
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(StreamEvent::Status { .. })));
    assert!(events.iter().any(|event| matches!(event, StreamEvent::ToolResult { .. })));
    assert!(matches!(events.last(), Some(StreamEvent::FinalResponse { .. })));
}
