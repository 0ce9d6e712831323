// crates/puckboard-orchestrator/src/service.rs
// ============================================================================
// Module: Orchestrator Service
// Description: End-to-end query pipeline and streaming variant.
// Purpose: Turn a query into a cited, persisted response envelope.
// Dependencies: crate::classify, crate::fanout, crate::registry,
//               puckboard-core, tokio
// ============================================================================

//! ## Overview
//! [`Orchestrator::process_query`] runs the full pipeline: clarification
//! gate, classification, parallel fan-out, evidence/citation merge,
//! analytics assembly (clips deduplicated by id into one block), and
//! conversation persistence. The streaming variant emits `status`,
//! `tool_result`, and a terminal `final_response` event over a channel.
//! Mode and model overrides are passthrough metadata; they do not alter
//! conversation memory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use puckboard_core::AnalyticsBlock;
use puckboard_core::AnalyticsKind;
use puckboard_core::ClipSummary;
use puckboard_core::ConversationId;
use puckboard_core::ConversationStore;
use puckboard_core::QueryResponse;
use puckboard_core::QueryType;
use puckboard_core::StreamEvent;
use puckboard_core::Timestamp;
use puckboard_core::ToolRequest;
use puckboard_core::ToolResult;
use puckboard_core::Turn;
use puckboard_core::TurnRole;
use puckboard_core::User;
use puckboard_core::derive_title;
use puckboard_core::sanitize::sanitized;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::classify::clarification_message;
use crate::classify::classify_query;
use crate::classify::is_ambiguous;
use crate::fanout::run_tool_plan;
use crate::registry::ToolRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Streaming channel capacity.
const STREAM_CHANNEL_CAPACITY: usize = 32;
/// Per-tool deadline as a fraction of the global deadline denominator.
const PER_TOOL_DEADLINE_DIVISOR: u32 = 2;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Per-request orchestrator options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Fast-mode override label (passthrough).
    pub mode: Option<String>,
    /// Explicit model override label (passthrough).
    pub model: Option<String>,
    /// Conversation to append to; a new one is created when absent.
    pub conversation_id: Option<ConversationId>,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Conversational query orchestrator.
pub struct Orchestrator {
    /// Registered query tools.
    registry: Arc<ToolRegistry>,
    /// Conversation memory.
    store: Arc<dyn ConversationStore>,
    /// Global fan-out deadline.
    global_deadline: Duration,
}

impl Orchestrator {
    /// Creates an orchestrator over a registry and conversation store.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        store: Arc<dyn ConversationStore>,
        global_deadline: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            global_deadline,
        }
    }

    /// Returns the conversation store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn ConversationStore> {
        Arc::clone(&self.store)
    }

    /// Processes one query end to end.
    pub async fn process_query(
        &self,
        query: &str,
        user: &User,
        options: &QueryOptions,
    ) -> QueryResponse {
        self.process_inner(query, user, options, None).await
    }

    /// Streaming variant: events arrive as they become available and the
    /// final envelope is always the last event.
    #[must_use]
    pub fn process_query_streaming(
        self: &Arc<Self>,
        query: String,
        user: User,
        options: QueryOptions,
    ) -> mpsc::Receiver<StreamEvent> {
        let (events, receiver) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let _ = events
                .send(StreamEvent::Status {
                    message: "Processing query...".to_string(),
                })
                .await;

            let (progress, mut completions) = mpsc::channel::<ToolResult>(STREAM_CHANNEL_CAPACITY);
            let forwarder_events = events.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(result) = completions.recv().await {
                    let _ = forwarder_events
                        .send(StreamEvent::ToolResult {
                            data: result,
                        })
                        .await;
                }
            });

            let response =
                orchestrator.process_inner(&query, &user, &options, Some(progress)).await;
            let _ = forwarder.await;
            let _ = events
                .send(StreamEvent::FinalResponse {
                    data: response,
                })
                .await;
        });
        receiver
    }

    /// Shared pipeline behind both entry points.
    async fn process_inner(
        &self,
        query: &str,
        user: &User,
        options: &QueryOptions,
        progress: Option<mpsc::Sender<ToolResult>>,
    ) -> QueryResponse {
        let started = Instant::now();

        // Clarification gate: no tools, no persistence, never an error.
        if is_ambiguous(query) {
            return QueryResponse {
                success: true,
                response: clarification_message(query),
                query_type: QueryType::Clarification.as_str().to_string(),
                tool_results: Vec::new(),
                processing_time_ms: elapsed_ms(started),
                evidence: Vec::new(),
                citations: Vec::new(),
                analytics: Vec::new(),
                user_role: user.role.as_str().to_string(),
                conversation_id: options.conversation_id.clone(),
                timestamp: Timestamp::now(),
                errors: Vec::new(),
                warnings: vec!["clarification_required".to_string()],
            };
        }

        let query_type = classify_query(query);
        let plan = self.registry.plan(query_type);
        let request = ToolRequest {
            query: query.to_string(),
            query_type,
            params: serde_json::json!({
                "mode": options.mode,
                "model": options.model,
            }),
        };
        let per_tool_deadline = self.global_deadline / PER_TOOL_DEADLINE_DIVISOR;
        let (tool_results, evidence) = run_tool_plan(
            plan,
            request,
            user.clone(),
            per_tool_deadline,
            self.global_deadline,
            progress,
        )
        .await;

        // Merge citations (dedup by value, first occurrence wins) and
        // collect per-tool warnings.
        let mut citations: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        for result in &tool_results {
            for citation in &result.citations {
                if !citations.contains(citation) {
                    citations.push(citation.clone());
                }
            }
            if !result.success {
                warnings.push(format!("{}_failed", result.tool_name));
            }
        }

        let all_failed =
            !tool_results.is_empty() && tool_results.iter().all(|result| !result.success);
        let errors: Vec<String> = if all_failed {
            tool_results.iter().filter_map(|result| result.error.clone()).collect()
        } else {
            Vec::new()
        };

        let analytics = assemble_analytics(&tool_results);
        let response_text = if all_failed {
            "Query processing failed".to_string()
        } else if evidence.is_empty() {
            format!(
                "Here is what I found for \"{}\" across {} data source(s).",
                query.trim(),
                tool_results.iter().filter(|result| result.success).count()
            )
        } else {
            evidence.join("\n")
        };

        let conversation_id =
            self.persist_turns(user, options, query, &tool_results, &analytics, &citations,
                &response_text);

        QueryResponse {
            success: !all_failed,
            response: response_text,
            query_type: query_type.as_str().to_string(),
            tool_results,
            processing_time_ms: elapsed_ms(started),
            evidence,
            citations,
            analytics,
            user_role: user.role.as_str().to_string(),
            conversation_id,
            timestamp: Timestamp::now(),
            errors,
            warnings,
        }
    }

    /// Appends the user and assistant turns, creating the conversation when
    /// the client did not supply a usable id.
    #[allow(clippy::too_many_arguments, reason = "Persistence takes the assembled pieces.")]
    fn persist_turns(
        &self,
        user: &User,
        options: &QueryOptions,
        query: &str,
        tool_results: &[ToolResult],
        analytics: &[AnalyticsBlock],
        citations: &[String],
        response_text: &str,
    ) -> Option<ConversationId> {
        let conversation_id = options
            .conversation_id
            .as_ref()
            .filter(|id| self.store.get(user, id).is_ok())
            .cloned()
            .or_else(|| {
                self.store.create(user, &derive_title(query)).ok().map(|c| c.conversation_id)
            })?;
        let now = Timestamp::now();
        let user_turn = Turn {
            role: TurnRole::User,
            text: query.to_string(),
            tool_results: None,
            analytics: None,
            citations: None,
            ts: now,
        };
        let assistant_turn = Turn {
            role: TurnRole::Assistant,
            text: response_text.to_string(),
            tool_results: Some(tool_results.to_vec()),
            analytics: Some(analytics.to_vec()),
            citations: Some(citations.to_vec()),
            ts: Timestamp::now(),
        };
        let _ = self.store.append_turn(user, &conversation_id, user_turn);
        let _ = self.store.append_turn(user, &conversation_id, assistant_turn);
        Some(conversation_id)
    }
}

// ============================================================================
// SECTION: Analytics Assembly
// ============================================================================

/// Milliseconds elapsed since `started`, saturating.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Promotes tool outputs to analytics blocks.
///
/// Tools may embed ready-made blocks under `data.analytics`; clip-retrieval
/// outputs contribute clips that are deduplicated by `clip_id` into a single
/// clips block regardless of how many tools produced them.
fn assemble_analytics(tool_results: &[ToolResult]) -> Vec<AnalyticsBlock> {
    let mut blocks: Vec<AnalyticsBlock> = Vec::new();
    let mut clips: Vec<ClipSummary> = Vec::new();
    for result in tool_results {
        if !result.success {
            continue;
        }
        if let Some(embedded) = result.data.get("analytics").and_then(Value::as_array) {
            for value in embedded {
                if let Ok(block) =
                    serde_json::from_value::<AnalyticsBlock>(sanitized(value.clone()))
                {
                    blocks.push(block);
                }
            }
        }
        if let Some(tool_clips) = result.data.get("clips").and_then(Value::as_array) {
            for value in tool_clips {
                if let Ok(clip) = serde_json::from_value::<ClipSummary>(value.clone())
                    && !clips.iter().any(|existing| existing.clip_id == clip.clip_id)
                {
                    clips.push(clip);
                }
            }
        }
    }
    if !clips.is_empty() {
        blocks.push(AnalyticsBlock {
            kind: AnalyticsKind::Clips,
            title: format!("Video Highlights ({} clips)", clips.len()),
            payload: serde_json::json!({}),
            metadata: serde_json::json!({}),
            clips: Some(clips),
        });
    }
    blocks
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
