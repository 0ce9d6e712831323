// crates/puckboard-orchestrator/src/fanout.rs
// ============================================================================
// Module: Tool Fan-Out
// Description: Parallel tool execution joined at a bounded deadline.
// Purpose: Run the tool plan concurrently and collect results in completion
//          order.
// Dependencies: puckboard-core, tokio
// ============================================================================

//! ## Overview
//! Each tool invocation is a task producing a [`ToolResult`]; the join is a
//! reducer over a completion channel, which naturally supports the streaming
//! variant. Per-tool deadlines prevent one slow tool from pinning the join;
//! the global deadline bounds the whole fan-out. Failures and timeouts are
//! captured as unsuccessful results, never as request failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use puckboard_core::QueryTool;
use puckboard_core::ToolRequest;
use puckboard_core::ToolResult;
use puckboard_core::User;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

// ============================================================================
// SECTION: Fan-Out
// ============================================================================

/// Runs one tool and shapes the outcome into a [`ToolResult`].
async fn run_one(
    tool: Arc<dyn QueryTool>,
    request: Arc<ToolRequest>,
    user: Arc<User>,
    per_tool_deadline: Duration,
) -> (ToolResult, Vec<String>) {
    let started = Instant::now();
    let name = tool.name().to_string();
    let outcome =
        tokio::time::timeout(per_tool_deadline, tool.invoke(&request, &user)).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match outcome {
        Ok(Ok(output)) => (
            ToolResult {
                tool_name: name,
                success: true,
                data: output.data,
                elapsed_ms,
                citations: output.citations,
                error: None,
            },
            output.evidence,
        ),
        Ok(Err(error)) => (
            ToolResult {
                tool_name: name,
                success: false,
                data: serde_json::Value::Null,
                elapsed_ms,
                citations: Vec::new(),
                error: Some(error.to_string()),
            },
            Vec::new(),
        ),
        Err(_) => (
            ToolResult {
                tool_name: name,
                success: false,
                data: serde_json::Value::Null,
                elapsed_ms,
                citations: Vec::new(),
                error: Some(format!("tool timed out after {per_tool_deadline:?}")),
            },
            Vec::new(),
        ),
    }
}

/// Runs the tool plan concurrently, reporting completions over `progress`
/// when supplied, and returns results in completion order.
///
/// The global deadline bounds the join; tools still pending at the deadline
/// are recorded as timed-out results.
pub async fn run_tool_plan(
    plan: Vec<Arc<dyn QueryTool>>,
    request: ToolRequest,
    user: User,
    per_tool_deadline: Duration,
    global_deadline: Duration,
    progress: Option<mpsc::Sender<ToolResult>>,
) -> (Vec<ToolResult>, Vec<String>) {
    if plan.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let request = Arc::new(request);
    let user = Arc::new(user);
    let mut join_set = JoinSet::new();
    let mut pending: Vec<String> = Vec::with_capacity(plan.len());
    for tool in plan {
        pending.push(tool.name().to_string());
        join_set.spawn(run_one(
            tool,
            Arc::clone(&request),
            Arc::clone(&user),
            per_tool_deadline,
        ));
    }

    let mut results: Vec<ToolResult> = Vec::new();
    let mut evidence: Vec<String> = Vec::new();
    let deadline = Instant::now() + global_deadline;
    while !join_set.is_empty() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, join_set.join_next()).await {
            Ok(Some(Ok((result, tool_evidence)))) => {
                pending.retain(|name| *name != result.tool_name);
                if let Some(progress) = &progress {
                    let _ = progress.send(result.clone()).await;
                }
                evidence.extend(tool_evidence);
                results.push(result);
            }
            Ok(Some(Err(join_error))) => {
                // A panicked tool task is recorded against the first still-
                // pending name; the join set gives no better attribution.
                let name = pending.first().cloned().unwrap_or_default();
                pending.retain(|candidate| *candidate != name);
                results.push(ToolResult {
                    tool_name: name,
                    success: false,
                    data: serde_json::Value::Null,
                    elapsed_ms: 0,
                    citations: Vec::new(),
                    error: Some(format!("tool task failed: {join_error}")),
                });
            }
            Ok(None) => break,
            Err(_) => {
                join_set.abort_all();
                for name in pending.drain(..) {
                    results.push(ToolResult {
                        tool_name: name,
                        success: false,
                        data: serde_json::Value::Null,
                        elapsed_ms: u64::try_from(global_deadline.as_millis())
                            .unwrap_or(u64::MAX),
                        citations: Vec::new(),
                        error: Some("global fan-out deadline exceeded".to_string()),
                    });
                }
                break;
            }
        }
    }
    (results, evidence)
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

    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use puckboard_core::Preferences;
    use puckboard_core::QueryTool;
    use puckboard_core::QueryType;
    use puckboard_core::Role;
    use puckboard_core::ToolError;
    use puckboard_core::ToolOutput;
    use puckboard_core::ToolRequest;
    use puckboard_core::User;

    use super::run_tool_plan;

    /// Tool that sleeps then succeeds or fails.
    struct ScriptedTool {
        /// Registered name.
        name: &'static str,
        /// Sleep before completing.
        delay: Duration,
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

        async fn invoke(
            &self,
            _request: &ToolRequest,
            _user: &User,
        ) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ToolError::Failed("scripted failure".to_string()));
            }
            Ok(ToolOutput {
                data: serde_json::json!({"tool": self.name}),
                citations: vec![format!("{}_source", self.name)],
                evidence: vec![format!("{} evidence", self.name)],
            })
        }
    }

    /// Test user fixture.
    fn user() -> User {
        User {
            user_id: "analyst_hughes".to_string(),
            role: Role::Analyst,
            display_name: "Kent Hughes".to_string(),
            team_access: BTreeSet::from(["MTL".to_string()]),
            preferences: Preferences::default(),
        }
    }

    /// Test request fixture.
    fn request() -> ToolRequest {
        ToolRequest {
            query: "how is the team trending".to_string(),
            query_type: QueryType::TeamAnalytics,
            params: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn results_arrive_in_completion_order() {
        let plan: Vec<Arc<dyn QueryTool>> = vec![
            Arc::new(ScriptedTool {
                name: "slow",
                delay: Duration::from_millis(80),
                fail: false,
            }),
            Arc::new(ScriptedTool {
                name: "fast",
                delay: Duration::from_millis(5),
                fail: false,
            }),
        ];
        let (results, evidence) = run_tool_plan(
            plan,
            request(),
            user(),
            Duration::from_secs(5),
            Duration::from_secs(10),
            None,
        )
        .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].tool_name, "fast");
        assert_eq!(results[1].tool_name, "slow");
        assert_eq!(evidence.len(), 2);
    }

    #[tokio::test]
    async fn failures_become_unsuccessful_results_not_errors() {
        let plan: Vec<Arc<dyn QueryTool>> = vec![
            Arc::new(ScriptedTool {
                name: "good",
                delay: Duration::from_millis(1),
                fail: false,
            }),
            Arc::new(ScriptedTool {
                name: "bad",
                delay: Duration::from_millis(1),
                fail: true,
            }),
        ];
        let (results, _) = run_tool_plan(
            plan,
            request(),
            user(),
            Duration::from_secs(5),
            Duration::from_secs(10),
            None,
        )
        .await;
        assert_eq!(results.len(), 2);
        let bad = results.iter().find(|r| r.tool_name == "bad").expect("bad present");
        assert!(!bad.success);
        assert!(bad.error.as_deref().is_some_and(|e| e.contains("scripted failure")));
    }

    #[tokio::test]
    async fn per_tool_deadline_times_out_slow_tools() {
        let plan: Vec<Arc<dyn QueryTool>> = vec![Arc::new(ScriptedTool {
            name: "glacial",
            delay: Duration::from_secs(30),
            fail: false,
        })];
        let (results, _) = run_tool_plan(
            plan,
            request(),
            user(),
            Duration::from_millis(20),
            Duration::from_secs(10),
            None,
        )
        .await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().is_some_and(|e| e.contains("timed out")));
    }

    #[tokio::test]
    async fn global_deadline_records_pending_tools() {
        let plan: Vec<Arc<dyn QueryTool>> = vec![Arc::new(ScriptedTool {
            name: "pinned",
            delay: Duration::from_secs(30),
            fail: false,
        })];
        let (results, _) = run_tool_plan(
            plan,
            request(),
            user(),
            Duration::from_secs(60),
            Duration::from_millis(20),
            None,
        )
        .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].error.as_deref().is_some_and(|e| e.contains("global")));
    }

    #[tokio::test]
    async fn progress_channel_sees_completions_before_the_join_finishes() {
        let (sender, mut receiver) = tokio::sync::mpsc::channel(8);
        let plan: Vec<Arc<dyn QueryTool>> = vec![Arc::new(ScriptedTool {
            name: "quick",
            delay: Duration::from_millis(1),
            fail: false,
        })];
        let (results, _) = run_tool_plan(
            plan,
            request(),
            user(),
            Duration::from_secs(5),
            Duration::from_secs(10),
            Some(sender),
        )
        .await;
        assert_eq!(results.len(), 1);
        let streamed = receiver.recv().await.expect("streamed result");
        assert_eq!(streamed.tool_name, "quick");
    }
}
