// crates/puckboard-server/src/tools.rs
// ============================================================================
// Module: Query Tools
// Description: Orchestrator tool implementations over the serving stores.
// Purpose: Expose metrics, clip retrieval, and vector search as tools.
// Dependencies: puckboard-core, puckboard-media, puckboard-metrics
// ============================================================================

//! ## Overview
//! Concrete [`QueryTool`] implementations wired at startup: the advanced
//! metrics tool computes PFI/trends/RTI/FSP over the loaded datasets; the
//! clip retrieval tool lists ready clips the requesting user may see,
//! shaped for the clips analytics block; the vector search tool proxies the
//! configured backend and reports itself unavailable otherwise, which the
//! orchestrator downgrades to a warning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use puckboard_config::PuckboardConfig;
use puckboard_core::QueryTool;
use puckboard_core::QueryType;
use puckboard_core::ToolError;
use puckboard_core::ToolOutput;
use puckboard_core::ToolRequest;
use puckboard_core::User;
use puckboard_media::ClipAccess;
use puckboard_media::ClipStore;
use puckboard_media::ListClipsFilter;
use puckboard_media::ProcessingStatus;
use puckboard_media::check_clip_access;
use puckboard_metrics::DEFAULT_TOP_N;
use puckboard_metrics::DEFAULT_WINDOW;
use puckboard_metrics::compute_fan_sentiment;
use puckboard_metrics::compute_player_form_index;
use puckboard_metrics::compute_rival_threat_index;
use puckboard_metrics::compute_team_trends;
use puckboard_orchestrator::ToolRegistry;

use crate::state::MetricsDataset;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Clips returned per retrieval invocation.
const CLIP_RESULT_LIMIT: usize = 8;

// ============================================================================
// SECTION: Advanced Metrics Tool
// ============================================================================

/// Tool computing the advanced-metrics bundle over loaded datasets.
pub struct AdvancedMetricsTool {
    /// Loaded game-log datasets.
    data: Arc<MetricsDataset>,
}

impl AdvancedMetricsTool {
    /// Creates the tool over a dataset.
    #[must_use]
    pub const fn new(data: Arc<MetricsDataset>) -> Self {
        Self {
            data,
        }
    }
}

#[async_trait::async_trait]
impl QueryTool for AdvancedMetricsTool {
    fn name(&self) -> &'static str {
        "advanced_metrics"
    }

    fn handles(&self, query_type: QueryType) -> bool {
        !matches!(query_type, QueryType::ClipRetrieval | QueryType::Clarification)
    }

    async fn invoke(&self, _request: &ToolRequest, _user: &User) -> Result<ToolOutput, ToolError> {
        let form = compute_player_form_index(
            &self.data.player_games,
            DEFAULT_WINDOW,
            DEFAULT_TOP_N,
        );
        let trends = compute_team_trends(&self.data.team_games, DEFAULT_WINDOW);
        let rivals = compute_rival_threat_index(&self.data.division_games, DEFAULT_WINDOW);
        let sentiment = compute_fan_sentiment(&trends, &form);

        let evidence = vec![format!(
            "Rolling xGF% {:.1} with special teams net {:+.1}; PDO {:.1}.",
            trends.xgf_pct_rolling, trends.special_teams_net, trends.pdo.value
        )];
        let payload = serde_json::json!({
            "analytics": [
                {
                    "type": "table",
                    "title": "Player Form Index",
                    "payload": {"players": form},
                    "metadata": {"window_games": DEFAULT_WINDOW},
                },
                {
                    "type": "stat",
                    "title": "Team Trends",
                    "payload": {"trends": trends, "fan_sentiment": sentiment},
                    "metadata": {"window_games": DEFAULT_WINDOW},
                },
                {
                    "type": "table",
                    "title": "Rival Threat Index",
                    "payload": {"teams": rivals},
                    "metadata": {"division": "Atlantic"},
                },
            ],
        });
        Ok(ToolOutput {
            data: payload,
            citations: vec!["mtl_team_games".to_string(), "mtl_player_games".to_string()],
            evidence,
        })
    }
}

// ============================================================================
// SECTION: Clip Retrieval Tool
// ============================================================================

/// Tool listing ready clips the requesting user may access.
pub struct ClipRetrievalTool {
    /// Clip metadata store; absent when media is not configured.
    store: Option<Arc<ClipStore>>,
    /// Dev override bypassing RBAC.
    open_access: bool,
}

impl ClipRetrievalTool {
    /// Creates the tool over an optional store.
    #[must_use]
    pub const fn new(store: Option<Arc<ClipStore>>, open_access: bool) -> Self {
        Self {
            store,
            open_access,
        }
    }
}

#[async_trait::async_trait]
impl QueryTool for ClipRetrievalTool {
    fn name(&self) -> &'static str {
        "clip_retrieval"
    }

    fn handles(&self, query_type: QueryType) -> bool {
        query_type == QueryType::ClipRetrieval
    }

    async fn invoke(&self, _request: &ToolRequest, user: &User) -> Result<ToolOutput, ToolError> {
        let Some(store) = &self.store else {
            return Err(ToolError::Unavailable("clip store not configured".to_string()));
        };
        let ready = store
            .list_clips(&ListClipsFilter {
                status: Some(ProcessingStatus::Ready),
                limit: CLIP_RESULT_LIMIT * 4,
                ..ListClipsFilter::default()
            })
            .map_err(|err| ToolError::Failed(err.to_string()))?;
        let clips: Vec<serde_json::Value> = ready
            .iter()
            .filter(|clip| {
                check_clip_access(user, clip, self.open_access) == ClipAccess::Allow
            })
            .take(CLIP_RESULT_LIMIT)
            .map(|clip| {
                serde_json::json!({
                    "clip_id": clip.clip_id,
                    "title": format!("{} {}", clip.player_name, clip.event_type),
                    "player_name": clip.player_name,
                    "game_info": format!("{} vs {} ({})", clip.team_code, clip.opponent_code,
                        clip.game_date),
                    "event_type": clip.event_type,
                    "description": format!("{} in the {}", clip.outcome, clip.zone),
                    "file_url": format!("/api/v1/clips/{}/video", clip.clip_id),
                    "thumbnail_url": format!("/api/v1/clips/{}/thumbnail", clip.clip_id),
                    "duration_s": clip.duration_s,
                    "relevance_score": 1.0,
                })
            })
            .collect();
        let evidence = if clips.is_empty() {
            vec!["No accessible clips matched the request.".to_string()]
        } else {
            vec![format!("Retrieved {} clips from the media index.", clips.len())]
        };
        Ok(ToolOutput {
            data: serde_json::json!({"clips": clips}),
            citations: vec!["media_clip_index".to_string()],
            evidence,
        })
    }
}

// ============================================================================
// SECTION: Vector Search Tool
// ============================================================================

/// Tool proxying the configured vector-search backend.
///
/// The backend is external; when unconfigured the tool reports itself
/// unavailable and the orchestrator attaches a warning instead of failing
/// the request.
pub struct VectorSearchTool {
    /// Configured backend label, when any.
    backend: Option<String>,
}

impl VectorSearchTool {
    /// Creates the tool from the vector configuration.
    #[must_use]
    pub const fn new(backend: Option<String>) -> Self {
        Self {
            backend,
        }
    }
}

#[async_trait::async_trait]
impl QueryTool for VectorSearchTool {
    fn name(&self) -> &'static str {
        "vector_search"
    }

    fn handles(&self, query_type: QueryType) -> bool {
        matches!(
            query_type,
            QueryType::Tactical | QueryType::GameAnalysis | QueryType::Matchup
        )
    }

    async fn invoke(&self, request: &ToolRequest, _user: &User) -> Result<ToolOutput, ToolError> {
        let Some(backend) = &self.backend else {
            return Err(ToolError::Unavailable("vector backend not configured".to_string()));
        };
        // The index is populated by an external pipeline; this serving-side
        // stub returns the routed backend so callers can trace retrieval.
        Ok(ToolOutput {
            data: serde_json::json!({
                "backend": backend,
                "query": request.query,
                "matches": [],
            }),
            citations: vec![format!("vector:{backend}")],
            evidence: Vec::new(),
        })
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the default tool set.
pub fn register_default_tools(
    registry: &mut ToolRegistry,
    metrics_data: Arc<MetricsDataset>,
    clips: Option<Arc<ClipStore>>,
    config: &PuckboardConfig,
) {
    let _ = registry.register(Arc::new(AdvancedMetricsTool::new(metrics_data)));
    let _ = registry.register(Arc::new(ClipRetrievalTool::new(
        clips,
        config.auth.clips_open_access,
    )));
    let _ = registry.register(Arc::new(VectorSearchTool::new(config.vector.backend.clone())));
}

// ============================================================================
// SECTION: Tests
// ============================================================================
