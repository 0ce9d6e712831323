// crates/puckboard-server/src/routes/team.rs
// ============================================================================
// Module: Team Routes
// Description: Team-level advanced analytics, rotations, and deployments.
// Purpose: Serve team profile views over datasets and the proxy.
// Dependencies: axum, crate::state, puckboard-metrics
// ============================================================================

//! ## Overview
//! Team endpoints: the rolling advanced view (trends plus the rival index
//! filtered to the requested team), positional rotation groupings from the
//! roster snapshot, and per-game deployment context from the gamecenter
//! boxscore.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use puckboard_core::ApiError;
use puckboard_core::GameId;
use puckboard_core::TeamCode;
use puckboard_core::sanitize::sanitized;
use puckboard_metrics::DEFAULT_WINDOW;
use puckboard_metrics::compute_rival_threat_index;
use puckboard_metrics::compute_team_trends;
use serde::Deserialize;

use crate::auth::resolve_user;
use crate::responses::error_response;
use crate::state::AppState;

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Team route parameters.
#[derive(Debug, Default, Deserialize)]
pub struct TeamParams {
    /// Rolling window in games.
    #[serde(default)]
    pub window: Option<usize>,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /api/v1/team/{team}/advanced?window=`.
pub async fn team_advanced(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(params): Query<TeamParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(error) = resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        return error_response(&error, 0);
    }
    let team = match TeamCode::parse(&team) {
        Ok(team) => team,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    let window = params.window.unwrap_or(DEFAULT_WINDOW).clamp(1, 82);
    let trends = compute_team_trends(&state.metrics_data.team_games, window);
    let rivals = compute_rival_threat_index(&state.metrics_data.division_games, window);
    let team_threat = rivals.iter().find(|entry| entry.team == team.as_str()).cloned();
    Json(sanitized(serde_json::json!({
        "success": true,
        "team": team,
        "window_games": window,
        "trends": trends,
        "division_context": rivals,
        "team_threat": team_threat,
    })))
    .into_response()
}

/// `GET /api/v1/team/{team}/rotations` — positional groupings from the
/// roster snapshot.
pub async fn team_rotations(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(params): Query<TeamParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(error) = resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        return error_response(&error, 0);
    }
    let team = match TeamCode::parse(&team) {
        Ok(team) => team,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    let roster = state.market.team_roster(team.as_str());
    if roster.is_empty() {
        return error_response(&ApiError::not_found("No roster snapshot for team"), 0);
    }
    let group = |positions: &[&str]| -> Vec<serde_json::Value> {
        roster
            .iter()
            .filter(|row| positions.contains(&row.position.as_str()))
            .map(|row| {
                serde_json::json!({
                    "player_id": row.player_id,
                    "player_name": row.player_name,
                    "position": row.position,
                })
            })
            .collect()
    };
    Json(serde_json::json!({
        "success": true,
        "team": team,
        "rotations": {
            "forwards": group(&["C", "LW", "RW", "W", "F"]),
            "defense": group(&["D", "LD", "RD"]),
            "goalies": group(&["G"]),
        },
    }))
    .into_response()
}

/// `GET /api/v1/team/game/{id}/deployments` — deployment context from the
/// gamecenter boxscore.
pub async fn game_deployments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<TeamParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(error) = resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        return error_response(&error, 0);
    }
    let game_id = match GameId::new(id) {
        Ok(game_id) => game_id,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    match state.nhl.boxscore(game_id).await {
        Ok(boxscore) => Json(sanitized(serde_json::json!({
            "success": true,
            "game_id": game_id,
            "deployments": boxscore.get("playerByGameStats").cloned()
                .unwrap_or(serde_json::Value::Null),
            "source": "gamecenter boxscore",
        })))
        .into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}
