// crates/puckboard-server/src/routes/analytics.rs
// ============================================================================
// Module: Analytics Routes
// Description: NHL proxy endpoints and the advanced analytics bundle.
// Purpose: Serve cached, validated, ETag-fronted analytics payloads.
// Dependencies: axum, crate::state, puckboard-cache, puckboard-metrics,
//               puckboard-nhl
// ============================================================================

//! ## Overview
//! The NHL proxy endpoints validate input shape, then defer to the cached
//! read-through client; upstream failures surface through the §7 taxonomy.
//! The advanced bundle computes PFI, team trends, RTI, and the fan
//! sentiment proxy over the loaded datasets, caches the sanitized result
//! for ten minutes behind a correctness predicate (every `rti_score` must
//! be a finite number), and serves it with ETag/conditional-GET support.

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
use puckboard_cache::CacheSurface;
use puckboard_core::ApiError;
use puckboard_core::GameDate;
use puckboard_core::GameId;
use puckboard_core::PlayerId;
use puckboard_core::Season;
use puckboard_core::TeamCode;
use puckboard_core::User;
use puckboard_core::sanitize::sanitized;
use puckboard_metrics::DEFAULT_TOP_N;
use puckboard_metrics::DEFAULT_WINDOW;
use puckboard_metrics::compute_fan_sentiment;
use puckboard_metrics::compute_player_form_index;
use puckboard_metrics::compute_rival_threat_index;
use puckboard_metrics::compute_team_trends;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::resolve_user;
use crate::responses::cached_json_response;
use crate::responses::error_response;
use crate::responses::if_none_match;
use crate::state::AppState;

// ============================================================================
// SECTION: Cache Header Policy
// ============================================================================

/// `max-age` for proxy payloads.
const PROXY_MAX_AGE_SECS: u64 = 30;
/// `stale-while-revalidate` for proxy payloads.
const PROXY_SWR_SECS: u64 = 120;
/// `max-age` for the advanced bundle.
const ADVANCED_MAX_AGE_SECS: u64 = 120;
/// `stale-while-revalidate` for the advanced bundle.
const ADVANCED_SWR_SECS: u64 = 600;

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Date-bearing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    /// Date in `YYYY-MM-DD`; defaults to today.
    #[serde(default)]
    pub date: Option<String>,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Leaders query parameters.
#[derive(Debug, Deserialize)]
pub struct LeadersParams {
    /// Leader category.
    #[serde(default = "default_category")]
    pub category: String,
    /// Row limit.
    #[serde(default = "default_leader_limit")]
    pub limit: u32,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Returns the default leaders category.
fn default_category() -> String {
    "points".to_string()
}

/// Returns the default leaders row limit.
const fn default_leader_limit() -> u32 {
    10
}

/// Advanced bundle parameters.
#[derive(Debug, Deserialize)]
pub struct AdvancedParams {
    /// Rolling window in games.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Season in `YYYY-YYYY`.
    #[serde(default = "default_season")]
    pub season: String,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Returns the default rolling window.
const fn default_window() -> usize {
    DEFAULT_WINDOW
}

/// Returns the default season.
fn default_season() -> String {
    "2024-2025".to_string()
}

/// Direct analytics request body.
#[derive(Debug, Deserialize)]
pub struct DirectQueryRequest {
    /// Metric selector (`pfi`, `team_trends`, `rti`, `fsp`).
    pub metric: String,
    /// Rolling window in games.
    #[serde(default = "default_window")]
    pub window: usize,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the strict user or renders the auth failure.
fn authenticate(state: &AppState, headers: &HeaderMap, tz: Option<&str>)
-> Result<User, Response> {
    resolve_user(&state.principals, headers, tz).map_err(|error| error_response(&error, 0))
}

/// Parses the date parameter, defaulting to today (UTC).
fn resolve_date(raw: Option<&str>) -> Result<GameDate, ApiError> {
    match raw {
        Some(raw) => GameDate::parse(raw)
            .map_err(|_| ApiError::bad_request(format!("Invalid date (expected YYYY-MM-DD): {raw}"))),
        None => {
            let now = puckboard_core::Timestamp::now().as_odt();
            let wire = format!(
                "{:04}-{:02}-{:02}",
                now.year(),
                u8::from(now.month()),
                now.day()
            );
            GameDate::parse(&wire).map_err(|_| ApiError::internal("clock produced invalid date"))
        }
    }
}

/// Parses a path game id.
fn resolve_game_id(raw: i64) -> Result<GameId, ApiError> {
    GameId::new(raw).map_err(|_| ApiError::bad_request(format!("Invalid game id: {raw}")))
}

// ============================================================================
// SECTION: Catalog Handlers
// ============================================================================

/// `GET /api/v1/analytics/players` — known players from the roster snapshot.
pub async fn players(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let roster = state.market.team_roster("MTL");
    let players: Vec<Value> = roster
        .iter()
        .map(|row| {
            serde_json::json!({
                "player_id": row.player_id,
                "player_name": row.player_name,
                "position": row.position,
                "roster_status": row.roster_status,
            })
        })
        .collect();
    Json(serde_json::json!({"success": true, "players": players})).into_response()
}

/// `GET /api/v1/analytics/teams` — division teams plus the focus team.
pub async fn teams(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let teams = ["BOS", "TOR", "FLA", "TBL", "BUF", "DET", "OTT", "MTL"];
    Json(serde_json::json!({"success": true, "teams": teams})).into_response()
}

/// `POST /api/v1/analytics/query` — direct metric computation.
pub async fn direct_query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DirectQueryRequest>,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, None) {
        return response;
    }
    let window = if body.window == 0 { DEFAULT_WINDOW } else { body.window };
    let data = &state.metrics_data;
    let payload = match body.metric.as_str() {
        "pfi" => serde_json::json!({
            "metric": "pfi",
            "players": compute_player_form_index(&data.player_games, window, DEFAULT_TOP_N),
        }),
        "team_trends" => serde_json::json!({
            "metric": "team_trends",
            "trends": compute_team_trends(&data.team_games, window),
        }),
        "rti" => serde_json::json!({
            "metric": "rti",
            "teams": compute_rival_threat_index(&data.division_games, window),
        }),
        "fsp" => {
            let trends = compute_team_trends(&data.team_games, window);
            let form = compute_player_form_index(&data.player_games, window, DEFAULT_TOP_N);
            serde_json::json!({
                "metric": "fsp",
                "sentiment": compute_fan_sentiment(&trends, &form),
            })
        }
        other => {
            return error_response(
                &ApiError::bad_request(format!("Unknown metric: {other}")),
                0,
            );
        }
    };
    Json(sanitized(serde_json::json!({"success": true, "data": payload}))).into_response()
}

// ============================================================================
// SECTION: NHL Proxy Handlers
// ============================================================================

/// `GET /api/v1/analytics/nhl/scores?date=`.
pub async fn nhl_scores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let date = match resolve_date(params.date.as_deref()) {
        Ok(date) => date,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.scores(&date).await {
        Ok(payload) => cached_json_response(
            payload,
            if_none_match(&headers),
            PROXY_MAX_AGE_SECS,
            PROXY_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/schedule?date=`.
pub async fn nhl_schedule(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let date = match resolve_date(params.date.as_deref()) {
        Ok(date) => date,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.schedule(&date).await {
        Ok(payload) => cached_json_response(
            payload,
            if_none_match(&headers),
            PROXY_MAX_AGE_SECS,
            PROXY_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/standings?date=`.
pub async fn nhl_standings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let date = match resolve_date(params.date.as_deref()) {
        Ok(date) => date,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.standings(&date).await {
        Ok(payload) => cached_json_response(
            payload,
            if_none_match(&headers),
            PROXY_MAX_AGE_SECS,
            PROXY_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/leaders?category=&limit=`.
pub async fn nhl_leaders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeadersParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    match state.nhl.leaders(&params.category, params.limit.min(100)).await {
        Ok(payload) => cached_json_response(
            payload,
            if_none_match(&headers),
            PROXY_MAX_AGE_SECS,
            PROXY_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/roster/{team}`.
pub async fn nhl_roster(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let team = match TeamCode::parse(&team) {
        Ok(team) => team,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    match state.nhl.roster(&team).await {
        Ok(payload) => Json(sanitized(payload)).into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/team/{team}/summary`.
pub async fn nhl_team_summary(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(params): Query<DateParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let team = match TeamCode::parse(&team) {
        Ok(team) => team,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    let date = match resolve_date(params.date.as_deref()) {
        Ok(date) => date,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.team_summary(&date, &team).await {
        Ok(Some(summary)) => Json(sanitized(summary)).into_response(),
        Ok(None) => error_response(&ApiError::not_found("Team not found in standings"), 0),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/game/{id}/boxscore`.
pub async fn nhl_boxscore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, None) {
        return response;
    }
    let game_id = match resolve_game_id(id) {
        Ok(game_id) => game_id,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.boxscore(game_id).await {
        Ok(payload) => Json(sanitized(payload)).into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/game/{id}/play-by-play`.
pub async fn nhl_play_by_play(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, None) {
        return response;
    }
    let game_id = match resolve_game_id(id) {
        Ok(game_id) => game_id,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.play_by_play(game_id).await {
        Ok(payload) => Json(sanitized(payload)).into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/game/{id}/landing`.
pub async fn nhl_game_landing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, None) {
        return response;
    }
    let game_id = match resolve_game_id(id) {
        Ok(game_id) => game_id,
        Err(error) => return error_response(&error, 0),
    };
    match state.nhl.game_landing(game_id).await {
        Ok(payload) => Json(sanitized(payload)).into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/analytics/nhl/player/{id}/landing`.
pub async fn nhl_player_landing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, None) {
        return response;
    }
    let player_id = match PlayerId::parse_numeric(&id) {
        Ok(player_id) => player_id,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    match state.nhl.player_landing(&player_id).await {
        Ok(payload) => cached_json_response(
            payload,
            if_none_match(&headers),
            PROXY_MAX_AGE_SECS,
            PROXY_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// Game-log query parameters.
#[derive(Debug, Deserialize)]
pub struct GameLogParams {
    /// Season in the upstream `YYYYYYYY` code (derived from `season` when
    /// given as `YYYY-YYYY`).
    #[serde(default = "default_season")]
    pub season: String,
    /// Game type (2 = regular season, 3 = playoffs).
    #[serde(default = "default_game_type")]
    pub game_type: u8,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Returns the default game type (regular season).
const fn default_game_type() -> u8 {
    2
}

/// `GET /api/v1/analytics/nhl/player/{id}/game-log?season=&game_type=`.
pub async fn nhl_player_game_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<GameLogParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let player_id = match PlayerId::parse_numeric(&id) {
        Ok(player_id) => player_id,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    let season = match Season::parse(&params.season) {
        Ok(season) => season,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    let season_code = format!("{}{}", season.start_year(), season.start_year() + 1);
    let game_type = if params.game_type == 3 { 3 } else { 2 };
    match state.nhl.player_game_log(&player_id, &season_code, game_type).await {
        Ok(payload) => Json(sanitized(payload)).into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

// ============================================================================
// SECTION: Advanced Bundle
// ============================================================================

/// Cache validation predicate: every `rti_score` must be a finite number.
fn advanced_payload_valid(payload: &Value) -> bool {
    payload
        .get("rival_threat_index")
        .and_then(Value::as_array)
        .is_some_and(|rows| {
            rows.iter().all(|row| row.get("rti_score").is_some_and(Value::is_number))
        })
}

/// Computes the advanced bundle for a window.
fn compute_advanced_bundle(state: &AppState, season: &Season, window: usize) -> Value {
    let data = &state.metrics_data;
    let form = compute_player_form_index(&data.player_games, window, DEFAULT_TOP_N);
    let trends = compute_team_trends(&data.team_games, window);
    let rivals = compute_rival_threat_index(&data.division_games, window);
    let sentiment = compute_fan_sentiment(&trends, &form);
    sanitized(serde_json::json!({
        "success": true,
        "season": season,
        "window_games": window,
        "player_form": form,
        "team_trends": trends,
        "rival_threat_index": rivals,
        "fan_sentiment_proxy": sentiment,
        "source": "Puckboard Advanced Analytics",
    }))
}

/// `GET /api/v1/analytics/mtl/advanced?window=N&season=YYYY-YYYY`.
pub async fn mtl_advanced(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdvancedParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let season = match Season::parse(&params.season) {
        Ok(season) => season,
        Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
    };
    let window = if params.window == 0 { DEFAULT_WINDOW } else { params.window.min(82) };

    let key = CacheSurface::AdvancedTeam.key(&format!("{season}:{window}"));
    let payload = state.cache.get_valid(&key, advanced_payload_valid).unwrap_or_else(|| {
        let fresh = compute_advanced_bundle(&state, &season, window);
        state.cache.put(key, fresh.clone(), CacheSurface::AdvancedTeam.ttl());
        fresh
    });
    cached_json_response(
        payload,
        if_none_match(&headers),
        ADVANCED_MAX_AGE_SECS,
        ADVANCED_SWR_SECS,
    )
}
