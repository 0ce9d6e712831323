// crates/puckboard-server/src/routes/market.rs
// ============================================================================
// Module: Market Routes
// Description: Contract, cap, trade, comparables, and scenario endpoints.
// Purpose: Serve market analytics with snapshot-backed computation.
// Dependencies: axum, crate::state, puckboard-market, puckboard-scenario
// ============================================================================

//! ## Overview
//! Market endpoints read the snapshot store: contract resolution by id or
//! partial name, team cap summaries, trades, the league overview, the CSV
//! contract reader, efficiency and comparables computation, and the depth
//! chart. Cap snapshots serve with ETag/conditional-GET headers. The
//! scenario endpoints run the roster/cap engine over a directory assembled
//! from the same snapshots.

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
use puckboard_core::GameDate;
use puckboard_core::sanitize::sanitized;
use puckboard_market::ComparableProfile;
use puckboard_market::ContractTerms;
use puckboard_market::PlayerStats;
use puckboard_market::compute_contract_efficiency;
use puckboard_market::find_comparables;
use puckboard_market::find_latest_contract_csv;
use puckboard_market::parse_contract_csv;
use puckboard_scenario::Action;
use puckboard_scenario::CancelFlag;
use puckboard_scenario::CapRules;
use puckboard_scenario::PlayerDirectory;
use puckboard_scenario::PlayerRecord;
use puckboard_scenario::ScenarioError;
use puckboard_scenario::simulate_roster_scenario;
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

/// `max-age` for cap/contract snapshot payloads.
const MARKET_MAX_AGE_SECS: u64 = 120;
/// `stale-while-revalidate` for cap/contract snapshot payloads.
const MARKET_SWR_SECS: u64 = 600;
/// Default cap ceiling used when rules are absent from snapshots.
const DEFAULT_CAP_CEILING: f64 = 88_000_000.0;
/// Default cap floor used when rules are absent from snapshots.
const DEFAULT_CAP_FLOOR: f64 = 65_000_000.0;

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Common market query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MarketParams {
    /// Season in `YYYY-YYYY`.
    #[serde(default)]
    pub season: Option<String>,
    /// Team filter for name lookups.
    #[serde(default)]
    pub team: Option<String>,
    /// Row limit for trades.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Roster status filter for the depth chart.
    #[serde(default)]
    pub roster_status: Option<String>,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

impl MarketParams {
    /// Returns the effective season.
    fn season(&self) -> String {
        self.season.clone().unwrap_or_else(|| "2025-2026".to_string())
    }
}

/// Scenario simulation request body.
#[derive(Debug, Deserialize)]
pub struct ScenarioRequest {
    /// Team abbreviation.
    pub team: String,
    /// Actions to apply in order.
    pub actions: Vec<Action>,
    /// Evaluation date for deadline checks.
    #[serde(default)]
    pub as_of_date: Option<String>,
}

/// Acquisition evaluation request body.
#[derive(Debug, Deserialize)]
pub struct AcquisitionRequest {
    /// Team abbreviation.
    pub team: String,
    /// Candidate player name.
    pub candidate_name: String,
    /// Maximum recommended moves.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

/// Returns the default suggestion cap.
const fn default_max_suggestions() -> usize {
    3
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the strict user or renders the auth failure.
fn authenticate(state: &AppState, headers: &HeaderMap, tz: Option<&str>)
-> Result<(), Response> {
    resolve_user(&state.principals, headers, tz)
        .map(|_| ())
        .map_err(|error| error_response(&error, 0))
}

/// Builds efficiency inputs from a merged contract view.
fn efficiency_inputs(contract: &Value) -> (PlayerStats, ContractTerms, String) {
    let number = |key: &str| contract.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let stats = PlayerStats {
        points_per_60: number("points_per_60"),
        xg_per_60: number("xg_per_60"),
        defensive_rating: contract
            .get("defensive_rating")
            .and_then(Value::as_f64)
            .unwrap_or(50.0),
        save_percentage: number("save_percentage"),
        goals_saved_above_expected: number("goals_saved_above_expected"),
    };
    let terms = ContractTerms {
        cap_hit: number("cap_hit"),
        years_remaining: contract.get("years_remaining").and_then(Value::as_i64).unwrap_or(0),
        age: contract.get("age").and_then(Value::as_i64).unwrap_or(25),
    };
    let position =
        contract.get("position").and_then(Value::as_str).unwrap_or("C").to_string();
    (stats, terms, position)
}

/// Builds a comparables profile from a contract row.
fn comparable_profile(contract: &Value) -> ComparableProfile {
    ComparableProfile {
        full_name: contract
            .get("full_name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        age: contract.get("age").and_then(Value::as_i64).unwrap_or(25),
        production_last_season: contract
            .get("production_last_season")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        position: contract.get("position").and_then(Value::as_str).unwrap_or("C").to_string(),
        signing_year: contract.get("signing_year").and_then(Value::as_i64).unwrap_or(2025),
        cap_hit_percentage: contract
            .get("cap_hit_percentage")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
    }
}

/// Assembles the scenario player directory from snapshots for a team.
fn scenario_directory(state: &AppState, team: &str, season: &str) -> PlayerDirectory {
    let roster = state.market.team_roster(team);
    let mut records: Vec<PlayerRecord> = Vec::new();
    for contract in state.market.season_contracts(season) {
        let player_id: i64 = contract.nhl_player_id.parse().unwrap_or(0);
        if player_id == 0 {
            continue;
        }
        let on_roster = roster.iter().any(|row| row.player_id == contract.nhl_player_id)
            || contract.team_abbrev.eq_ignore_ascii_case(team);
        records.push(PlayerRecord {
            player_id,
            player_name: contract.full_name.clone(),
            position: contract.position.clone(),
            cap_hit: contract.cap_hit,
            on_roster: on_roster && contract.team_abbrev.eq_ignore_ascii_case(team),
            waivers: None,
            value_score: (contract.years_remaining.max(0) as f64 / 8.0).min(1.0),
        });
    }
    PlayerDirectory::new(records)
}

// ============================================================================
// SECTION: Contract Handlers
// ============================================================================

/// `GET /api/v1/market/contracts/player/{id}`.
pub async fn contract_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    match state.market.find_contract(Some(&id), None, params.team.as_deref(), &params.season())
    {
        Ok(contract) => cached_json_response(
            serde_json::json!({"success": true, "data": contract}),
            if_none_match(&headers),
            MARKET_MAX_AGE_SECS,
            MARKET_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/market/contracts/name/{name}?team=`.
pub async fn contract_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    match state
        .market
        .find_contract(None, Some(&name), params.team.as_deref(), &params.season())
    {
        Ok(contract) => cached_json_response(
            serde_json::json!({"success": true, "data": contract}),
            if_none_match(&headers),
            MARKET_MAX_AGE_SECS,
            MARKET_SWR_SECS,
        ),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/market/contracts/csv/{id}` — detailed per-season tables.
pub async fn contract_from_csv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let Some(data_dir) = &state.config.market.data_dir else {
        return error_response(
            &ApiError::service_unavailable("Contract data directory not configured"),
            0,
        );
    };
    let contracts_dir = data_dir.join("contracts");
    let path = match find_latest_contract_csv(&contracts_dir, id) {
        Ok(path) => path,
        Err(error) => return error_response(&error.into_api_error(), 0),
    };
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(error) => return error_response(&ApiError::internal(error.to_string()), 0),
    };
    let season = params.season();
    let anchor_year = season.split('-').next().and_then(|y| y.parse().ok()).unwrap_or(2025);
    let parsed = parse_contract_csv(id, &content, anchor_year);
    Json(sanitized(serde_json::json!({
        "success": true,
        "data": parsed,
        "source": "contract_csv",
    })))
    .into_response()
}

// ============================================================================
// SECTION: Cap / Trades / Overview Handlers
// ============================================================================

/// `GET /api/v1/market/cap/{team}`.
pub async fn team_cap(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let summary = state.market.team_cap_summary(&team, &params.season());
    cached_json_response(
        serde_json::json!({"success": true, "data": summary}),
        if_none_match(&headers),
        MARKET_MAX_AGE_SECS,
        MARKET_SWR_SECS,
    )
}

/// `GET /api/v1/market/trades?limit=`.
pub async fn trades(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let trades = state.market.recent_trades(params.limit.unwrap_or(25).min(200));
    Json(serde_json::json!({"success": true, "trades": trades})).into_response()
}

/// `GET /api/v1/market/league/overview`.
pub async fn league_overview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    cached_json_response(
        serde_json::json!({
            "success": true,
            "data": state.market.league_overview(&params.season()),
        }),
        if_none_match(&headers),
        MARKET_MAX_AGE_SECS,
        MARKET_SWR_SECS,
    )
}

// ============================================================================
// SECTION: Efficiency / Comparables Handlers
// ============================================================================

/// `GET /api/v1/market/efficiency/{id}`.
pub async fn efficiency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let contract = match state.market.find_contract(Some(&id), None, None, &params.season()) {
        Ok(contract) => contract,
        Err(error) => return error_response(&error.into_api_error(), 0),
    };
    let (stats, terms, position) = efficiency_inputs(&contract);
    let report = compute_contract_efficiency(&stats, &terms, &position);
    Json(sanitized(serde_json::json!({
        "success": true,
        "data": {
            "player": contract.get("full_name"),
            "position": position,
            "efficiency": report,
        },
    })))
    .into_response()
}

/// `GET /api/v1/market/comparables/{id}`.
pub async fn comparables(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let season = params.season();
    let target_contract = match state.market.find_contract(Some(&id), None, None, &season) {
        Ok(contract) => contract,
        Err(error) => return error_response(&error.into_api_error(), 0),
    };
    let target = comparable_profile(&target_contract);
    let candidates: Vec<ComparableProfile> = state
        .market
        .season_contracts(&season)
        .iter()
        .filter_map(|row| serde_json::to_value(row).ok())
        .map(|value| comparable_profile(&value))
        .collect();
    let ranked = find_comparables(&target, &candidates, 50.0, params.limit.unwrap_or(10));
    Json(sanitized(serde_json::json!({
        "success": true,
        "data": {"target": target, "comparables": ranked},
    })))
    .into_response()
}

/// `GET /api/v1/market/depth-chart/{team}?roster_status=`.
pub async fn depth_chart(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let chart = state.market.depth_chart(&team, params.roster_status.as_deref());
    Json(serde_json::json!({"success": true, "data": chart})).into_response()
}

// ============================================================================
// SECTION: Scenario Handlers
// ============================================================================

/// `POST /api/v1/market/scenario` — roster/cap what-if simulation.
pub async fn simulate_scenario(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
    Json(body): Json<ScenarioRequest>,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let as_of = match body.as_of_date.as_deref() {
        Some(raw) => match GameDate::parse(raw) {
            Ok(date) => Some(date),
            Err(error) => return error_response(&ApiError::bad_request(error.to_string()), 0),
        },
        None => None,
    };
    let season = params.season();
    let directory = scenario_directory(&state, &body.team, &season);
    let rules = CapRules {
        cap_ceiling: DEFAULT_CAP_CEILING,
        cap_floor: DEFAULT_CAP_FLOOR,
        performance_bonus_cushion: 0.0,
        trade_deadline: None,
    };
    let outcome = simulate_roster_scenario(
        &body.team,
        &body.actions,
        &directory,
        &rules,
        as_of.as_ref(),
    );
    Json(sanitized(serde_json::json!({"success": true, "data": outcome}))).into_response()
}

/// `POST /api/v1/market/scenario/acquisition` — acquisition evaluation.
pub async fn evaluate_acquisition(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketParams>,
    headers: HeaderMap,
    Json(body): Json<AcquisitionRequest>,
) -> Response {
    if let Err(response) = authenticate(&state, &headers, params.tz.as_deref()) {
        return response;
    }
    let season = params.season();
    let directory = scenario_directory(&state, &body.team, &season);
    let rules = CapRules {
        cap_ceiling: DEFAULT_CAP_CEILING,
        cap_floor: DEFAULT_CAP_FLOOR,
        performance_bonus_cushion: 0.0,
        trade_deadline: None,
    };
    let cancel = CancelFlag::new();
    match puckboard_scenario::evaluate_acquisition(
        &body.team,
        &body.candidate_name,
        &directory,
        &rules,
        body.max_suggestions,
        &cancel,
    ) {
        Ok(outcome) => {
            Json(sanitized(serde_json::json!({"success": true, "data": outcome})))
                .into_response()
        }
        Err(ScenarioError::PlayerNotFound(name)) => error_response(
            &ApiError::not_found(format!("Candidate '{name}' not found")),
            0,
        ),
        Err(error) => error_response(&ApiError::internal(error.to_string()), 0),
    }
}
