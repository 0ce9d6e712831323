// crates/puckboard-server/src/routes/mod.rs
// ============================================================================
// Module: Route Tree
// Description: Versioned route assembly with CORS and trailing-slash policy.
// Purpose: Mount every handler under the stable /api/v1 and /api/v2 paths.
// Dependencies: axum, crate::state
// ============================================================================

//! ## Overview
//! The route tree mounts the stable surface: auth, query (with its
//! trailing-slash twin and SSE stream), conversations, analytics and the
//! NHL proxy, market, team, and both clip generations. CORS is handled by a
//! lightweight middleware honoring the configured origins; preflight
//! requests short-circuit with the allow headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;

use crate::audit::AuditEvent;
use crate::audit::redact;
use crate::state::AppState;

/// Auth endpoints.
pub mod auth;
/// Analytics and NHL proxy endpoints.
pub mod analytics;
/// Clip delivery endpoints (v1 and v2).
pub mod clips;
/// Market analytics endpoints.
pub mod market;
/// Query and conversation endpoints.
pub mod query;
/// Team profile endpoints.
pub mod team;

// ============================================================================
// SECTION: CORS
// ============================================================================

/// Applies the configured CORS policy and answers preflight requests.
async fn cors_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let allowed = origin.as_deref().filter(|origin| {
        state.config.server.cors_origins.iter().any(|allowed| allowed == origin)
    });
    let allow_value = allowed.and_then(|origin| HeaderValue::from_str(origin).ok());

    let mut response = if request.method() == Method::OPTIONS {
        let mut preflight = StatusCode::NO_CONTENT.into_response();
        preflight.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        );
        preflight.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(
                "authorization, content-type, if-none-match, x-user-timezone, x-timezone, x-tz",
            ),
        );
        preflight
    } else {
        next.run(request).await
    };
    if let Some(value) = allow_value {
        response.headers_mut().insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        response
            .headers_mut()
            .insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    response
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Records one redacted audit event per request.
async fn audit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let started = std::time::Instant::now();
    let path = redact(&request.uri().to_string());
    let response = next.run(request).await;
    state.audit.record(AuditEvent {
        path,
        user_id: None,
        status: response.status().as_u16(),
        error_kind: None,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    });
    response
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the full application router.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Auth.
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/verify", get(auth::verify))
        // Query; the slash twin is explicit because redirects break CORS
        // preflights.
        .route("/api/v1/query", post(query::process_query))
        .route("/api/v1/query/", post(query::process_query))
        .route("/api/v1/query/stream", post(query::stream_query))
        .route("/api/v1/query/conversations", get(query::list_conversations))
        .route("/api/v1/query/conversations/new", post(query::new_conversation))
        .route(
            "/api/v1/query/conversations/{id}",
            get(query::get_conversation).delete(query::delete_conversation),
        )
        .route(
            "/api/v1/query/conversations/{id}/rename",
            put(query::rename_conversation),
        )
        // Analytics and the NHL proxy.
        .route("/api/v1/analytics/players", get(analytics::players))
        .route("/api/v1/analytics/teams", get(analytics::teams))
        .route("/api/v1/analytics/query", post(analytics::direct_query))
        .route("/api/v1/analytics/nhl/scores", get(analytics::nhl_scores))
        .route("/api/v1/analytics/nhl/schedule", get(analytics::nhl_schedule))
        .route("/api/v1/analytics/nhl/standings", get(analytics::nhl_standings))
        .route("/api/v1/analytics/nhl/leaders", get(analytics::nhl_leaders))
        .route("/api/v1/analytics/nhl/roster/{team}", get(analytics::nhl_roster))
        .route(
            "/api/v1/analytics/nhl/team/{team}/summary",
            get(analytics::nhl_team_summary),
        )
        .route(
            "/api/v1/analytics/nhl/game/{id}/boxscore",
            get(analytics::nhl_boxscore),
        )
        .route(
            "/api/v1/analytics/nhl/game/{id}/play-by-play",
            get(analytics::nhl_play_by_play),
        )
        .route(
            "/api/v1/analytics/nhl/game/{id}/landing",
            get(analytics::nhl_game_landing),
        )
        .route(
            "/api/v1/analytics/nhl/player/{id}/landing",
            get(analytics::nhl_player_landing),
        )
        .route(
            "/api/v1/analytics/nhl/player/{id}/game-log",
            get(analytics::nhl_player_game_log),
        )
        .route("/api/v1/analytics/mtl/advanced", get(analytics::mtl_advanced))
        // Market.
        .route("/api/v1/market/contracts/player/{id}", get(market::contract_by_id))
        .route("/api/v1/market/contracts/name/{name}", get(market::contract_by_name))
        .route("/api/v1/market/contracts/csv/{id}", get(market::contract_from_csv))
        .route("/api/v1/market/cap/{team}", get(market::team_cap))
        .route("/api/v1/market/trades", get(market::trades))
        .route("/api/v1/market/league/overview", get(market::league_overview))
        .route("/api/v1/market/efficiency/{id}", get(market::efficiency))
        .route("/api/v1/market/comparables/{id}", get(market::comparables))
        .route("/api/v1/market/depth-chart/{team}", get(market::depth_chart))
        .route("/api/v1/market/scenario", post(market::simulate_scenario))
        .route(
            "/api/v1/market/scenario/acquisition",
            post(market::evaluate_acquisition),
        )
        // Team profiles.
        .route("/api/v1/team/{team}/advanced", get(team::team_advanced))
        .route("/api/v1/team/{team}/rotations", get(team::team_rotations))
        .route("/api/v1/team/game/{id}/deployments", get(team::game_deployments))
        // Clips v1 (file-index era) and v2 (relational + signed URLs).
        .route("/api/v1/clips", get(clips::list_clips_v1))
        .route("/api/v1/clips/stats", get(clips::clip_stats))
        .route("/api/v1/clips/{id}/video", get(clips::serve_video))
        .route("/api/v1/clips/{id}/thumbnail", get(clips::serve_thumbnail))
        .route("/api/v1/clips/{id}/metadata", get(clips::clip_metadata))
        .route("/api/v2/clips", get(clips::list_clips_v2))
        .route("/api/v2/clips/{id}", get(clips::get_clip_v2))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), cors_middleware))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), audit_middleware))
        .with_state(state)
}
