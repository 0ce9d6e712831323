//! End-to-end handler tests for puckboard-server.
// crates/puckboard-server/tests/api.rs
// =============================================================================
// Module: API End-To-End Tests
// Description: Drive route handlers directly with in-memory fixtures.
// Purpose: Validate the serving scenarios: clarification, RBAC, ranges,
//          NaN guards, conditional GET, and conversation isolation.
// =============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test assertions use expect/unwrap for clarity."
)]

use std::io::Write;
use std::sync::Arc;

use axum::Json;
use axum::body::to_bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::Response;
use puckboard_config::PuckboardConfig;
use puckboard_media::ClipRecord;
use puckboard_media::ClipStore;
use puckboard_media::ProcessingStatus;
use puckboard_metrics::DivisionGameRow;
use puckboard_server::AppState;
use puckboard_server::auth::encode_token;
use puckboard_server::routes::analytics;
use puckboard_server::routes::clips;
use puckboard_server::routes::query;
use serde_json::Value;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Division slate: seven complete teams plus one with no special-teams data.
fn division_rows() -> Vec<DivisionGameRow> {
    let mut rows = Vec::new();
    for team in ["BOS", "TOR", "FLA", "TBL", "BUF", "DET", "OTT"] {
        for day in 1..=4 {
            rows.push(DivisionGameRow {
                team: team.to_string(),
                date: Some(format!("2025-01-{day:02}")),
                xgf: Some(3.0),
                xga: Some(2.5),
                points: Some(2.0),
                pp_pct: Some(21.0),
                pk_pct: Some(79.0),
                gf_5v5: Some(2.0),
                ga_5v5: Some(2.0),
                result: Some("W".to_string()),
            });
        }
    }
    for day in 1..=4 {
        rows.push(DivisionGameRow {
            team: "MTL".to_string(),
            date: Some(format!("2025-01-{day:02}")),
            xgf: Some(2.8),
            xga: Some(2.9),
            points: Some(1.0),
            pp_pct: None,
            pk_pct: None,
            gf_5v5: Some(2.0),
            ga_5v5: Some(2.2),
            result: Some("L".to_string()),
        });
    }
    rows
}

/// Builds serving state with an in-memory clip store and synthetic metrics.
fn state_with_media(clips_dir: Option<std::path::PathBuf>) -> Arc<AppState> {
    let mut config = PuckboardConfig::default();
    config.media.database_url = Some("sqlite://:memory:".to_string());
    config.media.clips_dir = clips_dir;
    let mut state = AppState::from_config(config).expect("state");
    state.metrics_data = Arc::new(puckboard_server::state::MetricsDataset {
        player_games: Vec::new(),
        team_games: Vec::new(),
        division_games: division_rows(),
    });
    Arc::new(state)
}

/// Seeds one ready clip with the given ids.
fn seed_clip(store: &ClipStore, clip_id: &str, player_id: &str) {
    let clip = ClipRecord {
        internal_pk: 0,
        clip_id: clip_id.to_string(),
        player_id: player_id.to_string(),
        player_name: "Nick Suzuki".to_string(),
        team_code: "MTL".to_string(),
        opponent_code: "BOS".to_string(),
        game_id: "2024020500".to_string(),
        game_date: "2025-01-15".to_string(),
        season: "2024-2025".to_string(),
        period: 2,
        event_type: "goal".to_string(),
        outcome: "scored".to_string(),
        zone: "oz".to_string(),
        start_s: 0.0,
        end_s: 12.0,
        duration_s: 12.0,
        source_uri: String::new(),
        processing_status: ProcessingStatus::Pending,
        created_ts: 100,
        updated_ts: 100,
    };
    store.insert_clip(&clip).expect("insert");
    store.update_status(clip_id, ProcessingStatus::Ready, 101).expect("ready");
}

/// Bearer headers for a dev principal.
fn auth_headers(username: &str, secret: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", encode_token(username, secret)))
            .expect("header"),
    );
    headers
}

/// Reads a JSON body from a response.
async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

// ============================================================================
// SECTION: Clarification Gate (scenario: short input)
// ============================================================================

#[tokio::test]
async fn short_query_returns_clarification_with_no_tool_results() {
    let state = state_with_media(None);
    let response = query::process_query(
        State(state),
        Query(query::CommonParams::default()),
        auth_headers("analyst_hughes", "analyst2024"),
        Json(query::QueryRequest {
            query: "hi".to_string(),
            mode: None,
            model: None,
            conversation_id: None,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["query_type"], "clarification");
    assert_eq!(body["warnings"], serde_json::json!(["clarification_required"]));
    assert_eq!(body["tool_results"], serde_json::json!([]));
}

// ============================================================================
// SECTION: Advanced Analytics NaN Guard (scenario: missing special teams)
// ============================================================================

#[tokio::test]
async fn advanced_bundle_has_eight_finite_rti_rows_and_zero_st_for_missing_team() {
    let state = state_with_media(None);
    let response = analytics::mtl_advanced(
        State(state),
        Query(serde_json::from_str("{}").expect("params")),
        auth_headers("coach_martin", "coach2024"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let rows = body["rival_threat_index"].as_array().expect("rows");
    assert_eq!(rows.len(), 8);
    for row in rows {
        assert!(row["rti_score"].is_number(), "rti_score must be finite: {row}");
    }
    let mtl = rows.iter().find(|row| row["team"] == "MTL").expect("MTL row");
    assert_eq!(mtl["special_teams_net"], 0.0);
}

#[tokio::test]
async fn advanced_bundle_serves_304_on_matching_validator() {
    let state = state_with_media(None);
    let first = analytics::mtl_advanced(
        State(Arc::clone(&state)),
        Query(serde_json::from_str("{}").expect("params")),
        auth_headers("coach_martin", "coach2024"),
    )
    .await;
    let etag = first
        .headers()
        .get(header::ETAG)
        .expect("etag")
        .to_str()
        .expect("str")
        .to_string();

    let mut headers = auth_headers("coach_martin", "coach2024");
    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_str(&etag).expect("header"));
    let second = analytics::mtl_advanced(
        State(state),
        Query(serde_json::from_str("{}").expect("params")),
        headers,
    )
    .await;
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
}

// ============================================================================
// SECTION: Clip RBAC (scenario: player ownership)
// ============================================================================

#[tokio::test]
async fn player_sees_own_clip_and_is_forbidden_from_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state_with_media(Some(dir.path().to_path_buf()));
    let store = state.clips.as_ref().expect("store");
    // Metadata carries a float-formatted id; the policy normalizes it.
    seed_clip(store, "own-clip", "8480018.0");
    seed_clip(store, "other-clip", "8481540");
    std::fs::write(dir.path().join("own-clip.mp4"), vec![1_u8; 4096]).expect("file");

    let own = clips::serve_video(
        State(Arc::clone(&state)),
        Path("own-clip".to_string()),
        Query(clips::ClipListParams::default()),
        auth_headers("player_suzuki", "player2024"),
    )
    .await;
    assert_eq!(own.status(), StatusCode::OK);

    let other = clips::serve_video(
        State(Arc::clone(&state)),
        Path("other-clip".to_string()),
        Query(clips::ClipListParams::default()),
        auth_headers("player_suzuki", "player2024"),
    )
    .await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);

    // Absent clip: not_found decides before the policy.
    let absent = clips::serve_video(
        State(state),
        Path("missing".to_string()),
        Query(clips::ClipListParams::default()),
        auth_headers("player_suzuki", "player2024"),
    )
    .await;
    assert_eq!(absent.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// SECTION: Range Streaming (scenario: bytes 1000-1999 of 1,048,577)
// ============================================================================

#[tokio::test]
async fn range_request_returns_206_with_exact_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state_with_media(Some(dir.path().to_path_buf()));
    seed_clip(state.clips.as_ref().expect("store"), "ranged", "8480018");
    let payload: Vec<u8> = (0..=255_u8).cycle().take(1_048_577).collect();
    let mut file =
        std::fs::File::create(dir.path().join("ranged.mp4")).expect("file");
    file.write_all(&payload).expect("write");

    let mut headers = auth_headers("coach_martin", "coach2024");
    headers.insert(header::RANGE, HeaderValue::from_static("bytes=1000-1999"));
    let response = clips::serve_video(
        State(Arc::clone(&state)),
        Path("ranged".to_string()),
        Query(clips::ClipListParams::default()),
        headers,
    )
    .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(header::CONTENT_RANGE).expect("range").to_str().unwrap(),
        "bytes 1000-1999/1048577"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).expect("length").to_str().unwrap(),
        "1000"
    );
    assert_eq!(
        response.headers().get(header::ACCEPT_RANGES).expect("accept").to_str().unwrap(),
        "bytes"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.len(), 1000);
    assert_eq!(&bytes[..], &payload[1000..2000]);
}

#[tokio::test]
async fn open_ended_and_malformed_ranges_follow_the_fallback_contract() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = state_with_media(Some(dir.path().to_path_buf()));
    seed_clip(state.clips.as_ref().expect("store"), "fallback", "8480018");
    let size = 4096_usize;
    std::fs::write(dir.path().join("fallback.mp4"), vec![9_u8; size]).expect("file");

    // `bytes=0-` is a satisfiable range covering the whole file.
    let mut headers = auth_headers("coach_martin", "coach2024");
    headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-"));
    let response = clips::serve_video(
        State(Arc::clone(&state)),
        Path("fallback".to_string()),
        Query(clips::ClipListParams::default()),
        headers,
    )
    .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(header::CONTENT_RANGE).expect("range").to_str().unwrap(),
        format!("bytes 0-{}/{}", size - 1, size)
    );
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).expect("length").to_str().unwrap(),
        size.to_string()
    );

    // A malformed spec falls back to a 200 with the full file.
    let mut headers = auth_headers("coach_martin", "coach2024");
    headers.insert(header::RANGE, HeaderValue::from_static("bytes=zz-top"));
    let response = clips::serve_video(
        State(state),
        Path("fallback".to_string()),
        Query(clips::ClipListParams::default()),
        headers,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCEPT_RANGES).expect("accept").to_str().unwrap(),
        "bytes"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.len(), size);
}

// ============================================================================
// SECTION: Conversation Isolation (scenario: cross-user access)
// ============================================================================

#[tokio::test]
async fn conversations_are_isolated_between_users() {
    let state = state_with_media(None);

    // User A creates a conversation by asking a question.
    let created = query::process_query(
        State(Arc::clone(&state)),
        Query(query::CommonParams::default()),
        auth_headers("analyst_hughes", "analyst2024"),
        Json(query::QueryRequest {
            query: "how is the team power play trending".to_string(),
            mode: None,
            model: None,
            conversation_id: None,
        }),
    )
    .await;
    let body = json_body(created).await;
    let conversation_id =
        body["conversation_id"].as_str().expect("conversation id").to_string();

    // User B cannot rename it: not_found, never forbidden.
    let foreign = query::rename_conversation(
        State(Arc::clone(&state)),
        Path(conversation_id.clone()),
        Query(query::CommonParams::default()),
        auth_headers("coach_martin", "coach2024"),
        Json(query::RenameRequest {
            title: "Stolen".to_string(),
        }),
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    // The owner cannot use an empty title.
    let empty = query::rename_conversation(
        State(Arc::clone(&state)),
        Path(conversation_id.clone()),
        Query(query::CommonParams::default()),
        auth_headers("analyst_hughes", "analyst2024"),
        Json(query::RenameRequest {
            title: "   ".to_string(),
        }),
    )
    .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    // A real rename lands and is visible on a subsequent get.
    let renamed = query::rename_conversation(
        State(Arc::clone(&state)),
        Path(conversation_id.clone()),
        Query(query::CommonParams::default()),
        auth_headers("analyst_hughes", "analyst2024"),
        Json(query::RenameRequest {
            title: "Matchup notes".to_string(),
        }),
    )
    .await;
    assert_eq!(renamed.status(), StatusCode::OK);

    let fetched = query::get_conversation(
        State(Arc::clone(&state)),
        Path(conversation_id.clone()),
        Query(query::CommonParams::default()),
        auth_headers("analyst_hughes", "analyst2024"),
    )
    .await;
    let body = json_body(fetched).await;
    assert_eq!(body["conversation"]["title"], "Matchup notes");

    // User B sees no conversations at all, and deleting foreign ids 404s.
    let listed = query::list_conversations(
        State(Arc::clone(&state)),
        Query(query::CommonParams::default()),
        auth_headers("coach_martin", "coach2024"),
    )
    .await;
    let body = json_body(listed).await;
    assert_eq!(body["conversations"], serde_json::json!([]));

    let foreign_delete = query::delete_conversation(
        State(state),
        Path(conversation_id),
        Query(query::CommonParams::default()),
        auth_headers("coach_martin", "coach2024"),
    )
    .await;
    assert_eq!(foreign_delete.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// SECTION: Auth Surface
// ============================================================================

#[tokio::test]
async fn unauthenticated_requests_carry_the_bearer_challenge() {
    let state = state_with_media(None);
    let response = query::list_conversations(
        State(state),
        Query(query::CommonParams::default()),
        HeaderMap::new(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).expect("challenge").to_str().unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn clip_listing_applies_rbac_per_row() {
    let state = state_with_media(None);
    let store = state.clips.as_ref().expect("store");
    seed_clip(store, "own", "8480018");
    seed_clip(store, "other", "8481540");

    let listed = clips::list_clips_v1(
        State(Arc::clone(&state)),
        Query(clips::ClipListParams::default()),
        auth_headers("player_suzuki", "player2024"),
    )
    .await;
    let body = json_body(listed).await;
    let rows = body["clips"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["clip_id"], "own");

    let all = clips::list_clips_v1(
        State(state),
        Query(clips::ClipListParams::default()),
        auth_headers("scout_lapointe", "scout2024"),
    )
    .await;
    let body = json_body(all).await;
    assert_eq!(body["clips"].as_array().expect("rows").len(), 2);
}
