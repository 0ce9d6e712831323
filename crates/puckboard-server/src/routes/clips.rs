// crates/puckboard-server/src/routes/clips.rs
// ============================================================================
// Module: Clip Routes
// Description: v1 file-index and v2 relational clip delivery.
// Purpose: Enforce RBAC and serve clip metadata, thumbnails, and bytes.
// Dependencies: axum, crate::state, puckboard-media
// ============================================================================

//! ## Overview
//! Clip endpoints resolve metadata, enforce the single access policy, and
//! deliver bytes. Existence decides the error first: a truly absent clip is
//! `not_found`; an existing clip the user may not see is `forbidden`. Byte
//! serving prefers an HLS playlist and falls back to MP4 with full range
//! support: a valid `Range` yields `206` with `Content-Range` and an exact
//! `Content-Length`; malformed specs fall back to a full-file `200`. Both
//! shapes advertise `Accept-Ranges: bytes`. The v2 surface additionally
//! signs asset URLs at response time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path as FsPath;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use puckboard_core::ApiError;
use puckboard_core::User;
use puckboard_media::ByteRange;
use puckboard_media::ClipAccess;
use puckboard_media::ClipRecord;
use puckboard_media::ClipStore;
use puckboard_media::ClipStoreError;
use puckboard_media::ListClipsFilter;
use puckboard_media::ProcessingStatus;
use puckboard_media::check_clip_access;
use puckboard_media::content_type_for_path;
use puckboard_media::parse_range_header;
use puckboard_media::range::stream_file_range;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::auth::resolve_user;
use crate::auth::resolve_user_permissive;
use crate::responses::error_response;
use crate::state::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache policy for media byte responses.
const MEDIA_CACHE_CONTROL: &str = "public, max-age=3600";

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// List filters accepted by both clip surfaces.
#[derive(Debug, Default, Deserialize)]
pub struct ClipListParams {
    /// Filter by featured player id.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Filter by team abbreviation.
    #[serde(default)]
    pub team_code: Option<String>,
    /// Filter by game id.
    #[serde(default)]
    pub game_id: Option<String>,
    /// Filter by event type.
    #[serde(default)]
    pub event_type: Option<String>,
    /// Filter by processing status.
    #[serde(default)]
    pub status: Option<String>,
    /// Row limit (1..=500).
    #[serde(default)]
    pub limit: Option<usize>,
    /// Pagination offset.
    #[serde(default)]
    pub offset: Option<usize>,
    /// Media token for the permissive resolver.
    #[serde(default)]
    pub token: Option<String>,
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

impl ClipListParams {
    /// Converts the parameters into a store filter.
    fn filter(&self) -> Result<ListClipsFilter, ApiError> {
        let status = match self.status.as_deref() {
            Some(raw) => Some(
                ProcessingStatus::parse(raw)
                    .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {raw}")))?,
            ),
            None => None,
        };
        Ok(ListClipsFilter {
            player_id: self.player_id.clone(),
            team_code: self.team_code.clone().map(|team| team.to_ascii_uppercase()),
            game_id: self.game_id.clone(),
            event_type: self.event_type.clone(),
            status,
            limit: self.limit.unwrap_or(100).clamp(1, 500),
            offset: self.offset.unwrap_or(0),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fetches the clip store or reports the surface unavailable.
fn clip_store(state: &AppState) -> Result<Arc<ClipStore>, Response> {
    state
        .clips
        .clone()
        .ok_or_else(|| error_response(&ApiError::service_unavailable("Media database not configured"), 0))
}

/// Resolves a clip and enforces the access policy; existence decides first.
fn resolve_clip_checked(
    store: &ClipStore,
    state: &AppState,
    user: &User,
    clip_id: &str,
) -> Result<ClipRecord, Response> {
    let clip = match store.get_by_clip_id(clip_id) {
        Ok(clip) => clip,
        Err(ClipStoreError::NotFound(_)) => {
            return Err(error_response(&ApiError::not_found("Clip not found"), 0));
        }
        Err(error) => return Err(error_response(&error.into_api_error(), 0)),
    };
    if check_clip_access(user, &clip, state.clips_open_access()) == ClipAccess::Deny {
        return Err(error_response(&ApiError::forbidden("Access denied to this clip"), 0));
    }
    Ok(clip)
}

/// Shapes a clip row for the v1 listing.
fn clip_v1_json(clip: &ClipRecord) -> serde_json::Value {
    serde_json::json!({
        "clip_id": clip.clip_id,
        "player_id": clip.player_id,
        "player_name": clip.player_name,
        "team_code": clip.team_code,
        "opponent_code": clip.opponent_code,
        "game_id": clip.game_id,
        "game_date": clip.game_date,
        "period": clip.period,
        "event_type": clip.event_type,
        "duration_s": clip.duration_s,
        "processing_status": clip.processing_status,
        "video_url": format!("/api/v1/clips/{}/video", clip.clip_id),
        "thumbnail_url": format!("/api/v1/clips/{}/thumbnail", clip.clip_id),
    })
}

/// Locates the local media file for a clip asset kind.
///
/// Local development keeps generated files under the clips directory as
/// `{clip_id}.{ext}`; `file://` asset URIs are honored as-is.
fn local_media_path(
    state: &AppState,
    clip: &ClipRecord,
    storage_uri: Option<&str>,
    extension: &str,
) -> Option<PathBuf> {
    if let Some(uri) = storage_uri
        && let Some(path) = uri.strip_prefix("file://")
    {
        return Some(PathBuf::from(path));
    }
    state
        .clips_dir
        .as_ref()
        .map(|dir| dir.join(format!("{}.{extension}", clip.clip_id)))
}

// ============================================================================
// SECTION: Byte Serving
// ============================================================================

/// Serves a local file honoring an optional `Range` header.
async fn serve_file_with_ranges(
    path: &FsPath,
    range_header: Option<&str>,
    filename: &str,
) -> Response {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(_) => return error_response(&ApiError::not_found("Video file not found"), 0),
    };
    let file_size = metadata.len();
    let content_type = content_type_for_path(path);

    let (status, range) = match parse_range_header(range_header, file_size) {
        Some(range) => (StatusCode::PARTIAL_CONTENT, range),
        // Absent or malformed specs fall back to the full file.
        None if file_size == 0 => {
            return error_response(&ApiError::not_found("Video file empty"), 0);
        }
        None => (
            StatusCode::OK,
            ByteRange {
                start: 0,
                end: file_size - 1,
            },
        ),
    };

    let receiver = match stream_file_range(path, range).await {
        Ok(receiver) => receiver,
        Err(error) => return error_response(&ApiError::internal(error.to_string()), 0),
    };
    let body = Body::from_stream(
        ReceiverStream::new(receiver)
            .map(|chunk| chunk.map_err(|error| std::io::Error::other(error.to_string()))),
    );

    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(MEDIA_CACHE_CONTROL));
    if let Ok(value) = HeaderValue::from_str(&range.length().to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("inline; filename={filename}")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if status == StatusCode::PARTIAL_CONTENT
        && let Ok(value) = HeaderValue::from_str(&range.content_range(file_size))
    {
        headers.insert(header::CONTENT_RANGE, value);
    }
    response
}

// ============================================================================
// SECTION: v1 Handlers
// ============================================================================

/// `GET /api/v1/clips`.
pub async fn list_clips_v1(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    let user = match resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        Ok(user) => user,
        Err(error) => return error_response(&error, 0),
    };
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let filter = match params.filter() {
        Ok(filter) => filter,
        Err(error) => return error_response(&error, 0),
    };
    match store.list_clips(&filter) {
        Ok(clips) => {
            let visible: Vec<serde_json::Value> = clips
                .iter()
                .filter(|clip| {
                    check_clip_access(&user, clip, state.clips_open_access())
                        == ClipAccess::Allow
                })
                .map(clip_v1_json)
                .collect();
            Json(serde_json::json!({"clips": visible, "total": visible.len()})).into_response()
        }
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/clips/stats`.
pub async fn clip_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(error) = resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        return error_response(&error, 0);
    }
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    match store.stats() {
        Ok(stats) => Json(serde_json::json!({"success": true, "stats": stats})).into_response(),
        Err(error) => error_response(&error.into_api_error(), 0),
    }
}

/// `GET /api/v1/clips/{id}/metadata`.
pub async fn clip_metadata(
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<String>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    let user = match resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        Ok(user) => user,
        Err(error) => return error_response(&error, 0),
    };
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let clip = match resolve_clip_checked(&store, &state, &user, &clip_id) {
        Ok(clip) => clip,
        Err(response) => return response,
    };
    Json(serde_json::json!({"success": true, "clip": clip_v1_json(&clip)})).into_response()
}

/// `GET /api/v1/clips/{id}/video` — permissive auth, HLS preferred, MP4
/// range fallback.
pub async fn serve_video(
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<String>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    let user = match resolve_user_permissive(
        &state.principals,
        &headers,
        params.token.as_deref(),
        params.tz.as_deref(),
        state.clips_open_access(),
    ) {
        Ok(user) => user,
        Err(error) => return error_response(&error, 0),
    };
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let clip = match resolve_clip_checked(&store, &state, &user, &clip_id) {
        Ok(clip) => clip,
        Err(response) => return response,
    };
    let assets = store.assets_for(&clip_id).unwrap_or_default();

    // Prefer the HLS playlist when one exists locally.
    if let Some(playlist) = assets.iter().find(|asset| asset.kind == "hls_playlist")
        && let Some(path) =
            local_media_path(&state, &clip, Some(playlist.storage_uri.as_str()), "m3u8")
        && path.exists()
    {
        return serve_file_with_ranges(&path, None, &format!("{clip_id}.m3u8")).await;
    }

    let mp4_uri = assets
        .iter()
        .find(|asset| asset.kind == "mp4")
        .map(|asset| asset.storage_uri.clone());
    let Some(path) = local_media_path(&state, &clip, mp4_uri.as_deref(), "mp4") else {
        return error_response(&ApiError::not_found("Video file not found"), 0);
    };
    let range_header =
        headers.get(header::RANGE).and_then(|value| value.to_str().ok());
    serve_file_with_ranges(&path, range_header, &format!("{clip_id}.mp4")).await
}

/// `GET /api/v1/clips/{id}/thumbnail` — permissive auth.
pub async fn serve_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<String>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    let user = match resolve_user_permissive(
        &state.principals,
        &headers,
        params.token.as_deref(),
        params.tz.as_deref(),
        state.clips_open_access(),
    ) {
        Ok(user) => user,
        Err(error) => return error_response(&error, 0),
    };
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let clip = match resolve_clip_checked(&store, &state, &user, &clip_id) {
        Ok(clip) => clip,
        Err(response) => return response,
    };
    let assets = store.assets_for(&clip_id).unwrap_or_default();
    let thumb_uri = assets
        .iter()
        .find(|asset| asset.kind == "thumbnail")
        .map(|asset| asset.storage_uri.clone());
    let Some(path) = local_media_path(&state, &clip, thumb_uri.as_deref(), "jpg") else {
        return error_response(&ApiError::not_found("Thumbnail not found"), 0);
    };
    serve_file_with_ranges(&path, None, &format!("{clip_id}.jpg")).await
}

// ============================================================================
// SECTION: v2 Handlers
// ============================================================================

/// Shapes a clip with assets and signed URLs for the v2 surface.
async fn clip_v2_json(
    state: &AppState,
    store: &ClipStore,
    clip: &ClipRecord,
) -> serde_json::Value {
    let assets = store.assets_for(&clip.clip_id).unwrap_or_default();
    let tags = store.tags_for(&clip.clip_id).unwrap_or_default();
    let ttl = Duration::from_secs(state.config.media.signed_url_ttl_minutes * 60);
    let mut asset_values = Vec::with_capacity(assets.len());
    for asset in &assets {
        let signed_url = match &state.signer {
            Some(signer) => signer.presign_get(&asset.storage_uri, ttl).await.ok(),
            None => None,
        };
        let mut value = serde_json::to_value(asset).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("signed_url".to_string(), serde_json::json!(signed_url));
        }
        asset_values.push(value);
    }
    serde_json::json!({
        "clip": clip,
        "assets": asset_values,
        "tags": tags,
    })
}

/// `GET /api/v2/clips`.
pub async fn list_clips_v2(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    let user = match resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        Ok(user) => user,
        Err(error) => return error_response(&error, 0),
    };
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let filter = match params.filter() {
        Ok(filter) => filter,
        Err(error) => return error_response(&error, 0),
    };
    let clips = match store.list_clips(&filter) {
        Ok(clips) => clips,
        Err(error) => return error_response(&error.into_api_error(), 0),
    };
    let mut results = Vec::new();
    for clip in clips
        .iter()
        .filter(|clip| check_clip_access(&user, clip, state.clips_open_access()) == ClipAccess::Allow)
    {
        results.push(clip_v2_json(&state, &store, clip).await);
    }
    Json(serde_json::json!({
        "clips": results,
        "total": results.len(),
        "limit": filter.limit,
        "offset": filter.offset,
    }))
    .into_response()
}

/// `GET /api/v2/clips/{id}`.
pub async fn get_clip_v2(
    State(state): State<Arc<AppState>>,
    Path(clip_id): Path<String>,
    Query(params): Query<ClipListParams>,
    headers: HeaderMap,
) -> Response {
    let user = match resolve_user(&state.principals, &headers, params.tz.as_deref()) {
        Ok(user) => user,
        Err(error) => return error_response(&error, 0),
    };
    let store = match clip_store(&state) {
        Ok(store) => store,
        Err(response) => return response,
    };
    let clip = match resolve_clip_checked(&store, &state, &user, &clip_id) {
        Ok(clip) => clip,
        Err(response) => return response,
    };
    let payload = clip_v2_json(&state, &store, &clip).await;
    Json(serde_json::json!({"success": true, "clip": payload})).into_response()
}
