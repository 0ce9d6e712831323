// crates/puckboard-server/src/routes/query.rs
// ============================================================================
// Module: Query Routes
// Description: Query processing, SSE streaming, and conversation APIs.
// Purpose: Expose the orchestrator over the stable query surface.
// Dependencies: axum, crate::state, puckboard-orchestrator, tokio-stream
// ============================================================================

//! ## Overview
//! `POST /query` (and its trailing-slash twin) runs the orchestrator
//! pipeline and returns the sanitized envelope. `POST /query/stream` serves
//! the same pipeline as server-sent events whose final event is always the
//! assembled response. Conversation endpoints are owner-scoped: foreign ids
//! resolve as `not_found`, empty rename titles as `bad_request`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use puckboard_core::ApiError;
use puckboard_core::ConversationId;
use puckboard_core::ConversationStoreError;
use puckboard_core::User;
use puckboard_core::sanitize::sanitized;
use puckboard_orchestrator::QueryOptions;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::auth::resolve_user;
use crate::responses::error_response;
use crate::state::AppState;

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// Query request body.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Query text.
    pub query: String,
    /// Fast-mode override (passthrough).
    #[serde(default)]
    pub mode: Option<String>,
    /// Explicit model override (passthrough).
    #[serde(default)]
    pub model: Option<String>,
    /// Conversation to append to.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl QueryRequest {
    /// Converts the body into orchestrator options.
    fn options(&self) -> QueryOptions {
        QueryOptions {
            mode: self.mode.clone(),
            model: self.model.clone(),
            conversation_id: self.conversation_id.clone().map(ConversationId::new),
        }
    }
}

/// Rename request body.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New title.
    #[serde(default)]
    pub title: String,
}

/// Common query-string parameters (timezone only).
#[derive(Debug, Default, Deserialize)]
pub struct CommonParams {
    /// Optional timezone override.
    #[serde(default)]
    pub tz: Option<String>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the strict user or renders the auth failure.
fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    params: &CommonParams,
) -> Result<User, Response> {
    resolve_user(&state.principals, headers, params.tz.as_deref())
        .map_err(|error| error_response(&error, 0))
}

/// Maps conversation store failures onto the wire taxonomy.
fn store_error_response(error: &ConversationStoreError) -> Response {
    let api_error = match error {
        ConversationStoreError::NotFound => ApiError::not_found("Conversation not found"),
        ConversationStoreError::Invalid(message) => ApiError::bad_request(message.clone()),
        ConversationStoreError::Storage(message) => ApiError::internal(message.clone()),
    };
    error_response(&api_error, 0)
}

// ============================================================================
// SECTION: Query Handlers
// ============================================================================

/// `POST /api/v1/query` and `POST /api/v1/query/`.
pub async fn process_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
    Json(body): Json<QueryRequest>,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let response =
        state.orchestrator.process_query(&body.query, &user, &body.options()).await;
    let payload = serde_json::to_value(&response)
        .map(sanitized)
        .unwrap_or_else(|_| serde_json::json!({"success": false}));
    Json(payload).into_response()
}

/// `POST /api/v1/query/stream` (server-sent events).
pub async fn stream_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
    Json(body): Json<QueryRequest>,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let receiver = state.orchestrator.process_query_streaming(
        body.query.clone(),
        user,
        body.options(),
    );
    let stream = ReceiverStream::new(receiver).map(|event| {
        let payload = serde_json::to_value(&event)
            .map(sanitized)
            .unwrap_or_else(|_| serde_json::json!({"type": "error"}));
        Ok::<Event, Infallible>(Event::default().data(payload.to_string()))
    });
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

// ============================================================================
// SECTION: Conversation Handlers
// ============================================================================

/// `GET /api/v1/query/conversations`.
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.orchestrator.store().list(&user) {
        Ok(conversations) => {
            let items: Vec<serde_json::Value> =
                conversations.iter().map(puckboard_core::Conversation::summary).collect();
            Json(serde_json::json!({"success": true, "conversations": items})).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

/// `POST /api/v1/query/conversations/new`.
pub async fn new_conversation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.orchestrator.store().create(&user, "New conversation") {
        Ok(conversation) => Json(serde_json::json!({
            "success": true,
            "conversation_id": conversation.conversation_id,
        }))
        .into_response(),
        Err(error) => store_error_response(&error),
    }
}

/// `GET /api/v1/query/conversations/{id}`.
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.orchestrator.store().get(&user, &ConversationId::new(id)) {
        Ok(conversation) => {
            Json(serde_json::json!({"success": true, "conversation": conversation}))
                .into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

/// `PUT /api/v1/query/conversations/{id}/rename`.
pub async fn rename_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
    Json(body): Json<RenameRequest>,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.orchestrator.store().rename(&user, &ConversationId::new(id), &body.title) {
        Ok(()) => Json(serde_json::json!({
            "success": true,
            "message": "Conversation renamed successfully",
        }))
        .into_response(),
        Err(error) => store_error_response(&error),
    }
}

/// `DELETE /api/v1/query/conversations/{id}`.
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<CommonParams>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticate(&state, &headers, &params) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.orchestrator.store().delete(&user, &ConversationId::new(id)) {
        Ok(()) => Json(serde_json::json!({
            "success": true,
            "message": "Conversation deleted successfully",
        }))
        .into_response(),
        Err(error) => store_error_response(&error),
    }
}
