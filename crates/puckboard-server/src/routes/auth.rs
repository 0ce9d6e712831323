// crates/puckboard-server/src/routes/auth.rs
// ============================================================================
// Module: Auth Routes
// Description: Login, logout, and verification endpoints.
// Purpose: Issue opaque tokens and report the authenticated principal.
// Dependencies: axum, crate::auth, crate::state
// ============================================================================

//! ## Overview
//! Login validates a `username`/`password` pair against the principal table
//! and returns the opaque token with a one-hour advisory lifetime. Logout
//! and verify are informational: sessions are stateless, so logout merely
//! acknowledges and verify echoes the resolved principal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;

use crate::auth::encode_token;
use crate::auth::resolve_user;
use crate::responses::error_response;
use crate::state::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Advisory token lifetime in seconds.
const TOKEN_LIFETIME_SECS: u64 = 3_600;

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Shared secret.
    pub password: String,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /api/v1/auth/login`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    match state.principals.authenticate(&body.username, &body.password) {
        Ok(user) => Json(serde_json::json!({
            "success": true,
            "access_token": encode_token(&body.username, &body.password),
            "user_info": {
                "username": user.user_id,
                "name": user.display_name,
                "role": user.role.as_str(),
                "team_access": user.team_access,
            },
            "expires_in": TOKEN_LIFETIME_SECS,
        }))
        .into_response(),
        Err(error) => error_response(&error, 0),
    }
}

/// `POST /api/v1/auth/logout` (informational; sessions are stateless).
pub async fn logout() -> Response {
    Json(serde_json::json!({
        "success": true,
        "message": "Logged out",
    }))
    .into_response()
}

/// `GET /api/v1/auth/verify`.
pub async fn verify(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match resolve_user(&state.principals, &headers, None) {
        Ok(user) => Json(serde_json::json!({
            "success": true,
            "user": {
                "username": user.user_id,
                "name": user.display_name,
                "role": user.role.as_str(),
                "team_access": user.team_access,
            },
        }))
        .into_response(),
        Err(error) => error_response(&error, 0),
    }
}
