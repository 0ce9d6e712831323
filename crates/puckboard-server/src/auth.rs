// crates/puckboard-server/src/auth.rs
// ============================================================================
// Module: Authentication and RBAC
// Description: Opaque-token resolvers over the in-memory principal table.
// Purpose: Authenticate requests strictly or permissively for media URLs.
// Dependencies: base64, puckboard-core, subtle
// ============================================================================

//! ## Overview
//! Tokens are opaque base64 of `username:secret` validated against the
//! principal table. The strict resolver requires a bearer credential; the
//! permissive resolver also accepts a `?token=` query value and, when the
//! open-access dev flag is set, returns a synthetic open-media principal
//! with full team access. Secrets compare in constant time. A timezone may
//! ride along via the `x-user-timezone`/`x-timezone`/`x-tz` headers or
//! `?tz=`; invalid values are ignored silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use puckboard_core::ApiError;
use puckboard_core::Preferences;
use puckboard_core::Role;
use puckboard_core::User;
use puckboard_config::PrincipalConfig;
use subtle::ConstantTimeEq;

// ============================================================================
// SECTION: Principal Table
// ============================================================================

/// One resolvable principal.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Shared secret.
    secret: String,
    /// Role granted at authentication.
    role: Role,
    /// Display name.
    display_name: String,
    /// Team scope.
    team_access: BTreeSet<String>,
    /// Own player id for player principals.
    player_id: Option<String>,
}

/// In-memory principal table keyed by username.
#[derive(Debug, Clone, Default)]
pub struct PrincipalTable {
    /// Principals keyed by username.
    principals: BTreeMap<String, Principal>,
}

impl PrincipalTable {
    /// Builds the table from configuration, skipping unknown roles.
    #[must_use]
    pub fn from_config(configs: &[PrincipalConfig]) -> Self {
        let mut principals = BTreeMap::new();
        for config in configs {
            let Some(role) = Role::parse(&config.role) else {
                continue;
            };
            principals.insert(
                config.username.clone(),
                Principal {
                    secret: config.secret.clone(),
                    role,
                    display_name: config.display_name.clone(),
                    team_access: config
                        .team_access
                        .iter()
                        .map(|team| team.to_ascii_uppercase())
                        .collect(),
                    player_id: config.player_id.clone(),
                },
            );
        }
        Self {
            principals,
        }
    }

    /// Validates a decoded `username:secret` pair.
    ///
    /// # Errors
    ///
    /// Returns `unauthorized (invalid_credentials)` for unknown users or
    /// wrong secrets; the comparison is constant-time either way.
    pub fn authenticate(&self, username: &str, secret: &str) -> Result<User, ApiError> {
        let Some(principal) = self.principals.get(username) else {
            // Burn a comparison anyway so unknown users cost the same.
            let _ = secret.as_bytes().ct_eq(b"missing-user-placeholder");
            return Err(ApiError::unauthorized_invalid_credentials());
        };
        let matches: bool = principal.secret.as_bytes().ct_eq(secret.as_bytes()).into();
        if !matches {
            return Err(ApiError::unauthorized_invalid_credentials());
        }
        Ok(User {
            user_id: username.to_string(),
            role: principal.role,
            display_name: principal.display_name.clone(),
            team_access: principal.team_access.clone(),
            preferences: Preferences {
                timezone: None,
                player_id: principal.player_id.clone(),
            },
        })
    }

    /// Returns the number of principals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Returns true when no principals are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

// ============================================================================
// SECTION: Token Handling
// ============================================================================

/// Encodes a `username:secret` pair into the opaque token form.
#[must_use]
pub fn encode_token(username: &str, secret: &str) -> String {
    BASE64.encode(format!("{username}:{secret}"))
}

/// Decodes an opaque token into `(username, secret)`.
///
/// # Errors
///
/// Returns `unauthorized (bad_format)` for non-base64 or unseparated
/// payloads.
pub fn decode_token(token: &str) -> Result<(String, String), ApiError> {
    let decoded =
        BASE64.decode(token.trim()).map_err(|_| ApiError::unauthorized_bad_format())?;
    let text = String::from_utf8(decoded).map_err(|_| ApiError::unauthorized_bad_format())?;
    let (username, secret) =
        text.split_once(':').ok_or_else(ApiError::unauthorized_bad_format)?;
    if username.is_empty() {
        return Err(ApiError::unauthorized_bad_format());
    }
    Ok((username.to_string(), secret.to_string()))
}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// Extracts the optional timezone from headers or the `tz` query value.
fn timezone_hint<'a>(headers: &'a HeaderMap, tz_query: Option<&'a str>) -> Option<&'a str> {
    for name in ["x-user-timezone", "x-timezone", "x-tz"] {
        if let Some(value) = headers.get(name).and_then(|value| value.to_str().ok()) {
            return Some(value);
        }
    }
    tz_query
}

// ============================================================================
// SECTION: Resolvers
// ============================================================================

/// Strict resolver: requires a bearer credential.
///
/// # Errors
///
/// Returns `unauthorized` with a sub-code describing what failed; the HTTP
/// layer attaches the `WWW-Authenticate: Bearer` challenge.
pub fn resolve_user(
    table: &PrincipalTable,
    headers: &HeaderMap,
    tz_query: Option<&str>,
) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or_else(ApiError::unauthorized_missing)?;
    let (username, secret) = decode_token(token)?;
    let mut user = table.authenticate(&username, &secret)?;
    user.apply_timezone(timezone_hint(headers, tz_query));
    Ok(user)
}

/// Permissive resolver for media URLs: also accepts a `?token=` credential
/// and honors the open-access dev flag.
///
/// # Errors
///
/// Returns `unauthorized` when neither the flag, the query token, nor a
/// bearer credential authenticates the request.
pub fn resolve_user_permissive(
    table: &PrincipalTable,
    headers: &HeaderMap,
    token_query: Option<&str>,
    tz_query: Option<&str>,
    open_access: bool,
) -> Result<User, ApiError> {
    if open_access {
        return Ok(User {
            user_id: "open_media".to_string(),
            role: Role::Staff,
            display_name: "Open Media".to_string(),
            team_access: BTreeSet::from(["ALL".to_string()]),
            preferences: Preferences::default(),
        });
    }
    if let Some(token) = token_query {
        let (username, secret) = decode_token(token)?;
        let mut user = table.authenticate(&username, &secret)?;
        user.apply_timezone(timezone_hint(headers, tz_query));
        return Ok(user);
    }
    resolve_user(table, headers, tz_query)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
