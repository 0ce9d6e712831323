// crates/puckboard-nhl/src/client.rs
// ============================================================================
// Module: NHL Upstream Client
// Description: Cached read-through wrappers over the upstream NHL API.
// Purpose: One bounded, validated, cache-fronted path per upstream endpoint.
// Dependencies: puckboard-core, puckboard-cache, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`NhlClient`] owns the outbound HTTP client (bounded timeout, redirects
//! followed) and the TTL cache fronting each surface. Every wrapper follows
//! the same sequence: validate inputs, consult cache, fetch, validate shape,
//! normalize, store. Failures map to the serving taxonomy via
//! [`UpstreamError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use puckboard_cache::CacheSurface;
use puckboard_cache::TtlCache;
use puckboard_core::ApiError;
use puckboard_core::GameDate;
use puckboard_core::GameId;
use puckboard_core::PlayerId;
use puckboard_core::TeamCode;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::normalize::normalize_standings;
use crate::normalize::team_summary_from_standings;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum redirects followed on the upstream surface.
const MAX_REDIRECTS: usize = 5;
/// User agent presented upstream.
const USER_AGENT: &str = "puckboard/0.1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upstream failure classification.
///
/// # Invariants
/// - Variants are stable; [`UpstreamError::into_api_error`] defines the wire
///   mapping.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream did not answer within the bounded timeout.
    #[error("upstream timed out")]
    Timeout,
    /// Connection-level failure.
    #[error("upstream network failure: {0}")]
    Network(String),
    /// Upstream answered with a non-2xx status.
    #[error("upstream status {0}")]
    Status(u16),
    /// Body was not the expected JSON shape.
    #[error("upstream response invalid: {0}")]
    InvalidResponse(String),
    /// Client construction failed.
    #[error("upstream client build failed: {0}")]
    ClientBuild(String),
}

impl UpstreamError {
    /// Maps this failure onto the serving error taxonomy.
    ///
    /// The remote status is preserved in the message for logs while the
    /// client sees a uniform `bad_gateway`.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Timeout => ApiError::gateway_timeout("Request to NHL API timed out"),
            Self::Network(detail) => {
                ApiError::bad_gateway(format!("Network error communicating with NHL API: {detail}"))
            }
            Self::Status(status) => {
                ApiError::bad_gateway(format!("NHL API returned status {status}"))
            }
            Self::InvalidResponse(detail) => {
                ApiError::bad_gateway(format!("NHL API returned an invalid body: {detail}"))
                    .with_code("invalid_response")
            }
            Self::ClientBuild(detail) => ApiError::internal(detail),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Cached read-through client for the upstream NHL API.
pub struct NhlClient {
    /// Upstream base URL without trailing slash.
    base_url: String,
    /// Outbound HTTP client with bounded timeout.
    http: Client,
    /// TTL cache shared across wrappers.
    cache: Arc<TtlCache>,
}

impl NhlClient {
    /// Creates a client for the given base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::ClientBuild`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        cache: Arc<TtlCache>,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|err| UpstreamError::ClientBuild(err.to_string()))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            base_url,
            http,
            cache,
        })
    }

    /// Issues a GET and decodes the JSON body.
    async fn fetch_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/{path}", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|err| {
            if err.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Network(err.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| UpstreamError::InvalidResponse(err.to_string()))
    }

    /// Runs the cache-fetch-validate-store sequence for one surface.
    async fn cached_fetch(
        &self,
        surface: CacheSurface,
        cache_params: &str,
        path: &str,
        required_key: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let key = surface.key(cache_params);
        if let Some(hit) = self.cache.get_if_fresh(&key) {
            return Ok(hit);
        }
        let body = self.fetch_json(path).await?;
        if let Some(required) = required_key
            && body.get(required).is_none()
        {
            return Err(UpstreamError::InvalidResponse(format!(
                "missing required key: {required}"
            )));
        }
        self.cache.put(key, body.clone(), surface.ttl());
        Ok(body)
    }

    /// Daily scoreboard for a date.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn scores(&self, date: &GameDate) -> Result<Value, UpstreamError> {
        let wire = date.as_wire();
        self.cached_fetch(CacheSurface::LiveScores, &wire, &format!("score/{wire}"), Some("games"))
            .await
    }

    /// Daily schedule for a date (served from the score surface upstream).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn schedule(&self, date: &GameDate) -> Result<Value, UpstreamError> {
        let wire = date.as_wire();
        self.cached_fetch(CacheSurface::Schedule, &wire, &format!("score/{wire}"), Some("games"))
            .await
    }

    /// Normalized standings for a date, sorted by the standings tie-break.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn standings(&self, date: &GameDate) -> Result<Value, UpstreamError> {
        let wire = date.as_wire();
        let key = CacheSurface::Standings.key(&wire);
        if let Some(hit) = self.cache.get_if_fresh(&key) {
            return Ok(hit);
        }
        let body = self.fetch_json(&format!("standings/{wire}")).await?;
        if !body.is_object() {
            return Err(UpstreamError::InvalidResponse("standings body not an object".to_string()));
        }
        let normalized = json!({
            "success": true,
            "standings": normalize_standings(&body),
            "date": wire,
            "source": "NHL API",
        });
        self.cache.put(key, normalized.clone(), CacheSurface::Standings.ttl());
        Ok(normalized)
    }

    /// Basic team record/stats derived from the standings surface.
    ///
    /// Returns `Ok(None)` when the team is absent from the standings.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn team_summary(
        &self,
        date: &GameDate,
        team: &TeamCode,
    ) -> Result<Option<Value>, UpstreamError> {
        let standings = self.standings(date).await?;
        let rows = standings
            .get("standings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(team_summary_from_standings(&rows, team.as_str()))
    }

    /// Skater leaders for a category.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn leaders(&self, category: &str, limit: u32) -> Result<Value, UpstreamError> {
        let safe_category = match category {
            "points" | "goals" | "assists" | "wins" | "savePctg" => category,
            _ => "points",
        };
        self.cached_fetch(
            CacheSurface::Leaders,
            &format!("{safe_category}:{limit}"),
            &format!("skater-stats-leaders/current?categories={safe_category}&limit={limit}"),
            None,
        )
        .await
    }

    /// Gamecenter boxscore.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn boxscore(&self, game_id: GameId) -> Result<Value, UpstreamError> {
        self.fetch_json(&format!("gamecenter/{game_id}/boxscore")).await
    }

    /// Gamecenter play-by-play.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn play_by_play(&self, game_id: GameId) -> Result<Value, UpstreamError> {
        self.fetch_json(&format!("gamecenter/{game_id}/play-by-play")).await
    }

    /// Gamecenter landing page.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn game_landing(&self, game_id: GameId) -> Result<Value, UpstreamError> {
        self.fetch_json(&format!("gamecenter/{game_id}/landing")).await
    }

    /// Player landing profile.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn player_landing(&self, player_id: &PlayerId) -> Result<Value, UpstreamError> {
        self.cached_fetch(
            CacheSurface::PlayerLanding,
            player_id.as_str(),
            &format!("player/{player_id}/landing"),
            None,
        )
        .await
    }

    /// Player game log for a season and game type.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn player_game_log(
        &self,
        player_id: &PlayerId,
        season_code: &str,
        game_type: u8,
    ) -> Result<Value, UpstreamError> {
        self.fetch_json(&format!("player/{player_id}/game-log/{season_code}/{game_type}")).await
    }

    /// Current roster for a team.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on upstream failure.
    pub async fn roster(&self, team: &TeamCode) -> Result<Value, UpstreamError> {
        self.fetch_json(&format!("roster/{}/current", team.as_str())).await
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use super::UpstreamError;
    use puckboard_core::ErrorKind;

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let error = UpstreamError::Timeout.into_api_error();
        assert_eq!(error.kind, ErrorKind::GatewayTimeout);
    }

    #[test]
    fn upstream_status_maps_to_bad_gateway_preserving_status() {
        let error = UpstreamError::Status(503).into_api_error();
        assert_eq!(error.kind, ErrorKind::BadGateway);
        assert!(error.message.contains("503"));
    }

    #[test]
    fn malformed_body_carries_invalid_response_code() {
        let error = UpstreamError::InvalidResponse("not json".to_string()).into_api_error();
        assert_eq!(error.kind, ErrorKind::BadGateway);
        assert_eq!(error.code, Some("invalid_response"));
    }
}
