// crates/puckboard-config/src/lib.rs
// ============================================================================
// Module: Puckboard Configuration
// Description: Environment and TOML configuration with fail-closed validation.
// Purpose: Centralize every deployment knob consumed by the serving process.
// Dependencies: puckboard-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is assembled from an optional TOML file overlaid with the
//! well-known environment variables (`DATABASE_URL`, `MEDIA_GCS_BUCKET`,
//! `MEDIA_CDN_DOMAIN`, `CLIPS_OPEN_ACCESS`, `MARKET_DISABLE_BIGQUERY`,
//! `VECTOR_BACKEND`). [`PuckboardConfig::validate`] fails closed: a config
//! that passes validation is safe to serve with.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use puckboard_core::Role;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default bind address for the HTTP surface.
const DEFAULT_BIND: &str = "127.0.0.1:8000";
/// Default upstream NHL API base URL.
const DEFAULT_NHL_BASE: &str = "https://api-web.nhle.com/v1";
/// Default upstream timeout in seconds.
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
/// Default orchestrator fan-out deadline in seconds.
const DEFAULT_FANOUT_DEADLINE_SECS: u64 = 30;
/// Maximum accepted signed-URL lifetime in minutes.
const MAX_SIGNED_URL_TTL_MINUTES: u64 = 60;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Messages are stable enough for tests to match on substrings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config file unreadable: {0}")]
    Io(String),
    /// Config file failed to parse.
    #[error("config parse failure: {0}")]
    Parse(String),
    /// A setting failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed CORS origins; empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: Vec::new(),
        }
    }
}

/// One seeded principal in the in-memory table.
#[derive(Debug, Clone, Deserialize)]
pub struct PrincipalConfig {
    /// Username presented in the token.
    pub username: String,
    /// Shared secret presented in the token.
    pub secret: String,
    /// Principal role label.
    pub role: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Team abbreviations this principal may read.
    #[serde(default)]
    pub team_access: Vec<String>,
    /// NHL player id for player principals.
    #[serde(default)]
    pub player_id: Option<String>,
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Seeded principal table.
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
    /// Dev override: bypass clip RBAC entirely (`CLIPS_OPEN_ACCESS=1`).
    #[serde(default)]
    pub clips_open_access: bool,
}

/// Media storage settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaConfig {
    /// Relational database URL (`DATABASE_URL`); SQLite path in this build.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Object-storage bucket holding clip assets (`MEDIA_GCS_BUCKET`).
    #[serde(default)]
    pub bucket: Option<String>,
    /// Optional CDN domain for public asset paths (`MEDIA_CDN_DOMAIN`).
    #[serde(default)]
    pub cdn_domain: Option<String>,
    /// Local directory holding generated clip files for the v1 index.
    #[serde(default)]
    pub clips_dir: Option<PathBuf>,
    /// Signed-URL lifetime in minutes (max 60).
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_minutes: u64,
}

/// Returns the default signed-URL lifetime.
const fn default_signed_url_ttl() -> u64 {
    MAX_SIGNED_URL_TTL_MINUTES
}

/// Market analytics settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketConfig {
    /// Directory of columnar snapshot tables.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Disable the warehouse path and read snapshots only
    /// (`MARKET_DISABLE_BIGQUERY=1`).
    #[serde(default)]
    pub disable_warehouse: bool,
}

/// Upstream NHL API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NhlConfig {
    /// Upstream base URL.
    #[serde(default = "default_nhl_base")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

/// Returns the default NHL base URL.
fn default_nhl_base() -> String {
    DEFAULT_NHL_BASE.to_string()
}

/// Returns the default upstream timeout.
const fn default_upstream_timeout() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_SECS
}

impl Default for NhlConfig {
    fn default() -> Self {
        Self {
            base_url: default_nhl_base(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

/// Vector search settings (`VECTOR_BACKEND` and endpoint variables).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VectorConfig {
    /// Backend label (`pinecone`, `vertex`, or empty for disabled).
    #[serde(default)]
    pub backend: Option<String>,
    /// Backend endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Backend index name.
    #[serde(default)]
    pub index: Option<String>,
}

/// Orchestrator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Global tool fan-out deadline in seconds.
    #[serde(default = "default_fanout_deadline")]
    pub fanout_deadline_secs: u64,
}

/// Returns the default fan-out deadline.
const fn default_fanout_deadline() -> u64 {
    DEFAULT_FANOUT_DEADLINE_SECS
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fanout_deadline_secs: default_fanout_deadline(),
        }
    }
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Full configuration for the serving process.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PuckboardConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Media storage settings.
    #[serde(default)]
    pub media: MediaConfig,
    /// Market analytics settings.
    #[serde(default)]
    pub market: MarketConfig,
    /// Upstream NHL API settings.
    #[serde(default)]
    pub nhl: NhlConfig,
    /// Vector search settings.
    #[serde(default)]
    pub vector: VectorConfig,
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl PuckboardConfig {
    /// Loads a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] on failure.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overlays well-known environment variables onto the config.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("DATABASE_URL")
            && !value.is_empty()
        {
            self.media.database_url = Some(value);
        }
        if let Ok(value) = std::env::var("MEDIA_GCS_BUCKET")
            && !value.is_empty()
        {
            self.media.bucket = Some(value);
        }
        if let Ok(value) = std::env::var("MEDIA_CDN_DOMAIN")
            && !value.is_empty()
        {
            self.media.cdn_domain = Some(value);
        }
        if let Ok(value) = std::env::var("CLIPS_OPEN_ACCESS") {
            self.auth.clips_open_access = value == "1";
        }
        if let Ok(value) = std::env::var("MARKET_DISABLE_BIGQUERY") {
            self.market.disable_warehouse = value == "1";
        }
        if let Ok(value) = std::env::var("VECTOR_BACKEND")
            && !value.is_empty()
        {
            self.vector.backend = Some(value);
        }
        self
    }

    /// Validates the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first failed constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server bind is not a socket address: {}",
                self.server.bind
            )));
        }
        if self.nhl.timeout_secs == 0 || self.nhl.timeout_secs > 30 {
            return Err(ConfigError::Invalid(
                "nhl timeout_secs must be within 1..=30".to_string(),
            ));
        }
        if self.orchestrator.fanout_deadline_secs == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator fanout_deadline_secs must be greater than zero".to_string(),
            ));
        }
        if self.media.signed_url_ttl_minutes == 0
            || self.media.signed_url_ttl_minutes > MAX_SIGNED_URL_TTL_MINUTES
        {
            return Err(ConfigError::Invalid(format!(
                "media signed_url_ttl_minutes must be within 1..={MAX_SIGNED_URL_TTL_MINUTES}"
            )));
        }
        let mut seen = BTreeSet::new();
        for principal in &self.auth.principals {
            if principal.username.is_empty() || principal.secret.is_empty() {
                return Err(ConfigError::Invalid(
                    "principal username and secret must be non-empty".to_string(),
                ));
            }
            if Role::parse(&principal.role).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "principal role unknown: {}",
                    principal.role
                )));
            }
            if !seen.insert(principal.username.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate principal username: {}",
                    principal.username
                )));
            }
        }
        Ok(())
    }

    /// Returns the seeded development principal table.
    ///
    /// Used when no principals are configured; mirrors the five staff
    /// accounts the frontend expects.
    #[must_use]
    pub fn dev_principals() -> Vec<PrincipalConfig> {
        let mtl = vec!["MTL".to_string()];
        vec![
            PrincipalConfig {
                username: "coach_martin".to_string(),
                secret: "coach2024".to_string(),
                role: "coach".to_string(),
                display_name: "Martin St-Louis".to_string(),
                team_access: mtl.clone(),
                player_id: None,
            },
            PrincipalConfig {
                username: "analyst_hughes".to_string(),
                secret: "analyst2024".to_string(),
                role: "analyst".to_string(),
                display_name: "Kent Hughes".to_string(),
                team_access: mtl.clone(),
                player_id: None,
            },
            PrincipalConfig {
                username: "player_suzuki".to_string(),
                secret: "player2024".to_string(),
                role: "player".to_string(),
                display_name: "Nick Suzuki".to_string(),
                team_access: mtl.clone(),
                player_id: Some("8480018".to_string()),
            },
            PrincipalConfig {
                username: "scout_lapointe".to_string(),
                secret: "scout2024".to_string(),
                role: "scout".to_string(),
                display_name: "Martin Lapointe".to_string(),
                team_access: mtl.clone(),
                player_id: None,
            },
            PrincipalConfig {
                username: "staff_molson".to_string(),
                secret: "staff2024".to_string(),
                role: "staff".to_string(),
                display_name: "Geoff Molson".to_string(),
                team_access: mtl,
                player_id: None,
            },
        ]
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
