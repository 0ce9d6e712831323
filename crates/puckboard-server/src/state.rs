// crates/puckboard-server/src/state.rs
// ============================================================================
// Module: Application State
// Description: Shared serving state built from configuration.
// Purpose: Wire caches, stores, clients, and the orchestrator together.
// Dependencies: puckboard-* crates
// ============================================================================

//! ## Overview
//! [`AppState`] owns everything handlers need: the principal table, the TTL
//! cache, the upstream NHL client, the market snapshot store, the optional
//! clip store and URL signer, loaded metric datasets, and the orchestrator
//! with its registered tools. Construction is fail-closed: configuration is
//! validated before anything is built.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use puckboard_cache::TtlCache;
use puckboard_config::ConfigError;
use puckboard_config::PuckboardConfig;
use puckboard_core::ConversationStore;
use puckboard_core::UrlSigner;
use puckboard_market::MarketStore;
use puckboard_media::ClipStore;
use puckboard_metrics::DivisionGameRow;
use puckboard_metrics::PlayerGameRow;
use puckboard_metrics::TeamGameRow;
use puckboard_nhl::NhlClient;
use puckboard_orchestrator::InMemoryConversationStore;
use puckboard_orchestrator::Orchestrator;
use puckboard_orchestrator::ToolRegistry;
use serde::Deserialize;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::auth::PrincipalTable;
use crate::tools::register_default_tools;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// State construction errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// Configuration failed validation.
    #[error("configuration invalid: {0}")]
    Config(#[from] ConfigError),
    /// Upstream client could not be built.
    #[error("upstream client build failed: {0}")]
    Upstream(String),
    /// A snapshot or store failed to open.
    #[error("store initialization failed: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Metric Datasets
// ============================================================================

/// Columnar game-log datasets consumed by the metrics engine.
#[derive(Debug, Default)]
pub struct MetricsDataset {
    /// Player-game rows for the focus team.
    pub player_games: Vec<PlayerGameRow>,
    /// Team-game rows for the focus team.
    pub team_games: Vec<TeamGameRow>,
    /// Division-team rows for the rival threat index.
    pub division_games: Vec<DivisionGameRow>,
}

impl MetricsDataset {
    /// Loads the datasets from a snapshot directory; missing files load as
    /// empty tables.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Store`] when a present file fails to decode.
    pub fn load_from_dir(dir: &Path) -> Result<Self, StateError> {
        /// Reads one optional dataset file.
        fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StateError> {
            if !path.exists() {
                return Ok(Vec::new());
            }
            let raw = std::fs::read_to_string(path)
                .map_err(|err| StateError::Store(err.to_string()))?;
            serde_json::from_str(&raw)
                .map_err(|err| StateError::Store(format!("{}: {err}", path.display())))
        }
        Ok(Self {
            player_games: read_rows(&dir.join("mtl_player_games.json"))?,
            team_games: read_rows(&dir.join("mtl_team_games.json"))?,
            division_games: read_rows(&dir.join("division_games.json"))?,
        })
    }
}

// ============================================================================
// SECTION: App State
// ============================================================================

/// Shared serving state.
pub struct AppState {
    /// Validated configuration.
    pub config: PuckboardConfig,
    /// Principal table for both resolvers.
    pub principals: PrincipalTable,
    /// Process-local TTL cache.
    pub cache: Arc<TtlCache>,
    /// Upstream NHL client.
    pub nhl: Arc<NhlClient>,
    /// Market snapshot store.
    pub market: Arc<MarketStore>,
    /// Clip metadata store when `DATABASE_URL` is configured.
    pub clips: Option<Arc<ClipStore>>,
    /// Asset URL signer when object storage is configured.
    pub signer: Option<Arc<dyn UrlSigner>>,
    /// Metric datasets.
    pub metrics_data: Arc<MetricsDataset>,
    /// Local directory for v1 generated clip files.
    pub clips_dir: Option<PathBuf>,
    /// Conversational orchestrator.
    pub orchestrator: Arc<Orchestrator>,
    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    /// Builds the state from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when validation or any build step fails.
    pub fn from_config(config: PuckboardConfig) -> Result<Self, StateError> {
        config.validate()?;

        let principal_configs = if config.auth.principals.is_empty() {
            PuckboardConfig::dev_principals()
        } else {
            config.auth.principals.clone()
        };
        let principals = PrincipalTable::from_config(&principal_configs);

        let cache = Arc::new(TtlCache::new());
        let nhl = Arc::new(
            NhlClient::new(
                config.nhl.base_url.clone(),
                Duration::from_secs(config.nhl.timeout_secs),
                Arc::clone(&cache),
            )
            .map_err(|err| StateError::Upstream(err.to_string()))?,
        );

        let market = Arc::new(match &config.market.data_dir {
            Some(dir) => MarketStore::load_from_dir(dir)
                .map_err(|err| StateError::Store(err.to_string()))?,
            None => MarketStore::default(),
        });

        let clips = match &config.media.database_url {
            Some(url) => {
                let path = url.strip_prefix("sqlite://").unwrap_or(url);
                let store = if path == ":memory:" {
                    ClipStore::open_in_memory()
                } else {
                    ClipStore::open(Path::new(path))
                }
                .map_err(|err| StateError::Store(err.to_string()))?;
                Some(Arc::new(store))
            }
            None => None,
        };

        let metrics_data = Arc::new(match &config.market.data_dir {
            Some(dir) => MetricsDataset::load_from_dir(dir)?,
            None => MetricsDataset::default(),
        });

        let mut registry = ToolRegistry::new();
        register_default_tools(
            &mut registry,
            Arc::clone(&metrics_data),
            clips.clone(),
            &config,
        );
        let conversations: Arc<dyn ConversationStore> =
            Arc::new(InMemoryConversationStore::new());
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(registry),
            conversations,
            Duration::from_secs(config.orchestrator.fanout_deadline_secs),
        ));

        Ok(Self {
            clips_dir: config.media.clips_dir.clone(),
            config,
            principals,
            cache,
            nhl,
            market,
            clips,
            signer: None,
            metrics_data,
            orchestrator,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Attaches an asset URL signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn UrlSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Attaches an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns true when clip RBAC is bypassed by the dev flag.
    #[must_use]
    pub const fn clips_open_access(&self) -> bool {
        self.config.auth.clips_open_access
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
