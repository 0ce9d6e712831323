// crates/puckboard-media/src/store.rs
// ============================================================================
// Module: Clip Metadata Store
// Description: Durable clip/asset/tag store backed by SQLite WAL.
// Purpose: Persist the media schema with the clip lifecycle invariants.
// Dependencies: puckboard-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements the relational `media` schema in `SQLite`: clips
//! keyed by a globally unique external `clip_id`, cascading assets with a
//! `(clip, kind, storage_uri)` uniqueness constraint, and cascading tags
//! unique per `(clip, tag)`. Status transitions are monotone
//! (pending → processing → ready) with `failed` terminal; regressions are
//! rejected as conflicts. Mutations commit atomically per operation.
//! Security posture: database contents are untrusted on load; rows are
//! validated before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;

use puckboard_core::ApiError;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the media store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum clip duration in seconds.
const MAX_CLIP_DURATION_S: f64 = 300.0;
/// Duration consistency tolerance in seconds.
const DURATION_EPSILON: f64 = 1e-6;
/// Maximum rows returned by a list call.
pub const MAX_LIST_LIMIT: usize = 500;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Clip store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ClipStoreError {
    /// Clip does not exist.
    #[error("clip not found: {0}")]
    NotFound(String),
    /// Row violates a clip invariant.
    #[error("invalid clip record: {0}")]
    Invalid(String),
    /// Status transition would regress the lifecycle.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status label.
        from: &'static str,
        /// Requested status label.
        to: &'static str,
    },
    /// Underlying database failure.
    #[error("clip store failure: {0}")]
    Storage(String),
}

impl ClipStoreError {
    /// Maps this failure onto the serving error taxonomy.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::NotFound(detail) => ApiError::not_found(detail),
            Self::Invalid(detail) => ApiError::bad_request(detail),
            Self::InvalidTransition {
                ..
            } => ApiError::new(puckboard_core::ErrorKind::Conflict, self.to_string()),
            Self::Storage(detail) => ApiError::internal(detail),
        }
    }
}

impl From<rusqlite::Error> for ClipStoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

// ============================================================================
// SECTION: Processing Status
// ============================================================================

/// Clip processing lifecycle status.
///
/// # Invariants
/// - Transitions are monotone except `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Awaiting processing.
    Pending,
    /// Processing in progress.
    Processing,
    /// Ready to serve.
    Ready,
    /// Processing failed; terminal.
    Failed,
}

impl ProcessingStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Parses a status label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Lifecycle rank used for the monotone check.
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Ready => 2,
            Self::Failed => 3,
        }
    }

    /// Returns true when a transition to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if matches!(self, Self::Failed) {
            return false;
        }
        if matches!(next, Self::Failed) {
            return true;
        }
        next.rank() >= self.rank()
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// One clip metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Internal primary key; 0 before insertion.
    #[serde(default)]
    pub internal_pk: i64,
    /// Globally unique external identifier.
    pub clip_id: String,
    /// Featured player id.
    pub player_id: String,
    /// Featured player name.
    pub player_name: String,
    /// Team abbreviation.
    pub team_code: String,
    /// Opponent abbreviation.
    pub opponent_code: String,
    /// Source game identifier.
    pub game_id: String,
    /// Game date (`YYYY-MM-DD`).
    pub game_date: String,
    /// Season (`YYYY-YYYY`).
    pub season: String,
    /// Game period.
    pub period: i64,
    /// Event type label.
    pub event_type: String,
    /// Event outcome label.
    pub outcome: String,
    /// Ice zone label.
    pub zone: String,
    /// Clip start offset in source seconds.
    pub start_s: f64,
    /// Clip end offset in source seconds.
    pub end_s: f64,
    /// Clip duration in seconds; equals `end_s - start_s`.
    pub duration_s: f64,
    /// Source video URI.
    pub source_uri: String,
    /// Processing lifecycle status.
    pub processing_status: ProcessingStatus,
    /// Creation time (unix seconds).
    pub created_ts: i64,
    /// Last update time (unix seconds).
    pub updated_ts: i64,
}

impl ClipRecord {
    /// Validates the duration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::Invalid`] when duration is inconsistent,
    /// non-positive, or above the cap.
    pub fn validate(&self) -> Result<(), ClipStoreError> {
        let span = self.end_s - self.start_s;
        if (span - self.duration_s).abs() > DURATION_EPSILON {
            return Err(ClipStoreError::Invalid(format!(
                "duration {} does not match end-start {span}",
                self.duration_s
            )));
        }
        if self.duration_s <= 0.0 || self.duration_s > MAX_CLIP_DURATION_S {
            return Err(ClipStoreError::Invalid(format!(
                "duration out of range: {}",
                self.duration_s
            )));
        }
        Ok(())
    }
}

/// One clip asset row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipAssetRecord {
    /// Asset primary key; 0 before insertion.
    #[serde(default)]
    pub asset_id: i64,
    /// Owning clip's external id.
    pub clip_id: String,
    /// Asset kind (`mp4`, `hls_playlist`, `hls_segment`, `thumbnail`,
    /// `thumbnail_grid`, `dash_manifest`).
    pub kind: String,
    /// Object-storage URI.
    pub storage_uri: String,
    /// Optional CDN path.
    #[serde(default)]
    pub cdn_path: Option<String>,
    /// Object size in bytes.
    pub size_bytes: i64,
    /// Media duration when applicable.
    #[serde(default)]
    pub duration_s: Option<f64>,
    /// Pixel width when applicable.
    #[serde(default)]
    pub width: Option<i64>,
    /// Pixel height when applicable.
    #[serde(default)]
    pub height: Option<i64>,
    /// Codec label when applicable.
    #[serde(default)]
    pub codec: Option<String>,
    /// Bitrate in kbps when applicable.
    #[serde(default)]
    pub bitrate_kbps: Option<i64>,
}

/// One clip tag row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipTagRecord {
    /// Owning clip's external id.
    pub clip_id: String,
    /// Tag value.
    pub tag: String,
    /// Optional tag type.
    #[serde(default)]
    pub tag_type: Option<String>,
    /// Optional model confidence.
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Filters for clip listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListClipsFilter {
    /// Filter by featured player id.
    pub player_id: Option<String>,
    /// Filter by team abbreviation.
    pub team_code: Option<String>,
    /// Filter by game id.
    pub game_id: Option<String>,
    /// Filter by event type.
    pub event_type: Option<String>,
    /// Filter by processing status.
    pub status: Option<ProcessingStatus>,
    /// Maximum rows (clamped to [`MAX_LIST_LIMIT`]).
    pub limit: usize,
    /// Pagination offset.
    pub offset: usize,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable clip store backed by `SQLite`.
pub struct ClipStore {
    /// Guarded connection; mutations commit per operation.
    connection: Mutex<Connection>,
}

impl ClipStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::Storage`] when the database cannot be
    /// opened or migrated.
    pub fn open(path: &Path) -> Result<Self, ClipStoreError> {
        let connection = Connection::open(path)?;
        Self::initialize(connection)
    }

    /// Opens an in-memory store (tests and dev mode).
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::Storage`] when initialization fails.
    pub fn open_in_memory() -> Result<Self, ClipStoreError> {
        let connection = Connection::open_in_memory()?;
        Self::initialize(connection)
    }

    /// Applies pragmas and the schema.
    fn initialize(connection: Connection) -> Result<Self, ClipStoreError> {
        connection.pragma_update(None, "journal_mode", "wal")?;
        connection.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS.to_string())?;
        connection.pragma_update(None, "foreign_keys", "on")?;
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS clips (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                clip_id TEXT NOT NULL UNIQUE,
                player_id TEXT NOT NULL,
                player_name TEXT NOT NULL,
                team_code TEXT NOT NULL,
                opponent_code TEXT NOT NULL,
                game_id TEXT NOT NULL,
                game_date TEXT NOT NULL,
                season TEXT NOT NULL,
                period INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                outcome TEXT NOT NULL,
                zone TEXT NOT NULL,
                start_s REAL NOT NULL,
                end_s REAL NOT NULL,
                duration_s REAL NOT NULL,
                source_uri TEXT NOT NULL,
                processing_status TEXT NOT NULL,
                created_ts INTEGER NOT NULL,
                updated_ts INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_clips_player ON clips (player_id);
            CREATE INDEX IF NOT EXISTS idx_clips_game ON clips (game_id);
            CREATE TABLE IF NOT EXISTS clip_assets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                clip_fk INTEGER NOT NULL REFERENCES clips (id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                storage_uri TEXT NOT NULL,
                cdn_path TEXT,
                size_bytes INTEGER NOT NULL,
                duration_s REAL,
                width INTEGER,
                height INTEGER,
                codec TEXT,
                bitrate_kbps INTEGER,
                UNIQUE (clip_fk, kind, storage_uri)
            );
            CREATE TABLE IF NOT EXISTS clip_tags (
                clip_fk INTEGER NOT NULL REFERENCES clips (id) ON DELETE CASCADE,
                tag TEXT NOT NULL,
                tag_type TEXT,
                confidence REAL,
                UNIQUE (clip_fk, tag)
            );",
        )?;
        connection.pragma_update(None, "user_version", SCHEMA_VERSION.to_string())?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Runs a closure with the locked connection.
    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, ClipStoreError>,
    ) -> Result<T, ClipStoreError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| ClipStoreError::Storage("connection lock poisoned".to_string()))?;
        operation(&connection)
    }

    /// Inserts a validated clip and returns it with its primary key.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::Invalid`] on invariant violations and
    /// [`ClipStoreError::Storage`] on database failure (including duplicate
    /// `clip_id`).
    pub fn insert_clip(&self, clip: &ClipRecord) -> Result<ClipRecord, ClipStoreError> {
        clip.validate()?;
        self.with_connection(|connection| {
            connection.execute(
                "INSERT INTO clips (clip_id, player_id, player_name, team_code, opponent_code,
                    game_id, game_date, season, period, event_type, outcome, zone,
                    start_s, end_s, duration_s, source_uri, processing_status,
                    created_ts, updated_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19)",
                params![
                    clip.clip_id,
                    clip.player_id,
                    clip.player_name,
                    clip.team_code,
                    clip.opponent_code,
                    clip.game_id,
                    clip.game_date,
                    clip.season,
                    clip.period,
                    clip.event_type,
                    clip.outcome,
                    clip.zone,
                    clip.start_s,
                    clip.end_s,
                    clip.duration_s,
                    clip.source_uri,
                    clip.processing_status.as_str(),
                    clip.created_ts,
                    clip.updated_ts,
                ],
            )?;
            let mut stored = clip.clone();
            stored.internal_pk = connection.last_insert_rowid();
            Ok(stored)
        })
    }

    /// Fetches a clip by external id.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown ids.
    pub fn get_by_clip_id(&self, clip_id: &str) -> Result<ClipRecord, ClipStoreError> {
        self.with_connection(|connection| {
            connection
                .query_row(
                    &format!("SELECT {CLIP_COLUMNS} FROM clips WHERE clip_id = ?1"),
                    params![clip_id],
                    row_to_clip,
                )
                .optional()?
                .ok_or_else(|| ClipStoreError::NotFound(clip_id.to_string()))
        })
    }

    /// Lists clips by filters, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::Storage`] on database failure.
    pub fn list_clips(&self, filter: &ListClipsFilter) -> Result<Vec<ClipRecord>, ClipStoreError> {
        let limit = if filter.limit == 0 {
            100
        } else {
            filter.limit.min(MAX_LIST_LIMIT)
        };
        self.with_connection(|connection| {
            let mut sql =
                format!("SELECT {CLIP_COLUMNS} FROM clips WHERE 1=1");
            let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(player_id) = &filter.player_id {
                sql.push_str(" AND player_id = ?");
                bound.push(Box::new(player_id.clone()));
            }
            if let Some(team_code) = &filter.team_code {
                sql.push_str(" AND team_code = ?");
                bound.push(Box::new(team_code.clone()));
            }
            if let Some(game_id) = &filter.game_id {
                sql.push_str(" AND game_id = ?");
                bound.push(Box::new(game_id.clone()));
            }
            if let Some(event_type) = &filter.event_type {
                sql.push_str(" AND event_type = ?");
                bound.push(Box::new(event_type.clone()));
            }
            if let Some(status) = filter.status {
                sql.push_str(" AND processing_status = ?");
                bound.push(Box::new(status.as_str().to_string()));
            }
            sql.push_str(" ORDER BY created_ts DESC, id DESC LIMIT ? OFFSET ?");
            bound.push(Box::new(i64::try_from(limit).unwrap_or(100)));
            bound.push(Box::new(i64::try_from(filter.offset).unwrap_or(0)));

            let mut statement = connection.prepare(&sql)?;
            let rows = statement.query_map(
                rusqlite::params_from_iter(bound.iter().map(|value| value.as_ref())),
                row_to_clip,
            )?;
            let mut clips = Vec::new();
            for row in rows {
                clips.push(row?);
            }
            Ok(clips)
        })
    }

    /// Updates a clip's status, enforcing the monotone lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown ids and
    /// [`ClipStoreError::InvalidTransition`] on lifecycle regressions.
    pub fn update_status(
        &self,
        clip_id: &str,
        status: ProcessingStatus,
        updated_ts: i64,
    ) -> Result<ClipRecord, ClipStoreError> {
        let current = self.get_by_clip_id(clip_id)?;
        if !current.processing_status.can_transition_to(status) {
            return Err(ClipStoreError::InvalidTransition {
                from: current.processing_status.as_str(),
                to: status.as_str(),
            });
        }
        self.with_connection(|connection| {
            connection.execute(
                "UPDATE clips SET processing_status = ?1, updated_ts = ?2 WHERE clip_id = ?3",
                params![status.as_str(), updated_ts, clip_id],
            )?;
            Ok(())
        })?;
        self.get_by_clip_id(clip_id)
    }

    /// Deletes a clip; assets and tags cascade.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown ids.
    pub fn delete_clip(&self, clip_id: &str) -> Result<(), ClipStoreError> {
        self.with_connection(|connection| {
            let deleted =
                connection.execute("DELETE FROM clips WHERE clip_id = ?1", params![clip_id])?;
            if deleted == 0 {
                return Err(ClipStoreError::NotFound(clip_id.to_string()));
            }
            Ok(())
        })
    }

    /// Adds an asset to a clip.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown clips and
    /// [`ClipStoreError::Storage`] on uniqueness violations.
    pub fn add_asset(&self, asset: &ClipAssetRecord) -> Result<(), ClipStoreError> {
        let clip = self.get_by_clip_id(&asset.clip_id)?;
        self.with_connection(|connection| {
            connection.execute(
                "INSERT INTO clip_assets (clip_fk, kind, storage_uri, cdn_path, size_bytes,
                    duration_s, width, height, codec, bitrate_kbps)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    clip.internal_pk,
                    asset.kind,
                    asset.storage_uri,
                    asset.cdn_path,
                    asset.size_bytes,
                    asset.duration_s,
                    asset.width,
                    asset.height,
                    asset.codec,
                    asset.bitrate_kbps,
                ],
            )?;
            Ok(())
        })
    }

    /// Returns a clip's assets.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown clips.
    pub fn assets_for(&self, clip_id: &str) -> Result<Vec<ClipAssetRecord>, ClipStoreError> {
        let clip = self.get_by_clip_id(clip_id)?;
        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT id, kind, storage_uri, cdn_path, size_bytes, duration_s, width,
                        height, codec, bitrate_kbps
                 FROM clip_assets WHERE clip_fk = ?1 ORDER BY id",
            )?;
            let rows = statement.query_map(params![clip.internal_pk], |row| {
                Ok(ClipAssetRecord {
                    asset_id: row.get(0)?,
                    clip_id: clip_id.to_string(),
                    kind: row.get(1)?,
                    storage_uri: row.get(2)?,
                    cdn_path: row.get(3)?,
                    size_bytes: row.get(4)?,
                    duration_s: row.get(5)?,
                    width: row.get(6)?,
                    height: row.get(7)?,
                    codec: row.get(8)?,
                    bitrate_kbps: row.get(9)?,
                })
            })?;
            let mut assets = Vec::new();
            for row in rows {
                assets.push(row?);
            }
            Ok(assets)
        })
    }

    /// Adds a tag to a clip; duplicate tags are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown clips.
    pub fn add_tag(&self, tag: &ClipTagRecord) -> Result<(), ClipStoreError> {
        let clip = self.get_by_clip_id(&tag.clip_id)?;
        self.with_connection(|connection| {
            connection.execute(
                "INSERT OR IGNORE INTO clip_tags (clip_fk, tag, tag_type, confidence)
                 VALUES (?1, ?2, ?3, ?4)",
                params![clip.internal_pk, tag.tag, tag.tag_type, tag.confidence],
            )?;
            Ok(())
        })
    }

    /// Returns a clip's tags.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::NotFound`] for unknown clips.
    pub fn tags_for(&self, clip_id: &str) -> Result<Vec<ClipTagRecord>, ClipStoreError> {
        let clip = self.get_by_clip_id(clip_id)?;
        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT tag, tag_type, confidence FROM clip_tags WHERE clip_fk = ?1 ORDER BY tag",
            )?;
            let rows = statement.query_map(params![clip.internal_pk], |row| {
                Ok(ClipTagRecord {
                    clip_id: clip_id.to_string(),
                    tag: row.get(0)?,
                    tag_type: row.get(1)?,
                    confidence: row.get(2)?,
                })
            })?;
            let mut tags = Vec::new();
            for row in rows {
                tags.push(row?);
            }
            Ok(tags)
        })
    }

    /// Aggregate clip counts by event type and by player.
    ///
    /// # Errors
    ///
    /// Returns [`ClipStoreError::Storage`] on database failure.
    pub fn stats(&self) -> Result<serde_json::Value, ClipStoreError> {
        self.with_connection(|connection| {
            let total: i64 =
                connection.query_row("SELECT COUNT(*) FROM clips", [], |row| row.get(0))?;
            let mut by_event = serde_json::Map::new();
            let mut statement = connection.prepare(
                "SELECT event_type, COUNT(*) FROM clips GROUP BY event_type ORDER BY event_type",
            )?;
            let rows = statement
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (event_type, count) = row?;
                by_event.insert(event_type, serde_json::json!(count));
            }
            let mut by_player = serde_json::Map::new();
            let mut statement = connection.prepare(
                "SELECT player_name, COUNT(*) FROM clips GROUP BY player_name ORDER BY player_name",
            )?;
            let rows = statement
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (player, count) = row?;
                by_player.insert(player, serde_json::json!(count));
            }
            Ok(serde_json::json!({
                "total_clips": total,
                "by_event_type": by_event,
                "by_player": by_player,
            }))
        })
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Clip column list shared by the select statements.
const CLIP_COLUMNS: &str = "id, clip_id, player_id, player_name, team_code, opponent_code, \
     game_id, game_date, season, period, event_type, outcome, zone, start_s, end_s, \
     duration_s, source_uri, processing_status, created_ts, updated_ts";

/// Maps a clips row to a record.
fn row_to_clip(row: &rusqlite::Row<'_>) -> Result<ClipRecord, rusqlite::Error> {
    let status_raw: String = row.get(17)?;
    Ok(ClipRecord {
        internal_pk: row.get(0)?,
        clip_id: row.get(1)?,
        player_id: row.get(2)?,
        player_name: row.get(3)?,
        team_code: row.get(4)?,
        opponent_code: row.get(5)?,
        game_id: row.get(6)?,
        game_date: row.get(7)?,
        season: row.get(8)?,
        period: row.get(9)?,
        event_type: row.get(10)?,
        outcome: row.get(11)?,
        zone: row.get(12)?,
        start_s: row.get(13)?,
        end_s: row.get(14)?,
        duration_s: row.get(15)?,
        source_uri: row.get(16)?,
        processing_status: ProcessingStatus::parse(&status_raw)
            .unwrap_or(ProcessingStatus::Pending),
        created_ts: row.get(18)?,
        updated_ts: row.get(19)?,
    })
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

    use super::ClipAssetRecord;
    use super::ClipRecord;
    use super::ClipStore;
    use super::ClipStoreError;
    use super::ClipTagRecord;
    use super::ListClipsFilter;
    use super::ProcessingStatus;

    /// Builds a valid clip record.
    fn clip(clip_id: &str, player_id: &str, created_ts: i64) -> ClipRecord {
        ClipRecord {
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
            start_s: 1810.0,
            end_s: 1822.0,
            duration_s: 12.0,
            source_uri: "s3://media/games/2024020500.mp4".to_string(),
            processing_status: ProcessingStatus::Pending,
            created_ts,
            updated_ts: created_ts,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let store = ClipStore::open_in_memory().expect("store");
        let stored = store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        assert!(stored.internal_pk > 0);
        let fetched = store.get_by_clip_id("c1").expect("get");
        assert_eq!(fetched.player_name, "Nick Suzuki");
        assert!(matches!(
            store.get_by_clip_id("missing"),
            Err(ClipStoreError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_clip_ids_are_rejected() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        assert!(store.insert_clip(&clip("c1", "8480018", 101)).is_err());
    }

    #[test]
    fn duration_invariants_are_enforced() {
        let store = ClipStore::open_in_memory().expect("store");
        let mut wrong = clip("bad", "8480018", 100);
        wrong.duration_s = 99.0;
        assert!(matches!(store.insert_clip(&wrong), Err(ClipStoreError::Invalid(_))));
        let mut too_long = clip("long", "8480018", 100);
        too_long.end_s = too_long.start_s + 400.0;
        too_long.duration_s = 400.0;
        assert!(matches!(store.insert_clip(&too_long), Err(ClipStoreError::Invalid(_))));
    }

    #[test]
    fn listing_filters_and_orders_most_recent_first() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("old", "8480018", 100)).expect("insert");
        store.insert_clip(&clip("new", "8480018", 200)).expect("insert");
        let mut other = clip("other", "8481540", 150);
        other.event_type = "entry".to_string();
        store.insert_clip(&other).expect("insert");

        let all = store.list_clips(&ListClipsFilter::default()).expect("list");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].clip_id, "new");

        let suzuki = store
            .list_clips(&ListClipsFilter {
                player_id: Some("8480018".to_string()),
                ..ListClipsFilter::default()
            })
            .expect("list");
        assert_eq!(suzuki.len(), 2);

        let entries = store
            .list_clips(&ListClipsFilter {
                event_type: Some("entry".to_string()),
                ..ListClipsFilter::default()
            })
            .expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].clip_id, "other");

        let paged = store
            .list_clips(&ListClipsFilter {
                limit: 1,
                offset: 1,
                ..ListClipsFilter::default()
            })
            .expect("list");
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].clip_id, "other");
    }

    #[test]
    fn status_lifecycle_is_monotone_and_failed_is_terminal() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        store
            .update_status("c1", ProcessingStatus::Processing, 101)
            .expect("to processing");
        store.update_status("c1", ProcessingStatus::Ready, 102).expect("to ready");
        assert!(matches!(
            store.update_status("c1", ProcessingStatus::Pending, 103),
            Err(ClipStoreError::InvalidTransition { .. })
        ));
        store.update_status("c1", ProcessingStatus::Failed, 104).expect("to failed");
        assert!(matches!(
            store.update_status("c1", ProcessingStatus::Ready, 105),
            Err(ClipStoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn delete_cascades_to_assets_and_tags() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        store
            .add_asset(&ClipAssetRecord {
                asset_id: 0,
                clip_id: "c1".to_string(),
                kind: "mp4".to_string(),
                storage_uri: "s3://media/clips/c1.mp4".to_string(),
                cdn_path: None,
                size_bytes: 1_048_577,
                duration_s: Some(12.0),
                width: Some(1920),
                height: Some(1080),
                codec: Some("h264".to_string()),
                bitrate_kbps: Some(6000),
            })
            .expect("asset");
        store
            .add_tag(&ClipTagRecord {
                clip_id: "c1".to_string(),
                tag: "rush".to_string(),
                tag_type: Some("play".to_string()),
                confidence: Some(0.93),
            })
            .expect("tag");
        assert_eq!(store.assets_for("c1").expect("assets").len(), 1);
        assert_eq!(store.tags_for("c1").expect("tags").len(), 1);

        store.delete_clip("c1").expect("delete");
        assert!(store.get_by_clip_id("c1").is_err());
        assert!(matches!(store.delete_clip("c1"), Err(ClipStoreError::NotFound(_))));
    }

    #[test]
    fn asset_uniqueness_is_per_kind_and_uri() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        let asset = ClipAssetRecord {
            asset_id: 0,
            clip_id: "c1".to_string(),
            kind: "mp4".to_string(),
            storage_uri: "s3://media/clips/c1.mp4".to_string(),
            cdn_path: None,
            size_bytes: 10,
            duration_s: None,
            width: None,
            height: None,
            codec: None,
            bitrate_kbps: None,
        };
        store.add_asset(&asset).expect("first");
        assert!(store.add_asset(&asset).is_err());
        let mut other_kind = asset;
        other_kind.kind = "thumbnail".to_string();
        store.add_asset(&other_kind).expect("different kind is fine");
    }

    #[test]
    fn duplicate_tags_are_ignored_not_errors() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        let tag = ClipTagRecord {
            clip_id: "c1".to_string(),
            tag: "rush".to_string(),
            tag_type: None,
            confidence: None,
        };
        store.add_tag(&tag).expect("first");
        store.add_tag(&tag).expect("duplicate ignored");
        assert_eq!(store.tags_for("c1").expect("tags").len(), 1);
    }

    #[test]
    fn stats_aggregate_by_event_and_player() {
        let store = ClipStore::open_in_memory().expect("store");
        store.insert_clip(&clip("c1", "8480018", 100)).expect("insert");
        let mut entry = clip("c2", "8480018", 101);
        entry.event_type = "entry".to_string();
        store.insert_clip(&entry).expect("insert");
        let stats = store.stats().expect("stats");
        assert_eq!(stats["total_clips"], 2);
        assert_eq!(stats["by_event_type"]["goal"], 1);
        assert_eq!(stats["by_event_type"]["entry"], 1);
        assert_eq!(stats["by_player"]["Nick Suzuki"], 2);
    }
}
