// crates/puckboard-metrics/src/rows.rs
// ============================================================================
// Module: Metric Input Rows
// Description: Typed rows for player, team, and division game logs.
// Purpose: Decode columnar snapshots permissively for the metric pipelines.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Input rows for the metrics engine. Columnar exports are uneven: fields go
//! missing per game and time-on-ice alternates between `MM:SS` strings and
//! numeric minutes. Every field is therefore optional with
//! the defaults applied inside the pipelines, and TOI is captured raw for
//! [`crate::toi::parse_toi_minutes`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Raw TOI
// ============================================================================

/// Raw time-on-ice value as it appears in exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawToi {
    /// `MM:SS` or stringified minutes.
    Text(String),
    /// Numeric minutes.
    Number(f64),
}

// ============================================================================
// SECTION: Player Game Rows
// ============================================================================

/// One player-game log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameRow {
    /// Player display name (grouping key).
    pub player_name: String,
    /// Game date (`YYYY-MM-DD`), used only for recency ordering.
    #[serde(default)]
    pub date: Option<String>,
    /// Raw time on ice.
    #[serde(default)]
    pub toi: Option<RawToi>,
    /// Even-strength primary points in the game.
    #[serde(default)]
    pub ev_points: Option<f64>,
    /// Individual expected goals in the game.
    #[serde(default)]
    pub ixg: Option<f64>,
    /// Shot assists in the game.
    #[serde(default)]
    pub shot_assists: Option<f64>,
    /// Controlled entries leading to shots in the game.
    #[serde(default)]
    pub controlled_entries: Option<f64>,
    /// On-ice expected-goals share, already a percentage.
    #[serde(default)]
    pub xgf_pct: Option<f64>,
}

// ============================================================================
// SECTION: Team Game Rows
// ============================================================================

/// One team-game log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRow {
    /// Game date (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: Option<String>,
    /// Expected goals for.
    #[serde(default)]
    pub xgf: Option<f64>,
    /// Expected goals against.
    #[serde(default)]
    pub xga: Option<f64>,
    /// Power-play percentage in the game.
    #[serde(default)]
    pub pp_pct: Option<f64>,
    /// Penalty-kill percentage in the game.
    #[serde(default)]
    pub pk_pct: Option<f64>,
    /// Shot attempts for per 60.
    #[serde(default)]
    pub cf_per60: Option<f64>,
    /// Shot attempts against per 60.
    #[serde(default)]
    pub ca_per60: Option<f64>,
    /// Team shooting percentage.
    #[serde(default)]
    pub sh_pct: Option<f64>,
    /// Team save percentage.
    #[serde(default)]
    pub sv_pct: Option<f64>,
}

// ============================================================================
// SECTION: Division Game Rows
// ============================================================================

/// One division-team game row used by the rival threat index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionGameRow {
    /// Team abbreviation (grouping key).
    pub team: String,
    /// Game date (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: Option<String>,
    /// Expected goals for.
    #[serde(default)]
    pub xgf: Option<f64>,
    /// Expected goals against.
    #[serde(default)]
    pub xga: Option<f64>,
    /// Standings points earned in the game.
    #[serde(default)]
    pub points: Option<f64>,
    /// Power-play percentage in the game.
    #[serde(default)]
    pub pp_pct: Option<f64>,
    /// Penalty-kill percentage in the game.
    #[serde(default)]
    pub pk_pct: Option<f64>,
    /// Five-on-five goals for.
    #[serde(default)]
    pub gf_5v5: Option<f64>,
    /// Five-on-five goals against.
    #[serde(default)]
    pub ga_5v5: Option<f64>,
    /// Game result label (`W`/`L`/`OTL`) when present.
    #[serde(default)]
    pub result: Option<String>,
}
