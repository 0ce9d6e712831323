// crates/puckboard-metrics/src/trends.rs
// ============================================================================
// Module: Team Trends
// Description: Rolling xGF%, special teams, pace, and PDO indicators.
// Purpose: Summarize recent team momentum with NaN-safe defaults.
// Dependencies: crate::rows, crate::stats, serde
// ============================================================================

//! ## Overview
//! Team trends roll over the most recent `window` games: expected-goals
//! share (50 when undefined), special-teams net against the 20/80 league
//! baseline, pace as CF/60 and CA/60 with the CF% share, and PDO with its
//! sustainability banding (hot above 102, cold below 98).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::rows::TeamGameRow;
use crate::stats::mean;
use crate::stats::round1;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// League-average power-play percentage baseline.
const LEAGUE_PP_PCT: f64 = 20.0;
/// League-average penalty-kill percentage baseline.
const LEAGUE_PK_PCT: f64 = 80.0;
/// Default shot-attempt pace when the log carries no Corsi columns.
const DEFAULT_PACE_PER60: f64 = 60.0;
/// Default shooting percentage for PDO.
const DEFAULT_SH_PCT: f64 = 10.0;
/// Default save percentage for PDO.
const DEFAULT_SV_PCT: f64 = 90.0;
/// PDO band edges.
const PDO_HOT: f64 = 102.0;
/// Lower PDO band edge.
const PDO_COLD: f64 = 98.0;

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// PDO sustainability banding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdoStatus {
    /// PDO above 102; results likely outrunning the underlying play.
    Hot,
    /// PDO below 98; results likely lagging the underlying play.
    Cold,
    /// PDO within the sustainable band.
    Sustainable,
}

/// Shot-attempt pace block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pace {
    /// Shot attempts for per 60.
    pub cf_per60: f64,
    /// Shot attempts against per 60.
    pub ca_per60: f64,
    /// Attempt share, 50 when undefined.
    pub cf_pct: f64,
}

/// PDO block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pdo {
    /// Shooting % plus save %.
    pub value: f64,
    /// Shooting percentage component.
    pub shooting_pct: f64,
    /// Save percentage component.
    pub save_pct: f64,
    /// Sustainability banding.
    pub status: PdoStatus,
}

/// Rolling team trend summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamTrends {
    /// Games included in the rolling window.
    pub window_games: usize,
    /// Rolling expected-goals share.
    pub xgf_pct_rolling: f64,
    /// Special-teams net against the 20/80 baseline.
    pub special_teams_net: f64,
    /// Pace block.
    pub pace: Pace,
    /// PDO block.
    pub pdo: Pdo,
}

impl TeamTrends {
    /// Neutral trends for an empty log.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            window_games: 0,
            xgf_pct_rolling: 50.0,
            special_teams_net: 0.0,
            pace: Pace {
                cf_per60: DEFAULT_PACE_PER60,
                ca_per60: DEFAULT_PACE_PER60,
                cf_pct: 50.0,
            },
            pdo: Pdo {
                value: 100.0,
                shooting_pct: DEFAULT_SH_PCT,
                save_pct: DEFAULT_SV_PCT,
                status: PdoStatus::Sustainable,
            },
        }
    }
}

// ============================================================================
// SECTION: Computation
// ============================================================================

/// Mean of the present, finite values; `default` when none exist.
fn mean_or(values: impl Iterator<Item = Option<f64>>, default: f64) -> f64 {
    let present: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if present.is_empty() { default } else { mean(&present) }
}

/// Computes rolling team trends over the most recent `window` games.
#[must_use]
pub fn compute_team_trends(rows: &[TeamGameRow], window: usize) -> TeamTrends {
    if rows.is_empty() || window == 0 {
        return TeamTrends::empty();
    }
    let mut recent: Vec<&TeamGameRow> = rows.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(window);

    let xgf_total: f64 = recent.iter().filter_map(|row| row.xgf).filter(|v| v.is_finite()).sum();
    let xga_total: f64 = recent.iter().filter_map(|row| row.xga).filter(|v| v.is_finite()).sum();
    let xgf_pct = if xgf_total + xga_total > 0.0 {
        xgf_total / (xgf_total + xga_total) * 100.0
    } else {
        50.0
    };

    let pp_pct = mean_or(recent.iter().map(|row| row.pp_pct), LEAGUE_PP_PCT);
    let pk_pct = mean_or(recent.iter().map(|row| row.pk_pct), LEAGUE_PK_PCT);
    let special_teams_net = pp_pct + pk_pct - 100.0;

    let cf_per60 = mean_or(recent.iter().map(|row| row.cf_per60), DEFAULT_PACE_PER60);
    let ca_per60 = mean_or(recent.iter().map(|row| row.ca_per60), DEFAULT_PACE_PER60);
    let cf_pct = if cf_per60 + ca_per60 > 0.0 {
        cf_per60 / (cf_per60 + ca_per60) * 100.0
    } else {
        50.0
    };

    let shooting_pct = mean_or(recent.iter().map(|row| row.sh_pct), DEFAULT_SH_PCT);
    let save_pct = mean_or(recent.iter().map(|row| row.sv_pct), DEFAULT_SV_PCT);
    let pdo_value = shooting_pct + save_pct;
    let status = if pdo_value > PDO_HOT {
        PdoStatus::Hot
    } else if pdo_value < PDO_COLD {
        PdoStatus::Cold
    } else {
        PdoStatus::Sustainable
    };

    TeamTrends {
        window_games: recent.len().min(window),
        xgf_pct_rolling: round1(xgf_pct),
        special_teams_net: round1(special_teams_net),
        pace: Pace {
            cf_per60: round1(cf_per60),
            ca_per60: round1(ca_per60),
            cf_pct: round1(cf_pct),
        },
        pdo: Pdo {
            value: round1(pdo_value),
            shooting_pct: round1(shooting_pct),
            save_pct: round1(save_pct),
            status,
        },
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
