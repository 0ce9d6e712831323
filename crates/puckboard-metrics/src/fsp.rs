// crates/puckboard-metrics/src/fsp.rs
// ============================================================================
// Module: Fan Sentiment Proxy
// Description: Statistical mood indicator from team and star performance.
// Purpose: Assemble a banded 0-100 sentiment score.
// Dependencies: crate::pfi, crate::trends, serde
// ============================================================================

//! ## Overview
//! FSP starts from a neutral 50 and applies four bounded impacts: rolling
//! xGF% (`(xGF% − 50)·0.4`), special-teams net (`·0.75`), PDO banding
//! (±5), and star form (`(sum top-3 PFI / 3 − 50)·0.3`, with the fixed
//! three-way divisor even when fewer stars qualify). The result is clipped
//! to [0, 100] and banded into five sentiment labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::pfi::PlayerForm;
use crate::stats::clamp;
use crate::stats::round1;
use crate::trends::PdoStatus;
use crate::trends::TeamTrends;

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Sentiment banding labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentBand {
    /// Score at or above 70.
    #[serde(rename = "Very Positive")]
    VeryPositive,
    /// Score at or above 55.
    #[serde(rename = "Positive")]
    Positive,
    /// Score at or above 45.
    #[serde(rename = "Neutral")]
    Neutral,
    /// Score at or above 30.
    #[serde(rename = "Concerned")]
    Concerned,
    /// Score below 30.
    #[serde(rename = "Very Concerned")]
    VeryConcerned,
}

impl SentimentBand {
    /// Bands a clipped score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::VeryPositive
        } else if score >= 55.0 {
            Self::Positive
        } else if score >= 45.0 {
            Self::Neutral
        } else if score >= 30.0 {
            Self::Concerned
        } else {
            Self::VeryConcerned
        }
    }
}

/// Contribution breakdown behind the sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentFactors {
    /// Expected-goals share contribution.
    pub xgf_impact: f64,
    /// Special-teams contribution.
    pub special_teams_impact: f64,
    /// PDO banding contribution.
    pub pdo_impact: f64,
    /// Star-form contribution.
    pub star_player_impact: f64,
}

/// Fan sentiment proxy output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanSentiment {
    /// Clipped score in [0, 100].
    pub fsp_score: f64,
    /// Banded sentiment label.
    pub sentiment: SentimentBand,
    /// Contribution breakdown.
    pub factors: SentimentFactors,
    /// Methodology note surfaced with the payload.
    pub note: String,
}

// ============================================================================
// SECTION: Computation
// ============================================================================

/// Computes the fan sentiment proxy from trends and the PFI ranking.
#[must_use]
pub fn compute_fan_sentiment(trends: &TeamTrends, top_players: &[PlayerForm]) -> FanSentiment {
    let xgf_impact = (trends.xgf_pct_rolling - 50.0) * 0.4;
    let special_teams_impact = trends.special_teams_net * 0.75;
    let pdo_impact = match trends.pdo.status {
        PdoStatus::Hot => 5.0,
        PdoStatus::Cold => -5.0,
        PdoStatus::Sustainable => 0.0,
    };
    let star_player_impact = if top_players.is_empty() {
        0.0
    } else {
        // Fixed three-way divisor even when fewer stars qualify.
        let top_sum: f64 =
            top_players.iter().take(3).map(|player| player.pfi_score).sum();
        (top_sum / 3.0 - 50.0) * 0.3
    };

    let score = clamp(
        50.0 + xgf_impact + special_teams_impact + pdo_impact + star_player_impact,
        0.0,
        100.0,
    );

    FanSentiment {
        fsp_score: round1(score),
        sentiment: SentimentBand::from_score(score),
        factors: SentimentFactors {
            xgf_impact: round1(xgf_impact),
            special_teams_impact: round1(special_teams_impact),
            pdo_impact,
            star_player_impact: round1(star_player_impact),
        },
        note: "Statistical proxy based on team performance indicators".to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
