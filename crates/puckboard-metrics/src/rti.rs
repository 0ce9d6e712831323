// crates/puckboard-metrics/src/rti.rs
// ============================================================================
// Module: Rival Threat Index
// Description: Composite competitive-threat score per division team.
// Purpose: Rank division rivals with NaN guards at every step.
// Dependencies: crate::rows, crate::stats, serde
// ============================================================================

//! ## Overview
//! RTI combines rolling xGF% (0.30), points% (0.20), normalized special
//! teams net (0.20), five-on-five goal share (0.15), and a fixed goalie
//! workload placeholder (0.15 of 50) that keeps the score defined when the
//! workload feed is missing. Teams with fewer than three rows are skipped;
//! an empty input emits the fixed division-team list at RTI 50 so the UI
//! contract holds. Output is sorted by score descending.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::rows::DivisionGameRow;
use crate::stats::mean;
use crate::stats::round1;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum rows per team to qualify.
const MIN_GAMES: usize = 3;
/// Fixed division team list emitted when no input rows exist.
const DEFAULT_DIVISION_TEAMS: [&str; 8] =
    ["BOS", "TOR", "FLA", "TBL", "BUF", "DET", "OTT", "MTL"];
/// League-average power-play percentage baseline.
const LEAGUE_PP_PCT: f64 = 20.0;
/// League-average penalty-kill percentage baseline.
const LEAGUE_PK_PCT: f64 = 80.0;
/// Goalie workload placeholder value.
const GOALIE_PLACEHOLDER: f64 = 50.0;

// ============================================================================
// SECTION: Output Type
// ============================================================================

/// One ranked rival threat entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RivalThreat {
    /// Team abbreviation.
    pub team: String,
    /// Composite threat score; always finite.
    pub rti_score: f64,
    /// Rolling expected-goals share.
    pub xgf_pct: f64,
    /// Points percentage over the window.
    pub points_pct: f64,
    /// Special-teams net against the 20/80 baseline.
    pub special_teams_net: f64,
    /// Five-on-five goal share.
    pub goal_share_5v5: f64,
    /// `W-L` record over the window, `N/A` without result labels.
    pub recent_record: String,
}

impl RivalThreat {
    /// Neutral entry for a team with no data.
    fn neutral(team: &str) -> Self {
        Self {
            team: team.to_string(),
            rti_score: 50.0,
            xgf_pct: 50.0,
            points_pct: 50.0,
            special_teams_net: 0.0,
            goal_share_5v5: 50.0,
            recent_record: "N/A".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Computation
// ============================================================================

/// Share of `numerator` in `numerator + denominator` as a percentage; 50
/// when the total is zero.
fn share_pct(numerator: f64, denominator: f64) -> f64 {
    let total = numerator + denominator;
    if total > 0.0 { numerator / total * 100.0 } else { 50.0 }
}

/// Finite sum of the present values.
fn sum_present(values: impl Iterator<Item = Option<f64>>) -> f64 {
    values.flatten().filter(|v| v.is_finite()).sum()
}

/// Mean of the present, finite values; `default` when none exist.
fn mean_or(values: impl Iterator<Item = Option<f64>>, default: f64) -> f64 {
    let present: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if present.is_empty() { default } else { mean(&present) }
}

/// Computes the ranked Rival Threat Index over division-team game rows.
#[must_use]
pub fn compute_rival_threat_index(rows: &[DivisionGameRow], window: usize) -> Vec<RivalThreat> {
    if rows.is_empty() || window == 0 {
        return DEFAULT_DIVISION_TEAMS.iter().map(|team| RivalThreat::neutral(team)).collect();
    }

    let mut by_team: BTreeMap<&str, Vec<&DivisionGameRow>> = BTreeMap::new();
    for row in rows {
        by_team.entry(row.team.as_str()).or_default().push(row);
    }

    let mut ranked: Vec<RivalThreat> = Vec::with_capacity(by_team.len());
    for (team, games) in &mut by_team {
        if games.len() < MIN_GAMES {
            continue;
        }
        games.sort_by(|a, b| a.date.cmp(&b.date));
        let start = games.len().saturating_sub(window);
        let recent = &games[start..];

        let xgf = sum_present(recent.iter().map(|row| row.xgf));
        let xga = sum_present(recent.iter().map(|row| row.xga));
        let xgf_pct = share_pct(xgf, xga);

        let points = sum_present(recent.iter().map(|row| row.points));
        let points_pct = if recent.is_empty() {
            50.0
        } else {
            points / (recent.len() as f64 * 2.0) * 100.0
        };

        let pp_pct = mean_or(recent.iter().map(|row| row.pp_pct), LEAGUE_PP_PCT);
        let pk_pct = mean_or(recent.iter().map(|row| row.pk_pct), LEAGUE_PK_PCT);
        let st_net = pp_pct + pk_pct - 100.0;

        let gf_5v5 = sum_present(recent.iter().map(|row| row.gf_5v5));
        let ga_5v5 = sum_present(recent.iter().map(|row| row.ga_5v5));
        let goal_share_5v5 = share_pct(gf_5v5, ga_5v5);

        let rti_raw = (st_net + 100.0).mul_add(
            0.20,
            xgf_pct.mul_add(0.30, points_pct * 0.20),
        ) + goal_share_5v5.mul_add(0.15, GOALIE_PLACEHOLDER * 0.15);
        let rti_score = if rti_raw.is_finite() { rti_raw } else { 50.0 };

        let recent_record = if recent.iter().any(|row| row.result.is_some()) {
            let wins =
                recent.iter().filter(|row| row.result.as_deref() == Some("W")).count();
            let losses =
                recent.iter().filter(|row| row.result.as_deref() == Some("L")).count();
            format!("{wins}-{losses}")
        } else {
            "N/A".to_string()
        };

        ranked.push(RivalThreat {
            team: (*team).to_string(),
            rti_score: round1(rti_score),
            xgf_pct: round1(xgf_pct),
            points_pct: round1(points_pct),
            special_teams_net: round1(st_net),
            goal_share_5v5: round1(goal_share_5v5),
            recent_record,
        });
    }

    ranked.sort_by(|a, b| {
        b.rti_score
            .partial_cmp(&a.rti_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });
    ranked
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

    use super::compute_rival_threat_index;
    use crate::rows::DivisionGameRow;

    /// Builds a division-team game row.
    fn row(team: &str, date: &str, xgf: f64, xga: f64, points: f64) -> DivisionGameRow {
        DivisionGameRow {
            team: team.to_string(),
            date: Some(date.to_string()),
            xgf: Some(xgf),
            xga: Some(xga),
            points: Some(points),
            pp_pct: Some(21.0),
            pk_pct: Some(80.0),
            gf_5v5: Some(2.0),
            ga_5v5: Some(2.0),
            result: Some(if points > 0.0 { "W" } else { "L" }.to_string()),
        }
    }

    /// N games for one team.
    fn slate(team: &str, games: usize, xgf: f64, xga: f64, points: f64) -> Vec<DivisionGameRow> {
        (1..=games).map(|d| row(team, &format!("2025-01-{d:02}"), xgf, xga, points)).collect()
    }

    #[test]
    fn empty_input_emits_eight_default_rows_at_fifty() {
        let ranked = compute_rival_threat_index(&[], 10);
        assert_eq!(ranked.len(), 8);
        for entry in &ranked {
            assert!((entry.rti_score - 50.0).abs() < f64::EPSILON);
            assert!(entry.rti_score.is_finite());
        }
    }

    #[test]
    fn stronger_teams_rank_first_and_scores_are_finite() {
        let mut rows = slate("BOS", 5, 3.5, 1.5, 2.0);
        rows.extend(slate("BUF", 5, 1.5, 3.5, 0.0));
        let ranked = compute_rival_threat_index(&rows, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].team, "BOS");
        assert!(ranked[0].rti_score > ranked[1].rti_score);
        assert!(ranked.iter().all(|entry| entry.rti_score.is_finite()));
    }

    #[test]
    fn teams_with_missing_special_teams_get_zero_net_not_nan() {
        let mut rows = slate("TOR", 4, 3.0, 2.0, 2.0);
        for game in &mut rows {
            game.pp_pct = None;
            game.pk_pct = None;
        }
        let ranked = compute_rival_threat_index(&rows, 10);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].special_teams_net).abs() < f64::EPSILON);
        assert!(ranked[0].rti_score.is_finite());
    }

    #[test]
    fn teams_under_three_rows_are_skipped() {
        let mut rows = slate("BOS", 5, 3.0, 2.0, 2.0);
        rows.extend(slate("SEA", 2, 5.0, 1.0, 2.0));
        let ranked = compute_rival_threat_index(&rows, 10);
        assert!(ranked.iter().all(|entry| entry.team != "SEA"));
    }

    #[test]
    fn recent_record_counts_wins_and_losses() {
        let mut rows = slate("DET", 3, 3.0, 2.0, 2.0);
        rows.push(row("DET", "2025-01-04", 1.0, 3.0, 0.0));
        let ranked = compute_rival_threat_index(&rows, 10);
        assert_eq!(ranked[0].recent_record, "3-1");
    }
}
