// crates/puckboard-metrics/src/pfi.rs
// ============================================================================
// Module: Player Form Index
// Description: Recency-weighted z-score composite of player performance.
// Purpose: Rank recent player form on a 0-100 display scale with a trend.
// Dependencies: crate::rows, crate::stats, crate::toi, serde
// ============================================================================

//! ## Overview
//! PFI standardizes per-60 rates across the cohort and combines them with
//! fixed weights: EV primary points/60 (0.35), individual xG/60 (0.25), shot
//! assists/60 (0.15), controlled entries/60 (0.15), and on-ice xGF% (0.10).
//! The composite is rescaled to 0-100 around 50 and clipped. The trend
//! compares unweighted composites of the recent and prior window halves
//! against a cohort-derived threshold. Players need at least three games in
//! the window to qualify.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::rows::PlayerGameRow;
use crate::stats::clamp;
use crate::stats::mean;
use crate::stats::population_std;
use crate::stats::round1;
use crate::stats::round2;
use crate::stats::sample_std;
use crate::stats::z_score;
use crate::toi::parse_toi_minutes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum games in the window for a player to qualify.
const MIN_GAMES: usize = 3;
/// Component weights, in breakdown order.
const WEIGHTS: [f64; 5] = [0.35, 0.25, 0.15, 0.15, 0.10];
/// Display-scale spread applied to the standardized composite.
const DISPLAY_SPREAD: f64 = 15.0;
/// Deviation floor added before display rescaling.
const DISPLAY_STD_FLOOR: f64 = 0.01;
/// Default xGF% applied when a row carries no on-ice share.
const DEFAULT_XGF_PCT: f64 = 50.0;
/// Fallback trend threshold when the delta cohort is degenerate.
const FALLBACK_TREND_THRESHOLD: f64 = 0.1;

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Form trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Recent half outperforms the prior half.
    Up,
    /// Halves are within the threshold.
    Stable,
    /// Recent half underperforms the prior half.
    Down,
}

/// Per-component averages backing a player's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormBreakdown {
    /// Even-strength primary points per 60.
    pub ev_points_per60: f64,
    /// Individual expected goals per 60.
    pub ixg_per60: f64,
    /// Shot assists per 60.
    pub shot_assists_per60: f64,
    /// Controlled entries per 60.
    pub entries_per60: f64,
    /// On-ice expected-goals share.
    pub xgf_pct: f64,
}

/// One ranked player form entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerForm {
    /// Player display name.
    pub player_name: String,
    /// Display score in [0, 100].
    pub pfi_score: f64,
    /// Trend over the window halves.
    pub trend: Trend,
    /// Games actually analyzed within the window.
    pub games_analyzed: usize,
    /// Total minutes across analyzed games.
    pub total_toi_minutes: f64,
    /// Component averages.
    pub breakdown: FormBreakdown,
}

// ============================================================================
// SECTION: Per-Game Components
// ============================================================================

/// Component vector for one game, in weight order.
fn game_components(row: &PlayerGameRow) -> [f64; 5] {
    let toi_minutes = parse_toi_minutes(row.toi.as_ref());
    let hours = toi_minutes / 60.0;
    let rate = |value: Option<f64>| {
        let value = value.filter(|v| v.is_finite()).unwrap_or(0.0);
        if hours > 0.0 { value / hours } else { 0.0 }
    };
    [
        rate(row.ev_points),
        rate(row.ixg),
        rate(row.shot_assists),
        rate(row.controlled_entries),
        row.xgf_pct.filter(|v| v.is_finite()).unwrap_or(DEFAULT_XGF_PCT),
    ]
}

/// Unweighted composite of the component means of a game slice.
fn slice_composite(rows: &[&PlayerGameRow]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mut sums = [0.0_f64; 5];
    for row in rows {
        let components = game_components(row);
        for (sum, component) in sums.iter_mut().zip(components) {
            *sum += component;
        }
    }
    sums.iter()
        .zip(WEIGHTS)
        .map(|(sum, weight)| (sum / rows.len() as f64) * weight)
        .sum()
}

// ============================================================================
// SECTION: Player Form Index
// ============================================================================

/// Computes the ranked Player Form Index over a game-log window.
///
/// Returns the top `top_n` qualifying players sorted by score descending.
#[must_use]
pub fn compute_player_form_index(
    rows: &[PlayerGameRow],
    window: usize,
    top_n: usize,
) -> Vec<PlayerForm> {
    if rows.is_empty() || window == 0 {
        return Vec::new();
    }

    // Group by player, most recent game first.
    let mut by_player: BTreeMap<&str, Vec<&PlayerGameRow>> = BTreeMap::new();
    for row in rows {
        by_player.entry(row.player_name.as_str()).or_default().push(row);
    }
    for games in by_player.values_mut() {
        games.sort_by(|a, b| b.date.cmp(&a.date));
        games.truncate(window);
    }
    by_player.retain(|_, games| games.len() >= MIN_GAMES);
    if by_player.is_empty() {
        return Vec::new();
    }

    // Aggregate components and window-half deltas per player.
    struct PlayerAggregate {
        /// Component means in weight order.
        components: [f64; 5],
        /// Games analyzed.
        games: usize,
        /// Summed minutes.
        toi_minutes: f64,
        /// Recent-minus-prior composite delta.
        delta: f64,
    }

    let mut aggregates: BTreeMap<&str, PlayerAggregate> = BTreeMap::new();
    let mut deltas: Vec<f64> = Vec::with_capacity(by_player.len());
    for (player, games) in &by_player {
        let mut sums = [0.0_f64; 5];
        let mut toi_minutes = 0.0;
        for row in games {
            let components = game_components(row);
            for (sum, component) in sums.iter_mut().zip(components) {
                *sum += component;
            }
            toi_minutes += parse_toi_minutes(row.toi.as_ref());
        }
        let mut components = [0.0_f64; 5];
        for (slot, sum) in components.iter_mut().zip(sums) {
            *slot = sum / games.len() as f64;
        }

        let half = (games.len() / 2).clamp(2, 5);
        let delta = if games.len() < half * 2 {
            0.0
        } else {
            slice_composite(&games[..half]) - slice_composite(&games[half..half * 2])
        };
        deltas.push(delta);
        aggregates.insert(
            *player,
            PlayerAggregate {
                components,
                games: games.len(),
                toi_minutes,
                delta,
            },
        );
    }

    // Standardize each component across the cohort.
    let mut cohort: [(f64, f64); 5] = [(0.0, 0.0); 5];
    for (index, slot) in cohort.iter_mut().enumerate() {
        let values: Vec<f64> =
            aggregates.values().map(|aggregate| aggregate.components[index]).collect();
        *slot = (mean(&values), sample_std(&values));
    }
    let raw_scores: BTreeMap<&str, f64> = aggregates
        .iter()
        .map(|(player, aggregate)| {
            let raw: f64 = aggregate
                .components
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    let (center, spread) = cohort[index];
                    z_score(*value, center, spread) * WEIGHTS[index]
                })
                .sum();
            (*player, raw)
        })
        .collect();

    // Rescale to the 0-100 display band.
    let raw_values: Vec<f64> = raw_scores.values().copied().collect();
    let raw_min = raw_values.iter().copied().fold(f64::INFINITY, f64::min);
    let raw_max = raw_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let raw_mean = mean(&raw_values);
    let raw_std = sample_std(&raw_values);
    let display = |raw: f64| {
        if raw_max > raw_min {
            clamp(
                ((raw - raw_mean) / (raw_std + DISPLAY_STD_FLOOR))
                    .mul_add(DISPLAY_SPREAD, 50.0),
                0.0,
                100.0,
            )
        } else {
            50.0
        }
    };

    // Trend threshold from the cohort's delta spread.
    let delta_std = population_std(&deltas);
    let threshold = if delta_std > 0.0 {
        (0.35 * delta_std).max(0.05)
    } else {
        FALLBACK_TREND_THRESHOLD
    };

    let mut ranked: Vec<PlayerForm> = aggregates
        .into_iter()
        .map(|(player, aggregate)| {
            let raw = raw_scores.get(player).copied().unwrap_or(0.0);
            let trend = if aggregate.delta > threshold {
                Trend::Up
            } else if aggregate.delta < -threshold {
                Trend::Down
            } else {
                Trend::Stable
            };
            PlayerForm {
                player_name: player.to_string(),
                pfi_score: round1(display(raw)),
                trend,
                games_analyzed: aggregate.games,
                total_toi_minutes: round1(aggregate.toi_minutes),
                breakdown: FormBreakdown {
                    ev_points_per60: round2(aggregate.components[0]),
                    ixg_per60: round2(aggregate.components[1]),
                    shot_assists_per60: round2(aggregate.components[2]),
                    entries_per60: round2(aggregate.components[3]),
                    xgf_pct: round1(aggregate.components[4]),
                },
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.pfi_score
            .partial_cmp(&a.pfi_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
    ranked.truncate(top_n);
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

    use super::Trend;
    use super::compute_player_form_index;
    use crate::rows::PlayerGameRow;
    use crate::rows::RawToi;

    /// Builds a game row with the given production numbers.
    fn game(player: &str, date: &str, ev: f64, ixg: f64) -> PlayerGameRow {
        PlayerGameRow {
            player_name: player.to_string(),
            date: Some(date.to_string()),
            toi: Some(RawToi::Text("18:00".to_string())),
            ev_points: Some(ev),
            ixg: Some(ixg),
            shot_assists: Some(1.0),
            controlled_entries: Some(2.0),
            xgf_pct: Some(52.0),
        }
    }

    /// Five-game slate for one player with uniform production.
    fn slate(player: &str, ev: f64, ixg: f64) -> Vec<PlayerGameRow> {
        (1..=5).map(|day| game(player, &format!("2025-01-{day:02}"), ev, ixg)).collect()
    }

    #[test]
    fn scores_stay_in_display_bounds_and_rank_production() {
        let mut rows = slate("Suzuki", 2.0, 1.2);
        rows.extend(slate("Dach", 1.0, 0.6));
        rows.extend(slate("Gallagher", 0.2, 0.1));
        let ranked = compute_player_form_index(&rows, 10, 10);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].player_name, "Suzuki");
        assert_eq!(ranked[2].player_name, "Gallagher");
        for entry in &ranked {
            assert!((0.0..=100.0).contains(&entry.pfi_score));
            assert!(matches!(entry.trend, Trend::Up | Trend::Stable | Trend::Down));
        }
    }

    #[test]
    fn players_under_three_games_are_excluded() {
        let mut rows = slate("Suzuki", 2.0, 1.2);
        rows.push(game("Callup", "2025-01-01", 3.0, 2.0));
        rows.push(game("Callup", "2025-01-02", 3.0, 2.0));
        let ranked = compute_player_form_index(&rows, 10, 10);
        assert!(ranked.iter().all(|entry| entry.player_name != "Callup"));
    }

    #[test]
    fn degenerate_cohort_scores_fifty() {
        let rows = slate("Suzuki", 1.0, 0.5);
        let ranked = compute_player_form_index(&rows, 10, 10);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].pfi_score - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn improving_recent_half_trends_up() {
        // Ten games: five strong recent, five quiet prior, plus a flat peer
        // cohort so the threshold stays small.
        let mut rows: Vec<PlayerGameRow> = (1..=10)
            .map(|day| {
                let ev = if day > 5 { 3.0 } else { 0.0 };
                game("Caufield", &format!("2025-01-{day:02}"), ev, 0.5)
            })
            .collect();
        rows.extend(slate("Suzuki", 1.0, 0.5));
        rows.extend(slate("Dach", 1.0, 0.5));
        let ranked = compute_player_form_index(&rows, 10, 10);
        let caufield =
            ranked.iter().find(|entry| entry.player_name == "Caufield").expect("present");
        assert_eq!(caufield.trend, Trend::Up);
    }

    #[test]
    fn top_n_truncates_the_ranking() {
        let mut rows = Vec::new();
        for index in 0..6 {
            rows.extend(slate(&format!("Player{index}"), index as f64, 0.5));
        }
        let ranked = compute_player_form_index(&rows, 10, 3);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(compute_player_form_index(&[], 10, 10).is_empty());
    }
}
