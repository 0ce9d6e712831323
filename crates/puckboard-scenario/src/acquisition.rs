// crates/puckboard-scenario/src/acquisition.rs
// ============================================================================
// Module: Acquisition Evaluation
// Description: Greedy-then-knapsack search for balancing moves.
// Purpose: Suggest waiver-aware removals that make an acquisition compliant.
// Dependencies: crate::actions, crate::engine, serde
// ============================================================================

//! ## Overview
//! Acquisition evaluation adds the candidate, measures the cap and roster
//! gap, then searches a bounded removal pool (15 candidates, combinations up
//! to k = 5) for the plan minimizing non-exempt moves first and removed cap
//! second; a greedy pass is the fallback. Waiver-exempt players are sent
//! down, others removed outright. The objective combines normalized cap
//! space, a value delta proxy, position coverage, and a waiver-risk penalty.
//! The enumeration checks the cancel flag between combinations so a client
//! disconnect can preempt long evaluations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::actions::Action;
use crate::actions::ActionKind;
use crate::engine::CancelFlag;
use crate::engine::CapRules;
use crate::engine::MAX_ACTIVE_ROSTER;
use crate::engine::PlayerDirectory;
use crate::engine::ScenarioError;
use crate::engine::simulate_roster_scenario;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Removal pool bound.
const POOL_LIMIT: usize = 15;
/// Maximum combination size enumerated.
const MAX_COMBO: usize = 5;
/// Cap comparison tolerance in dollars.
const CAP_EPSILON: f64 = 1e-6;
/// Objective weight on normalized cap space.
const W_CAP_SPACE: f64 = 0.4;
/// Objective weight on the value delta proxy.
const W_VALUE: f64 = 0.2;
/// Objective weight on position coverage.
const W_COVERAGE: f64 = 0.3;
/// Objective penalty per non-exempt move.
const W_WAIVER_RISK: f64 = 0.1;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// One recommended balancing move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedMove {
    /// Move kind (`send_down` for exempt players, else `remove_player`).
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Player id.
    pub player_id: i64,
    /// Player name.
    pub player_name: String,
    /// True when the move avoids waivers.
    pub waiver_exempt: bool,
}

/// Acquisition evaluation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionOutcome {
    /// Team evaluated.
    pub team: String,
    /// Candidate summary.
    pub candidate: Value,
    /// Cap rules in force.
    pub cap_rules: CapRules,
    /// Roster count and cap hit immediately after the acquisition.
    pub after_acquisition: Value,
    /// Recommended balancing moves, at most `max_suggestions`.
    pub recommended_moves: Vec<RecommendedMove>,
    /// Roster count and cap hit after the recommended moves.
    pub final_after_moves: Value,
    /// Remaining compliance violations.
    pub violations: Vec<String>,
    /// Objective components and the overall score.
    pub objective: Value,
    /// Methodology notes.
    pub notes: Vec<String>,
}

// ============================================================================
// SECTION: Removal Search
// ============================================================================

/// One removal candidate.
#[derive(Debug, Clone, Copy)]
struct PoolEntry {
    /// Player id.
    player_id: i64,
    /// Cap hit removed by the move.
    cap_hit: f64,
    /// True when the move avoids waivers.
    exempt: bool,
}

/// Enumerates combinations of `pool` up to `MAX_COMBO`, returning the plan
/// minimizing `(non_exempt, cap_sum)` that satisfies both needs; greedy
/// fallback when nothing qualifies.
fn choose_removals(
    pool: &[PoolEntry],
    cap_need: f64,
    count_need: usize,
    cancel: &CancelFlag,
) -> Result<Vec<i64>, ScenarioError> {
    let top = &pool[..pool.len().min(POOL_LIMIT)];
    let mut best: Option<(usize, f64, Vec<i64>)> = None;

    // Index-vector combination walk; k grows until a plan is found.
    for k in 1..=top.len().min(MAX_COMBO) {
        let mut indices: Vec<usize> = (0..k).collect();
        loop {
            if cancel.is_cancelled() {
                return Err(ScenarioError::Cancelled);
            }
            let cap_sum: f64 = indices.iter().map(|&i| top[i].cap_hit).sum();
            let non_exempt = indices.iter().filter(|&&i| !top[i].exempt).count();
            if cap_sum + CAP_EPSILON >= cap_need && k >= count_need {
                let better = best.as_ref().is_none_or(|(best_ne, best_cap, _)| {
                    (non_exempt, cap_sum) < (*best_ne, *best_cap)
                });
                if better {
                    best = Some((
                        non_exempt,
                        cap_sum,
                        indices.iter().map(|&i| top[i].player_id).collect(),
                    ));
                }
            }
            // Advance to the next combination of size k.
            let mut slot = k;
            loop {
                if slot == 0 {
                    break;
                }
                slot -= 1;
                if indices[slot] != slot + top.len() - k {
                    indices[slot] += 1;
                    for next in slot + 1..k {
                        indices[next] = indices[next - 1] + 1;
                    }
                    break;
                }
                if slot == 0 {
                    indices.clear();
                    break;
                }
            }
            if indices.is_empty() {
                break;
            }
        }
        if best.is_some() {
            return Ok(best.map(|(_, _, ids)| ids).unwrap_or_default());
        }
    }

    // Greedy fallback: exempt-first, cheapest-first until both needs close.
    let mut sorted: Vec<&PoolEntry> = top.iter().collect();
    sorted.sort_by(|a, b| {
        (!a.exempt, a.cap_hit)
            .partial_cmp(&(!b.exempt, b.cap_hit))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut chosen: Vec<i64> = Vec::new();
    let mut cap_removed = 0.0_f64;
    for entry in sorted {
        if cap_removed >= cap_need && chosen.len() >= count_need {
            break;
        }
        chosen.push(entry.player_id);
        cap_removed += entry.cap_hit;
    }
    Ok(chosen)
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates acquiring a player: cap impact plus suggested balancing moves.
///
/// # Errors
///
/// Returns [`ScenarioError::PlayerNotFound`] when the candidate cannot be
/// resolved and [`ScenarioError::Cancelled`] when preempted.
pub fn evaluate_acquisition(
    team: &str,
    candidate_name: &str,
    directory: &PlayerDirectory,
    rules: &CapRules,
    max_suggestions: usize,
    cancel: &CancelFlag,
) -> Result<AcquisitionOutcome, ScenarioError> {
    let candidate = directory
        .by_name(candidate_name)
        .ok_or_else(|| ScenarioError::PlayerNotFound(candidate_name.to_string()))?
        .clone();

    let acquire = vec![Action::by_id(ActionKind::AcquirePlayer, candidate.player_id)];
    let acquired = simulate_roster_scenario(team, &acquire, directory, rules, None);

    let cap_need =
        (acquired.after.total_cap_hit - rules.cap_ceiling).max(0.0);
    let count_need = acquired.after.roster_count.saturating_sub(MAX_ACTIVE_ROSTER);

    // Removal pool: current roster without the candidate, richest first.
    let mut pool: Vec<PoolEntry> = directory
        .roster()
        .into_iter()
        .filter(|record| record.player_id != candidate.player_id)
        .map(|record| PoolEntry {
            player_id: record.player_id,
            cap_hit: record.cap_hit.max(0.0),
            exempt: record.waiver_exempt(),
        })
        .collect();
    pool.sort_by(|a, b| {
        b.cap_hit.partial_cmp(&a.cap_hit).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut recommended: Vec<RecommendedMove> = Vec::new();
    let mut follow_up: Vec<Action> = acquire.clone();
    if cap_need > CAP_EPSILON || count_need > 0 {
        let plan = choose_removals(&pool, cap_need, count_need, cancel)?;
        for player_id in plan {
            let Some(record) = directory.by_id(player_id) else {
                continue;
            };
            let exempt = record.waiver_exempt();
            let kind =
                if exempt { ActionKind::SendDown } else { ActionKind::RemovePlayer };
            recommended.push(RecommendedMove {
                kind,
                player_id,
                player_name: record.player_name.clone(),
                waiver_exempt: exempt,
            });
            follow_up.push(Action::by_id(kind, player_id));
        }
    }

    let settled = simulate_roster_scenario(team, &follow_up, directory, rules, None);

    let non_exempt_moves =
        recommended.iter().filter(|entry| !entry.waiver_exempt).count();
    let removed_value: f64 = recommended
        .iter()
        .filter_map(|entry| directory.by_id(entry.player_id))
        .map(|record| record.value_score)
        .sum();
    let value_delta = candidate.value_score - removed_value;
    let cap_space_norm = if rules.cap_ceiling > 0.0 {
        ((rules.cap_ceiling - settled.after.total_cap_hit) / rules.cap_ceiling).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let coverage_score = settled.after.coverage_score;
    let overall_score = W_CAP_SPACE.mul_add(
        cap_space_norm,
        W_VALUE.mul_add(value_delta, W_COVERAGE * coverage_score),
    ) - W_WAIVER_RISK * non_exempt_moves as f64;

    recommended.truncate(max_suggestions);
    Ok(AcquisitionOutcome {
        team: team.to_ascii_uppercase(),
        candidate: serde_json::json!({
            "player_id": candidate.player_id,
            "player_name": candidate.player_name,
            "cap_hit": candidate.cap_hit,
        }),
        cap_rules: rules.clone(),
        after_acquisition: serde_json::json!({
            "roster_count": acquired.after.roster_count,
            "total_cap_hit": acquired.after.total_cap_hit,
        }),
        recommended_moves: recommended,
        final_after_moves: serde_json::json!({
            "roster_count": settled.after.roster_count,
            "total_cap_hit": settled.after.total_cap_hit,
        }),
        violations: settled.violations,
        objective: serde_json::json!({
            "cap_space_norm": cap_space_norm,
            "value_delta": value_delta,
            "coverage_score": coverage_score,
            "waiver_risk": non_exempt_moves,
            "overall_score": overall_score,
        }),
        notes: vec![
            "Removals prefer waiver-exempt players; others are treated as trades.".to_string(),
            "Waiver exemptions approximated from age at signing and NHL games/seasons.".to_string(),
        ],
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

    use super::evaluate_acquisition;
    use crate::actions::ActionKind;
    use crate::engine::CancelFlag;
    use crate::engine::CapRules;
    use crate::engine::PlayerDirectory;
    use crate::engine::PlayerRecord;
    use crate::waivers::WaiverInputs;

    /// Rules with a tight ceiling so acquisitions force removals.
    fn rules(ceiling: f64) -> CapRules {
        CapRules {
            cap_ceiling: ceiling,
            cap_floor: 0.0,
            performance_bonus_cushion: 0.0,
            trade_deadline: None,
        }
    }

    /// Roster of three veterans plus one exempt prospect and a candidate.
    fn directory() -> PlayerDirectory {
        let veteran = |id: i64, name: &str, cap: f64| PlayerRecord {
            player_id: id,
            player_name: name.to_string(),
            position: "C".to_string(),
            cap_hit: cap,
            on_roster: true,
            waivers: Some(WaiverInputs {
                age_at_signing: 22,
                nhl_games_since_signing: 400,
                pro_seasons_since_signing: 6,
            }),
            value_score: 0.5,
        };
        let mut records = vec![
            veteran(1, "Veteran One", 5_000_000.0),
            veteran(2, "Veteran Two", 4_000_000.0),
            veteran(3, "Veteran Three", 3_000_000.0),
            PlayerRecord {
                player_id: 4,
                player_name: "Exempt Prospect".to_string(),
                position: "C".to_string(),
                cap_hit: 900_000.0,
                on_roster: true,
                waivers: Some(WaiverInputs {
                    age_at_signing: 18,
                    nhl_games_since_signing: 30,
                    pro_seasons_since_signing: 1,
                }),
                value_score: 0.3,
            },
        ];
        records.push(PlayerRecord {
            player_id: 99,
            player_name: "Star Winger".to_string(),
            position: "RW".to_string(),
            cap_hit: 6_000_000.0,
            on_roster: false,
            waivers: None,
            value_score: 0.9,
        });
        PlayerDirectory::new(records)
    }

    #[test]
    fn unknown_candidate_is_a_player_not_found_error() {
        let cancel = CancelFlag::new();
        let result = evaluate_acquisition(
            "MTL",
            "Wayne Gretzky",
            &directory(),
            &rules(90_000_000.0),
            3,
            &cancel,
        );
        assert!(result.is_err());
    }

    #[test]
    fn compliant_acquisition_needs_no_moves() {
        let cancel = CancelFlag::new();
        let outcome = evaluate_acquisition(
            "MTL",
            "Star Winger",
            &directory(),
            &rules(90_000_000.0),
            3,
            &cancel,
        )
        .expect("outcome");
        assert!(outcome.recommended_moves.is_empty());
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn over_cap_acquisition_recommends_removals_until_compliant() {
        // Roster cap: 12.9M; candidate 6M; ceiling 15M -> need 3.9M removed.
        let cancel = CancelFlag::new();
        let outcome = evaluate_acquisition(
            "MTL",
            "Star Winger",
            &directory(),
            &rules(15_000_000.0),
            3,
            &cancel,
        )
        .expect("outcome");
        assert!(!outcome.recommended_moves.is_empty());
        assert!(outcome.violations.is_empty());
        let final_cap = outcome.final_after_moves["total_cap_hit"]
            .as_f64()
            .expect("cap");
        assert!(final_cap <= 15_000_000.0 + 1.0);
    }

    #[test]
    fn exempt_players_are_sent_down_not_removed() {
        // Need only a small amount of space so the prospect alone suffices.
        let cancel = CancelFlag::new();
        let outcome = evaluate_acquisition(
            "MTL",
            "Star Winger",
            &directory(),
            &rules(18_100_000.0),
            3,
            &cancel,
        )
        .expect("outcome");
        assert_eq!(outcome.recommended_moves.len(), 1);
        let only = &outcome.recommended_moves[0];
        assert_eq!(only.player_name, "Exempt Prospect");
        assert_eq!(only.kind, ActionKind::SendDown);
        assert!(only.waiver_exempt);
    }

    #[test]
    fn cancellation_preempts_the_search() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = evaluate_acquisition(
            "MTL",
            "Star Winger",
            &directory(),
            &rules(15_000_000.0),
            3,
            &cancel,
        );
        assert!(result.is_err());
    }
}
