// crates/puckboard-scenario/src/engine.rs
// ============================================================================
// Module: Scenario Engine
// Description: Deterministic roster simulation with compliance checks.
// Purpose: Apply actions in order and report before/after cap metrics.
// Dependencies: crate::actions, crate::waivers, puckboard-core, serde
// ============================================================================

//! ## Overview
//! Simulation loads cap rules and a roster snapshot, resolves each action's
//! player reference through the directory (unknown references become
//! warnings), applies actions in order, and computes metrics: roster count
//! (non-roster statuses excluded), total cap hit, cap space against the
//! LTIR-adjusted ceiling, and position coverage against 12F/6D/2G.
//! Compliance checks cover the ceiling with relief, the floor, the 23-man
//! active roster, and the season's trade deadline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use puckboard_core::GameDate;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::actions::Action;
use crate::actions::ActionKind;
use crate::waivers::WaiverInputs;
use crate::waivers::is_waiver_exempt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum active roster size.
pub const MAX_ACTIVE_ROSTER: usize = 23;
/// Required forward slots for full coverage.
const REQUIRED_FORWARDS: i64 = 12;
/// Required defense slots for full coverage.
const REQUIRED_DEFENSE: i64 = 6;
/// Required goalie slots for full coverage.
const REQUIRED_GOALIES: i64 = 2;
/// Coverage penalty divisor.
const COVERAGE_PENALTY_SCALE: f64 = 5.0;
/// Cap comparison tolerance in dollars.
const CAP_EPSILON: f64 = 1e-6;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Scenario evaluation errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Candidate or referenced player could not be resolved at all.
    #[error("player not found: {0}")]
    PlayerNotFound(String),
    /// Evaluation was cancelled at an enumeration boundary.
    #[error("scenario evaluation cancelled")]
    Cancelled,
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Cooperative cancellation flag checked at enumeration boundaries.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true when cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ============================================================================
// SECTION: Rules and Directory
// ============================================================================

/// Current cap rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapRules {
    /// Upper cap limit in dollars.
    pub cap_ceiling: f64,
    /// Lower cap limit in dollars.
    pub cap_floor: f64,
    /// Performance bonus cushion in dollars.
    pub performance_bonus_cushion: f64,
    /// Trade deadline date for the season, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_deadline: Option<String>,
}

/// One player record in the league directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// NHL player id.
    pub player_id: i64,
    /// Player full name.
    pub player_name: String,
    /// Position label (`C`, `LW`, `RW`, `D`, `G`).
    pub position: String,
    /// Cap hit in dollars.
    pub cap_hit: f64,
    /// True when the player is on the team's current roster snapshot.
    pub on_roster: bool,
    /// Waiver biography when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waivers: Option<WaiverInputs>,
    /// Rough on-ice value proxy, 0-1.
    #[serde(default)]
    pub value_score: f64,
}

impl PlayerRecord {
    /// Returns the waiver exemption, defaulting to false when unknown.
    #[must_use]
    pub fn waiver_exempt(&self) -> bool {
        self.waivers.as_ref().is_some_and(is_waiver_exempt)
    }
}

/// Directory of resolvable players (roster plus acquisition candidates).
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    /// Player records.
    records: Vec<PlayerRecord>,
}

impl PlayerDirectory {
    /// Builds a directory from records.
    #[must_use]
    pub fn new(records: Vec<PlayerRecord>) -> Self {
        Self {
            records,
        }
    }

    /// Looks up a player by id.
    #[must_use]
    pub fn by_id(&self, player_id: i64) -> Option<&PlayerRecord> {
        self.records.iter().find(|record| record.player_id == player_id)
    }

    /// Looks up a player by case-insensitive partial name; first match wins.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&PlayerRecord> {
        let needle = name.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|record| record.player_name.to_ascii_lowercase().contains(&needle))
    }

    /// Resolves an action's player reference.
    #[must_use]
    pub fn resolve(&self, action: &Action) -> Option<&PlayerRecord> {
        if let Some(player_id) = action.player_id {
            return self.by_id(player_id);
        }
        action.player_name.as_deref().and_then(|name| self.by_name(name))
    }

    /// Returns every record on the current roster snapshot.
    #[must_use]
    pub fn roster(&self) -> Vec<&PlayerRecord> {
        self.records.iter().filter(|record| record.on_roster).collect()
    }
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Position slot counts for coverage scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCounts {
    /// Forwards on the active roster.
    pub forwards: i64,
    /// Defensemen on the active roster.
    pub defense: i64,
    /// Goalies on the active roster.
    pub goalies: i64,
}

/// Cap and roster metrics for one roster state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMetrics {
    /// Active roster count (non-roster statuses excluded).
    pub roster_count: usize,
    /// Total cap hit across all carried contracts.
    pub total_cap_hit: f64,
    /// Space under the LTIR-adjusted ceiling.
    pub cap_space: f64,
    /// LTIR relief applied to the ceiling.
    pub ltir_relief: f64,
    /// Position slot counts.
    pub position_counts: PositionCounts,
    /// Coverage score against 12F/6D/2G, in [0, 1].
    pub coverage_score: f64,
}

/// Scenario outcome: before/after metrics plus violations and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Team evaluated.
    pub team: String,
    /// Cap rules in force.
    pub cap_rules: CapRules,
    /// Metrics before actions.
    pub before: RosterMetrics,
    /// Metrics after actions.
    pub after: RosterMetrics,
    /// Actions as applied (resolved references included).
    pub actions: Vec<Action>,
    /// Compliance violations.
    pub violations: Vec<String>,
    /// Warnings and informational notes.
    pub notes: Vec<String>,
}

// ============================================================================
// SECTION: Simulation State
// ============================================================================

/// Roster entry during simulation.
#[derive(Debug, Clone, PartialEq)]
struct SimPlayer {
    /// Player record backing this entry.
    record: PlayerRecord,
    /// True while the player counts toward the active roster.
    active: bool,
}

/// Categorizes a position label into coverage slots.
fn count_position(counts: &mut PositionCounts, position: &str) {
    match position.trim().to_ascii_uppercase().as_str() {
        "C" | "LW" | "RW" | "W" | "F" => counts.forwards += 1,
        "D" | "LD" | "RD" => counts.defense += 1,
        "G" => counts.goalies += 1,
        _ => counts.forwards += 1,
    }
}

/// Computes metrics for a roster state.
fn compute_metrics(players: &BTreeMap<i64, SimPlayer>, rules: &CapRules, ltir_relief: f64)
-> RosterMetrics {
    let mut counts = PositionCounts::default();
    let mut roster_count = 0_usize;
    let mut total_cap_hit = 0.0_f64;
    for player in players.values() {
        total_cap_hit += player.record.cap_hit.max(0.0);
        if player.active {
            roster_count += 1;
            count_position(&mut counts, &player.record.position);
        }
    }
    let missing = (REQUIRED_FORWARDS - counts.forwards).max(0)
        + (REQUIRED_DEFENSE - counts.defense).max(0)
        + (REQUIRED_GOALIES - counts.goalies).max(0);
    let coverage_score =
        (1.0 - missing as f64 / COVERAGE_PENALTY_SCALE).clamp(0.0, 1.0);
    let effective_ceiling = rules.cap_ceiling + ltir_relief;
    RosterMetrics {
        roster_count,
        total_cap_hit,
        cap_space: effective_ceiling - total_cap_hit,
        ltir_relief,
        position_counts: counts,
        coverage_score,
    }
}

// ============================================================================
// SECTION: Simulation
// ============================================================================

/// Simulates a roster scenario and computes cap/roster outcomes.
///
/// Actions apply deterministically in order. Unknown player references are
/// skipped with a warning note; `place_ltir` moves the player off the active
/// roster and adds their cap hit to the relief pool.
#[must_use]
pub fn simulate_roster_scenario(
    team: &str,
    actions: &[Action],
    directory: &PlayerDirectory,
    rules: &CapRules,
    as_of_date: Option<&GameDate>,
) -> ScenarioOutcome {
    let mut players: BTreeMap<i64, SimPlayer> = directory
        .roster()
        .into_iter()
        .map(|record| {
            (
                record.player_id,
                SimPlayer {
                    record: record.clone(),
                    active: true,
                },
            )
        })
        .collect();
    let mut notes: Vec<String> = Vec::new();
    let before = compute_metrics(&players, rules, 0.0);

    let mut ltir_relief = 0.0_f64;
    let mut applied: Vec<Action> = Vec::with_capacity(actions.len());
    for action in actions {
        let Some(record) = directory.resolve(action) else {
            notes.push(format!(
                "Action skipped (unknown player): {}",
                action.player_name.as_deref().map_or_else(
                    || action.player_id.map(|id| id.to_string()).unwrap_or_default(),
                    str::to_string
                )
            ));
            continue;
        };
        let player_id = record.player_id;
        match action.kind {
            ActionKind::AddPlayer | ActionKind::CallUp | ActionKind::AcquirePlayer => {
                // No-op when the id is already carried, whatever its status:
                // a player an earlier action moved off the active roster does
                // not come back through a later add.
                players.entry(player_id).or_insert_with(|| SimPlayer {
                    record: record.clone(),
                    active: true,
                });
            }
            ActionKind::RemovePlayer | ActionKind::SendDown => {
                players.remove(&player_id);
            }
            ActionKind::PlaceIr => {
                if let Some(player) = players.get_mut(&player_id) {
                    player.active = false;
                }
            }
            ActionKind::PlaceLtir => {
                if let Some(player) = players.get_mut(&player_id) {
                    player.active = false;
                    ltir_relief += player.record.cap_hit.max(0.0);
                }
            }
        }
        let mut resolved = action.clone();
        resolved.player_id = Some(player_id);
        resolved.player_name.get_or_insert_with(|| record.player_name.clone());
        applied.push(resolved);
    }

    let after = compute_metrics(&players, rules, ltir_relief);

    let mut violations: Vec<String> = Vec::new();
    let effective_ceiling = rules.cap_ceiling + ltir_relief;
    if after.total_cap_hit > effective_ceiling + CAP_EPSILON {
        violations.push("Exceeds cap ceiling".to_string());
    }
    if after.total_cap_hit < rules.cap_floor - CAP_EPSILON {
        violations.push("Below cap floor".to_string());
    }
    if after.roster_count > MAX_ACTIVE_ROSTER {
        violations.push(format!("Active roster exceeds {MAX_ACTIVE_ROSTER} players"));
    }
    if let (Some(as_of), Some(deadline)) = (as_of_date, rules.trade_deadline.as_deref())
        && let Ok(deadline) = GameDate::parse(deadline)
        && *as_of > deadline
        && applied.iter().any(|action| action.kind.is_deadline_restricted())
    {
        violations.push("After trade deadline".to_string());
    }
    notes.push("Trade deadline validated when as_of_date provided.".to_string());

    ScenarioOutcome {
        team: team.to_ascii_uppercase(),
        cap_rules: rules.clone(),
        before,
        after,
        actions: applied,
        violations,
        notes,
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

    use puckboard_core::GameDate;

    use super::Action;
    use super::ActionKind;
    use super::CapRules;
    use super::PlayerDirectory;
    use super::PlayerRecord;
    use super::simulate_roster_scenario;

    /// Cap rules with a deadline.
    fn rules() -> CapRules {
        CapRules {
            cap_ceiling: 88_000_000.0,
            cap_floor: 65_000_000.0,
            performance_bonus_cushion: 0.0,
            trade_deadline: Some("2025-03-07".to_string()),
        }
    }

    /// A roster of `n` forwards at 3.5M each plus depth at other positions.
    fn directory(forwards: usize) -> PlayerDirectory {
        let mut records: Vec<PlayerRecord> = Vec::new();
        for index in 0..forwards {
            records.push(PlayerRecord {
                player_id: 100 + index as i64,
                player_name: format!("Forward {index}"),
                position: "C".to_string(),
                cap_hit: 3_500_000.0,
                on_roster: true,
                waivers: None,
                value_score: 0.5,
            });
        }
        for index in 0..6 {
            records.push(PlayerRecord {
                player_id: 200 + index as i64,
                player_name: format!("Defense {index}"),
                position: "D".to_string(),
                cap_hit: 3_000_000.0,
                on_roster: true,
                waivers: None,
                value_score: 0.5,
            });
        }
        for index in 0..2 {
            records.push(PlayerRecord {
                player_id: 300 + index,
                player_name: format!("Goalie {index}"),
                position: "G".to_string(),
                cap_hit: 2_500_000.0,
                on_roster: true,
                waivers: None,
                value_score: 0.5,
            });
        }
        // External candidate available for acquisition.
        records.push(PlayerRecord {
            player_id: 999,
            player_name: "Big Fish".to_string(),
            position: "RW".to_string(),
            cap_hit: 9_000_000.0,
            on_roster: false,
            waivers: None,
            value_score: 0.9,
        });
        PlayerDirectory::new(records)
    }

    #[test]
    fn baseline_roster_is_compliant_with_full_coverage() {
        let directory = directory(12);
        let outcome =
            simulate_roster_scenario("mtl", &[], &directory, &rules(), None);
        assert_eq!(outcome.team, "MTL");
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.before.roster_count, 20);
        assert!((outcome.after.coverage_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_references_are_skipped_with_a_warning() {
        let directory = directory(12);
        let actions = vec![Action::by_name(ActionKind::AddPlayer, "Nobody Anywhere")];
        let outcome = simulate_roster_scenario("MTL", &actions, &directory, &rules(), None);
        assert!(outcome.actions.is_empty());
        assert!(outcome.notes.iter().any(|note| note.contains("unknown player")));
    }

    #[test]
    fn ltir_placement_adds_relief_and_frees_a_roster_spot() {
        let directory = directory(12);
        let actions = vec![Action::by_id(ActionKind::PlaceLtir, 100)];
        let outcome = simulate_roster_scenario("MTL", &actions, &directory, &rules(), None);
        assert!((outcome.after.ltir_relief - 3_500_000.0).abs() < f64::EPSILON);
        assert_eq!(outcome.after.roster_count, outcome.before.roster_count - 1);
        // Cap hit still counts; relief raises the effective ceiling instead.
        assert!((outcome.after.total_cap_hit - outcome.before.total_cap_hit).abs() < f64::EPSILON);
        assert!(
            outcome.after.cap_space > outcome.before.cap_space
        );
    }

    #[test]
    fn re_adding_an_ir_player_does_not_reactivate_them() {
        let directory = directory(12);
        let actions = vec![
            Action::by_id(ActionKind::PlaceIr, 100),
            Action::by_id(ActionKind::AddPlayer, 100),
        ];
        let outcome = simulate_roster_scenario("MTL", &actions, &directory, &rules(), None);
        assert_eq!(outcome.after.roster_count, outcome.before.roster_count - 1);

        let ltir = vec![
            Action::by_id(ActionKind::PlaceLtir, 100),
            Action::by_id(ActionKind::CallUp, 100),
        ];
        let outcome = simulate_roster_scenario("MTL", &ltir, &directory, &rules(), None);
        assert_eq!(outcome.after.roster_count, outcome.before.roster_count - 1);
        assert!((outcome.after.ltir_relief - 3_500_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn coverage_penalty_applies_per_missing_slot() {
        let directory = directory(10);
        let outcome = simulate_roster_scenario("MTL", &[], &directory, &rules(), None);
        // Two forwards missing out of 12F/6D/2G.
        assert!((outcome.after.coverage_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn acquiring_past_the_deadline_is_flagged() {
        let directory = directory(12);
        let actions = vec![Action::by_name(ActionKind::AcquirePlayer, "Big Fish")];
        let late = GameDate::parse("2025-03-20").expect("date");
        let outcome =
            simulate_roster_scenario("MTL", &actions, &directory, &rules(), Some(&late));
        assert!(outcome.violations.iter().any(|v| v == "After trade deadline"));

        let early = GameDate::parse("2025-02-01").expect("date");
        let outcome =
            simulate_roster_scenario("MTL", &actions, &directory, &rules(), Some(&early));
        assert!(!outcome.violations.iter().any(|v| v == "After trade deadline"));
    }

    #[test]
    fn roster_overflow_is_flagged() {
        let directory = directory(16);
        let actions = vec![Action::by_name(ActionKind::AcquirePlayer, "Big Fish")];
        let outcome = simulate_roster_scenario("MTL", &actions, &directory, &rules(), None);
        assert_eq!(outcome.after.roster_count, 25);
        assert!(outcome.violations.iter().any(|v| v.contains("Active roster exceeds")));
    }

    #[test]
    fn cap_floor_violation_is_reported() {
        let mut thin = CapRules {
            cap_floor: 80_000_000.0,
            ..rules()
        };
        thin.trade_deadline = None;
        let directory = directory(12);
        let outcome = simulate_roster_scenario("MTL", &[], &directory, &thin, None);
        assert!(outcome.violations.iter().any(|v| v == "Below cap floor"));
    }
}
