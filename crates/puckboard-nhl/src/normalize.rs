// crates/puckboard-nhl/src/normalize.rs
// ============================================================================
// Module: Upstream Normalization
// Description: Shape-tolerant extraction for heterogeneous NHL payloads.
// Purpose: Emit one stable standings/team-summary shape regardless of input.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Upstream standings rows alternate between carrying records at the top
//! level and nesting them under `record.*`; team names and abbreviations may
//! be plain strings or `{default: string}` objects. The normalizers here
//! accept all observed shapes and emit one stable structure, sorted by
//! points desc, then goal differential desc, then wins desc. An empty
//! upstream list normalizes to an empty array, never an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Field Extraction
// ============================================================================

/// Walks a key path, returning `None` when any hop is missing.
fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Extracts a string that may be plain or wrapped as `{default: string}`.
fn flexible_string(value: &Value, key: &str) -> String {
    get_path(value, &[key, "default"])
        .or_else(|| value.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Extracts an integer from the first present path.
fn first_i64(value: &Value, paths: &[&[&str]]) -> Option<i64> {
    paths.iter().find_map(|path| get_path(value, path).and_then(Value::as_i64))
}

// ============================================================================
// SECTION: Standings
// ============================================================================

/// Normalizes one raw standings row, or returns `None` when the row carries
/// no recognizable team.
fn normalize_standings_row(row: &Value) -> Option<Value> {
    let team_name = {
        let direct = flexible_string(row, "teamName");
        if direct.is_empty() {
            get_path(row, &["team", "name", "default"])
                .or_else(|| get_path(row, &["team", "name"]))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        } else {
            direct
        }
    };
    let team_abbrev = {
        let direct = flexible_string(row, "teamAbbrev");
        if direct.is_empty() {
            get_path(row, &["team", "abbrev"]).and_then(Value::as_str).unwrap_or("").to_string()
        } else {
            direct
        }
    };
    if team_name.is_empty() && team_abbrev.is_empty() {
        return None;
    }
    let division = get_path(row, &["divisionName"])
        .or_else(|| get_path(row, &["division", "name"]))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let wins = first_i64(row, &[&["wins"], &["record", "wins"]]).unwrap_or(0);
    let losses = first_i64(row, &[&["losses"], &["record", "losses"]]).unwrap_or(0);
    let ot_losses = first_i64(row, &[&["otLosses"], &["ot"], &["record", "ot"]]).unwrap_or(0);
    let points = first_i64(row, &[&["points"], &["pts"]]).unwrap_or(0);
    let games_played =
        first_i64(row, &[&["gamesPlayed"], &["gp"]]).unwrap_or(wins + losses + ot_losses);
    let goals_for = first_i64(row, &[&["goalFor"], &["goalsFor"]]).unwrap_or(0);
    let goals_against = first_i64(row, &[&["goalAgainst"], &["goalsAgainst"]]).unwrap_or(0);
    let goal_differential = first_i64(row, &[&["goalDifferential"], &["goalDiff"]])
        .unwrap_or(goals_for - goals_against);

    Some(json!({
        "teamName": {"default": team_name},
        "teamAbbrev": {"default": team_abbrev},
        "divisionName": division,
        "wins": wins,
        "losses": losses,
        "otLosses": ot_losses,
        "points": points,
        "gamesPlayed": games_played,
        "goalsFor": goals_for,
        "goalsAgainst": goals_against,
        "goalDifferential": goal_differential,
    }))
}

/// Normalizes a full standings payload into a sorted array of stable rows.
#[must_use]
pub fn normalize_standings(payload: &Value) -> Vec<Value> {
    let raw = payload.get("standings").and_then(Value::as_array);
    let mut rows: Vec<Value> = raw
        .map(|rows| rows.iter().filter_map(normalize_standings_row).collect())
        .unwrap_or_default();
    rows.sort_by(|a, b| {
        let key = |row: &Value| {
            (
                row.get("points").and_then(Value::as_i64).unwrap_or(0),
                row.get("goalDifferential").and_then(Value::as_i64).unwrap_or(0),
                row.get("wins").and_then(Value::as_i64).unwrap_or(0),
            )
        };
        key(b).cmp(&key(a))
    });
    rows
}

// ============================================================================
// SECTION: Team Summary
// ============================================================================

/// Derives a basic team record/stats view from normalized standings rows.
///
/// Returns `None` when the team does not appear in the standings.
#[must_use]
pub fn team_summary_from_standings(rows: &[Value], team: &str) -> Option<Value> {
    let wanted = team.to_ascii_uppercase();
    let row = rows.iter().find(|row| {
        get_path(row, &["teamAbbrev", "default"])
            .and_then(Value::as_str)
            .is_some_and(|abbrev| abbrev.eq_ignore_ascii_case(&wanted))
    })?;
    let int = |key: &str| row.get(key).and_then(Value::as_i64).unwrap_or(0);
    Some(json!({
        "team": wanted,
        "record": {
            "wins": int("wins"),
            "losses": int("losses"),
            "otLosses": int("otLosses"),
            "points": int("points"),
            "gamesPlayed": int("gamesPlayed"),
        },
        "stats": {
            "goalsFor": int("goalsFor"),
            "goalsAgainst": int("goalsAgainst"),
        },
        "source": "NHL API standings",
    }))
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

    use serde_json::json;

    use super::normalize_standings;
    use super::team_summary_from_standings;

    #[test]
    fn rows_with_wrapped_and_plain_abbreviations_both_normalize() {
        let payload = json!({"standings": [
            {"teamAbbrev": {"default": "MTL"}, "teamName": {"default": "Canadiens"},
             "wins": 20, "losses": 15, "otLosses": 4, "points": 44,
             "goalFor": 120, "goalAgainst": 118},
            {"teamAbbrev": "TOR", "teamName": "Maple Leafs",
             "record": {"wins": 25, "losses": 12, "ot": 3}, "points": 53,
             "goalDifferential": 22},
        ]});
        let rows = normalize_standings(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["teamAbbrev"]["default"], "TOR");
        assert_eq!(rows[0]["wins"], 25);
        assert_eq!(rows[0]["gamesPlayed"], 40);
        assert_eq!(rows[1]["teamAbbrev"]["default"], "MTL");
        assert_eq!(rows[1]["goalDifferential"], 2);
    }

    #[test]
    fn sorting_breaks_ties_on_goal_differential_then_wins() {
        let payload = json!({"standings": [
            {"teamAbbrev": "A", "points": 50, "goalDifferential": 5, "wins": 22},
            {"teamAbbrev": "B", "points": 50, "goalDifferential": 9, "wins": 20},
            {"teamAbbrev": "C", "points": 50, "goalDifferential": 9, "wins": 24},
        ]});
        let rows = normalize_standings(&payload);
        let order: Vec<&str> =
            rows.iter().map(|row| row["teamAbbrev"]["default"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn empty_upstream_list_yields_empty_sorted_array() {
        assert!(normalize_standings(&json!({"standings": []})).is_empty());
        assert!(normalize_standings(&json!({})).is_empty());
        assert!(normalize_standings(&json!({"standings": "garbage"})).is_empty());
    }

    #[test]
    fn unrecognizable_rows_are_skipped_not_fatal() {
        let payload = json!({"standings": [
            {"points": 10},
            {"teamAbbrev": "MTL", "points": 44},
        ]});
        let rows = normalize_standings(&payload);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["teamAbbrev"]["default"], "MTL");
    }

    #[test]
    fn team_summary_finds_the_row_case_insensitively() {
        let payload = json!({"standings": [
            {"teamAbbrev": "MTL", "wins": 20, "losses": 15, "otLosses": 4,
             "points": 44, "gamesPlayed": 39, "goalFor": 120, "goalAgainst": 118},
        ]});
        let rows = normalize_standings(&payload);
        let summary = team_summary_from_standings(&rows, "mtl").expect("team present");
        assert_eq!(summary["record"]["points"], 44);
        assert_eq!(summary["stats"]["goalsFor"], 120);
        assert!(team_summary_from_standings(&rows, "BOS").is_none());
    }
}
