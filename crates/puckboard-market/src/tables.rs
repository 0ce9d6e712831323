// crates/puckboard-market/src/tables.rs
// ============================================================================
// Module: Market Snapshot Tables
// Description: Contract, performance, trade, and roster snapshot readers.
// Purpose: Resolve contracts and compute cap summaries from columnar rows.
// Dependencies: puckboard-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`MarketStore`] holds the columnar snapshot rows the ETL pipeline
//! produces: active contracts keyed by `(player_id, season)`, merged
//! performance indices, trade records, and the latest roster snapshot. Cap
//! summaries count only NHL and IR roster rows; minor-league and `soir`
//! rows never hit the cap. Name search is case-insensitive partial match
//! returning the first record; callers disambiguate with a team filter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use puckboard_core::ApiError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Market analytics errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum MarketError {
    /// No matching record.
    #[error("market record not found: {0}")]
    NotFound(String),
    /// Snapshot files missing or unreadable.
    #[error("market data unavailable: {0}")]
    Unavailable(String),
    /// Snapshot content failed to parse.
    #[error("market data parse failure: {0}")]
    Parse(String),
}

impl MarketError {
    /// Maps this failure onto the serving error taxonomy.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::NotFound(detail) => ApiError::not_found(detail),
            Self::Unavailable(detail) => ApiError::service_unavailable(detail),
            Self::Parse(detail) => ApiError::internal(detail),
        }
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// One active-contract snapshot row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRow {
    /// NHL player id as a string (snapshot exports vary in numeric type).
    pub nhl_player_id: String,
    /// Player full name.
    pub full_name: String,
    /// Team abbreviation.
    pub team_abbrev: String,
    /// Position label (`C`, `LW`, `RW`, `D`, `G`).
    pub position: String,
    /// Season in `YYYY-YYYY` form.
    pub season: String,
    /// Cap hit in dollars; non-negative.
    pub cap_hit: f64,
    /// Average annual value in dollars.
    #[serde(default)]
    pub aav: f64,
    /// Seasons left on the deal including this one.
    #[serde(default)]
    pub years_remaining: i64,
    /// Player age at the season start.
    #[serde(default)]
    pub age: i64,
    /// Roster status (`NHL`, `IR`, `Minor`, `soir`, `unsigned`).
    #[serde(default)]
    pub roster_status: String,
    /// Calendar year the deal was signed.
    #[serde(default)]
    pub signing_year: Option<i64>,
    /// Cap hit as a percentage of the ceiling at signing.
    #[serde(default)]
    pub cap_hit_percentage: Option<f64>,
}

/// Merged performance-index columns for a `(player_id, season)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    /// NHL player id.
    pub nhl_player_id: String,
    /// Season in `YYYY-YYYY` form.
    pub season: String,
    /// Composite performance index.
    #[serde(default)]
    pub performance_index: Option<f64>,
    /// Contract efficiency score.
    #[serde(default)]
    pub contract_efficiency: Option<f64>,
    /// Estimated market value in dollars.
    #[serde(default)]
    pub market_value: Option<f64>,
    /// Surplus value in dollars.
    #[serde(default)]
    pub surplus_value: Option<f64>,
}

/// One trade record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    /// Trade date (`YYYY-MM-DD`).
    pub trade_date: String,
    /// Acquiring team.
    pub to_team: String,
    /// Sending team.
    pub from_team: String,
    /// Player moved.
    pub player_name: String,
    /// Cap hit retained by the sender, in dollars.
    #[serde(default)]
    pub retained: f64,
    /// Free-form description.
    #[serde(default)]
    pub details: String,
}

/// One roster snapshot row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRow {
    /// NHL player id.
    pub player_id: String,
    /// Player full name.
    pub player_name: String,
    /// Position label.
    pub position: String,
    /// Team abbreviation.
    pub team_abbrev: String,
    /// Roster status (`roster`, `non_roster`, `unsigned`).
    pub roster_status: String,
}

// ============================================================================
// SECTION: Cap Summary
// ============================================================================

/// Team cap summary with per-player rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapSummary {
    /// Team abbreviation.
    pub team: String,
    /// Season summarized.
    pub season: String,
    /// Cap hit summed over NHL and IR rows.
    pub nhl_cap_hit: f64,
    /// Number of contracts counting toward the cap.
    pub counting_contracts: usize,
    /// Per-player contract views sorted by cap hit descending.
    pub players: Vec<Value>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Roster statuses whose cap hits count toward the team cap.
const CAP_COUNTING_STATUSES: [&str; 2] = ["NHL", "IR"];

/// In-memory snapshot store for the market surface.
#[derive(Debug, Default)]
pub struct MarketStore {
    /// Active-contract rows.
    contracts: Vec<ContractRow>,
    /// Performance rows keyed for merge.
    performance: BTreeMap<(String, String), PerformanceRow>,
    /// Trade records, newest first.
    trades: Vec<TradeRow>,
    /// Latest roster snapshot rows.
    roster: Vec<RosterRow>,
}

impl MarketStore {
    /// Builds a store from already-loaded rows.
    #[must_use]
    pub fn from_rows(
        contracts: Vec<ContractRow>,
        performance: Vec<PerformanceRow>,
        mut trades: Vec<TradeRow>,
        roster: Vec<RosterRow>,
    ) -> Self {
        trades.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
        let performance = performance
            .into_iter()
            .map(|row| ((row.nhl_player_id.clone(), row.season.clone()), row))
            .collect();
        Self {
            contracts,
            performance,
            trades,
            roster,
        }
    }

    /// Loads a store from the snapshot directory.
    ///
    /// Snapshots are JSON arrays under well-known names; missing files load
    /// as empty tables so a partially populated lake still serves.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Parse`] when a present file fails to decode.
    pub fn load_from_dir(dir: &Path) -> Result<Self, MarketError> {
        /// Reads one optional snapshot table.
        fn read_table<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, MarketError> {
            if !path.exists() {
                return Ok(Vec::new());
            }
            let raw = std::fs::read_to_string(path)
                .map_err(|err| MarketError::Unavailable(err.to_string()))?;
            serde_json::from_str(&raw).map_err(|err| {
                MarketError::Parse(format!("{}: {err}", path.display()))
            })
        }
        Ok(Self::from_rows(
            read_table(&dir.join("players_contracts.json"))?,
            read_table(&dir.join("player_performance.json"))?,
            read_table(&dir.join("trades.json"))?,
            read_table(&dir.join("depth_chart.json"))?,
        ))
    }

    /// Resolves a contract by id or case-insensitive partial name.
    ///
    /// The first matching record wins; pass `team` to disambiguate common
    /// names.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] when nothing matches.
    pub fn find_contract(
        &self,
        player_id: Option<&str>,
        player_name: Option<&str>,
        team: Option<&str>,
        season: &str,
    ) -> Result<Value, MarketError> {
        let name_needle = player_name.map(str::to_ascii_lowercase);
        let team_needle = team.map(str::to_ascii_uppercase);
        let row = self
            .contracts
            .iter()
            .find(|row| {
                if row.season != season {
                    return false;
                }
                if let Some(team) = &team_needle
                    && !row.team_abbrev.eq_ignore_ascii_case(team)
                {
                    return false;
                }
                if let Some(id) = player_id {
                    return row.nhl_player_id == id;
                }
                if let Some(needle) = &name_needle {
                    return row.full_name.to_ascii_lowercase().contains(needle);
                }
                false
            })
            .ok_or_else(|| {
                MarketError::NotFound(format!(
                    "Player contract not found for {}",
                    player_id.or(player_name).unwrap_or("<unspecified>")
                ))
            })?;
        Ok(self.merge_performance(row))
    }

    /// Merges performance columns onto a contract row.
    fn merge_performance(&self, row: &ContractRow) -> Value {
        let mut value = serde_json::to_value(row).unwrap_or(Value::Null);
        if let Some(perf) =
            self.performance.get(&(row.nhl_player_id.clone(), row.season.clone()))
            && let (Value::Object(target), Ok(Value::Object(extra))) =
                (&mut value, serde_json::to_value(perf))
        {
            for (key, item) in extra {
                if key != "nhl_player_id" && key != "season" {
                    target.insert(key, item);
                }
            }
        }
        value
    }

    /// Computes the team cap summary for a season.
    ///
    /// Only NHL and IR rows count toward the cap; minor-league and `soir`
    /// rows are listed but excluded from the total.
    #[must_use]
    pub fn team_cap_summary(&self, team: &str, season: &str) -> CapSummary {
        let team = team.to_ascii_uppercase();
        let mut rows: Vec<&ContractRow> = self
            .contracts
            .iter()
            .filter(|row| row.season == season && row.team_abbrev.eq_ignore_ascii_case(&team))
            .collect();
        rows.sort_by(|a, b| {
            b.cap_hit.partial_cmp(&a.cap_hit).unwrap_or(std::cmp::Ordering::Equal)
        });
        let counting: Vec<&&ContractRow> = rows
            .iter()
            .filter(|row| {
                CAP_COUNTING_STATUSES
                    .iter()
                    .any(|status| row.roster_status.eq_ignore_ascii_case(status))
            })
            .collect();
        let nhl_cap_hit = counting.iter().map(|row| row.cap_hit.max(0.0)).sum();
        CapSummary {
            team,
            season: season.to_string(),
            nhl_cap_hit,
            counting_contracts: counting.len(),
            players: rows.iter().map(|row| self.merge_performance(row)).collect(),
        }
    }

    /// Returns the most recent trades, newest first.
    #[must_use]
    pub fn recent_trades(&self, limit: usize) -> Vec<TradeRow> {
        self.trades.iter().take(limit).cloned().collect()
    }

    /// League-wide market overview for a season.
    #[must_use]
    pub fn league_overview(&self, season: &str) -> Value {
        let rows: Vec<&ContractRow> =
            self.contracts.iter().filter(|row| row.season == season).collect();
        let total_cap: f64 = rows.iter().map(|row| row.cap_hit.max(0.0)).sum();
        let mut by_position: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for row in &rows {
            let entry = by_position.entry(row.position.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += row.cap_hit.max(0.0);
        }
        let positions: BTreeMap<&str, Value> = by_position
            .into_iter()
            .map(|(position, (count, cap))| {
                let avg = if count > 0 { cap / count as f64 } else { 0.0 };
                (position, serde_json::json!({"contracts": count, "avg_cap_hit": avg}))
            })
            .collect();
        let mut top = rows.clone();
        top.sort_by(|a, b| {
            b.cap_hit.partial_cmp(&a.cap_hit).unwrap_or(std::cmp::Ordering::Equal)
        });
        let top_cap_hits: Vec<Value> = top
            .iter()
            .take(10)
            .map(|row| {
                serde_json::json!({
                    "full_name": row.full_name,
                    "team_abbrev": row.team_abbrev,
                    "cap_hit": row.cap_hit,
                })
            })
            .collect();
        serde_json::json!({
            "season": season,
            "contracts": rows.len(),
            "total_cap_hit": total_cap,
            "by_position": positions,
            "top_cap_hits": top_cap_hits,
        })
    }

    /// Team depth chart grouped by position, optionally filtered by status.
    #[must_use]
    pub fn depth_chart(&self, team: &str, roster_status: Option<&str>) -> Value {
        let team = team.to_ascii_uppercase();
        let rows: Vec<&RosterRow> = self
            .roster
            .iter()
            .filter(|row| row.team_abbrev.eq_ignore_ascii_case(&team))
            .filter(|row| {
                roster_status.is_none_or(|status| row.roster_status.eq_ignore_ascii_case(status))
            })
            .collect();
        let mut by_position: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
        for row in &rows {
            by_position.entry(row.position.as_str()).or_default().push(
                serde_json::json!({
                    "player_id": row.player_id,
                    "player_name": row.player_name,
                    "roster_status": row.roster_status,
                }),
            );
        }
        let counts = serde_json::json!({
            "roster": rows.iter().filter(|r| r.roster_status == "roster").count(),
            "non_roster": rows.iter().filter(|r| r.roster_status == "non_roster").count(),
            "unsigned": rows.iter().filter(|r| r.roster_status == "unsigned").count(),
        });
        serde_json::json!({
            "team": team,
            "positions": by_position,
            "counts": counts,
            "total": rows.len(),
        })
    }

    /// Returns every contract row for a season (comparables input).
    #[must_use]
    pub fn season_contracts(&self, season: &str) -> Vec<&ContractRow> {
        self.contracts.iter().filter(|row| row.season == season).collect()
    }

    /// Returns the latest roster snapshot rows for a team.
    #[must_use]
    pub fn team_roster(&self, team: &str) -> Vec<RosterRow> {
        self.roster
            .iter()
            .filter(|row| row.team_abbrev.eq_ignore_ascii_case(team))
            .cloned()
            .collect()
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

    use super::ContractRow;
    use super::MarketStore;
    use super::PerformanceRow;
    use super::RosterRow;
    use super::TradeRow;

    /// Builds a contract row.
    fn contract(
        id: &str,
        name: &str,
        team: &str,
        cap_hit: f64,
        status: &str,
    ) -> ContractRow {
        ContractRow {
            nhl_player_id: id.to_string(),
            full_name: name.to_string(),
            team_abbrev: team.to_string(),
            position: "C".to_string(),
            season: "2025-2026".to_string(),
            cap_hit,
            aav: cap_hit,
            years_remaining: 4,
            age: 26,
            roster_status: status.to_string(),
            signing_year: Some(2024),
            cap_hit_percentage: Some(8.0),
        }
    }

    fn store() -> MarketStore {
        MarketStore::from_rows(
            vec![
                contract("8480018", "Nick Suzuki", "MTL", 7_875_000.0, "NHL"),
                contract("8481540", "Kirby Dach", "MTL", 3_362_500.0, "IR"),
                contract("8479400", "Prospect Guy", "MTL", 850_000.0, "Minor"),
                contract("8475848", "Veteran Ltir", "MTL", 2_000_000.0, "soir"),
                contract("8479318", "Auston Matthews", "TOR", 13_250_000.0, "NHL"),
            ],
            vec![PerformanceRow {
                nhl_player_id: "8480018".to_string(),
                season: "2025-2026".to_string(),
                performance_index: Some(71.5),
                contract_efficiency: Some(128.0),
                market_value: Some(9_600_000.0),
                surplus_value: Some(1_725_000.0),
            }],
            vec![
                TradeRow {
                    trade_date: "2025-02-01".to_string(),
                    to_team: "MTL".to_string(),
                    from_team: "CHI".to_string(),
                    player_name: "Kirby Dach".to_string(),
                    retained: 0.0,
                    details: String::new(),
                },
                TradeRow {
                    trade_date: "2025-03-01".to_string(),
                    to_team: "TOR".to_string(),
                    from_team: "SJS".to_string(),
                    player_name: "Someone Else".to_string(),
                    retained: 500_000.0,
                    details: String::new(),
                },
            ],
            vec![RosterRow {
                player_id: "8480018".to_string(),
                player_name: "Nick Suzuki".to_string(),
                position: "C".to_string(),
                team_abbrev: "MTL".to_string(),
                roster_status: "roster".to_string(),
            }],
        )
    }

    #[test]
    fn name_search_is_case_insensitive_partial_match() {
        let store = store();
        let found = store
            .find_contract(None, Some("suzu"), None, "2025-2026")
            .expect("match");
        assert_eq!(found["full_name"], "Nick Suzuki");
    }

    #[test]
    fn team_filter_disambiguates() {
        let store = store();
        let result = store.find_contract(None, Some("a"), Some("TOR"), "2025-2026");
        assert_eq!(result.expect("match")["team_abbrev"], "TOR");
    }

    #[test]
    fn missing_player_is_not_found() {
        let store = store();
        assert!(store.find_contract(None, Some("Gretzky"), None, "2025-2026").is_err());
        assert!(store.find_contract(Some("8480018"), None, None, "1999-2000").is_err());
    }

    #[test]
    fn performance_columns_merge_onto_the_contract() {
        let store = store();
        let found = store
            .find_contract(Some("8480018"), None, None, "2025-2026")
            .expect("match");
        assert_eq!(found["performance_index"], 71.5);
        assert_eq!(found["contract_efficiency"], 128.0);
    }

    #[test]
    fn cap_summary_counts_only_nhl_and_ir_rows() {
        let store = store();
        let summary = store.team_cap_summary("mtl", "2025-2026");
        assert_eq!(summary.counting_contracts, 2);
        assert!((summary.nhl_cap_hit - 11_237_500.0).abs() < 1.0);
        // All four MTL rows still listed, sorted by cap hit descending.
        assert_eq!(summary.players.len(), 4);
        assert_eq!(summary.players[0]["full_name"], "Nick Suzuki");
    }

    #[test]
    fn trades_come_back_newest_first() {
        let store = store();
        let trades = store.recent_trades(10);
        assert_eq!(trades[0].trade_date, "2025-03-01");
        assert_eq!(store.recent_trades(1).len(), 1);
    }

    #[test]
    fn league_overview_aggregates_by_position() {
        let store = store();
        let overview = store.league_overview("2025-2026");
        assert_eq!(overview["contracts"], 5);
        assert_eq!(overview["by_position"]["C"]["contracts"], 5);
        assert_eq!(overview["top_cap_hits"][0]["full_name"], "Auston Matthews");
    }

    #[test]
    fn depth_chart_filters_by_status() {
        let store = store();
        let chart = store.depth_chart("MTL", Some("roster"));
        assert_eq!(chart["total"], 1);
        assert_eq!(chart["counts"]["roster"], 1);
        let empty = store.depth_chart("MTL", Some("unsigned"));
        assert_eq!(empty["total"], 0);
    }
}
