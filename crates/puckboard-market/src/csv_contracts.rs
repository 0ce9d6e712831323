// crates/puckboard-market/src/csv_contracts.rs
// ============================================================================
// Module: CSV Contract Reader
// Description: Sectioned per-player contract summary CSV parsing.
// Purpose: Serve detailed per-season contract tables from scraped CSVs.
// Dependencies: crate::tables, serde, serde_json
// ============================================================================

//! ## Overview
//! Per-player contract summaries arrive as sectioned CSV files named
//! `{lastname}_{playerid}_summary_{timestamp}.csv`: a metadata preamble, a
//! `CONTRACTS` section, and a `CONTRACT DETAILS - YEAR BY YEAR` section. The
//! reader locates the most recent file for a player, parses both sections
//! into raw rows, and denormalizes a summary: current cap hit, AAV, NTC/NMC
//! flags derived from the clause string, and years remaining counted from
//! the current season start.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::tables::MarketError;

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// One row of the `CONTRACTS` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvContractRow {
    /// Contract type label.
    pub contract_type: String,
    /// Signing team.
    pub team: String,
    /// Signing date text.
    pub signing_date: String,
    /// Contract length in years, as text.
    pub length_years: String,
    /// Total value text.
    pub total_value: String,
    /// Cap hit text.
    pub cap_hit: String,
    /// Expiry status text (UFA/RFA).
    pub expiry_status: String,
}

/// One row of the `CONTRACT DETAILS - YEAR BY YEAR` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvDetailRow {
    /// Season text (`2025-26`).
    pub season: String,
    /// Clause text (`NTC`, `NMC`, `M-NTC`, or empty).
    pub clause: String,
    /// Cap hit text.
    pub cap_hit: String,
    /// Cap percentage text.
    pub cap_percentage: String,
    /// AAV text.
    pub aav: String,
    /// Performance bonus text.
    pub performance_bonuses: String,
    /// Signing bonus text.
    pub signing_bonuses: String,
    /// Base salary text.
    pub base_salary: String,
    /// Total salary text.
    pub total_salary: String,
    /// Minor-league salary text.
    pub minors_salary: String,
}

/// Parsed contract summary for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvContract {
    /// NHL player id the file was looked up by.
    pub nhl_player_id: i64,
    /// Short player name from the preamble.
    pub player_name: String,
    /// Official full name from the preamble.
    pub full_name: String,
    /// Current team abbreviation.
    pub team_abbrev: String,
    /// Position label.
    pub position: String,
    /// Raw contract rows.
    pub contracts: Vec<CsvContractRow>,
    /// Raw year-by-year detail rows.
    pub contract_details: Vec<CsvDetailRow>,
    /// Current-season cap hit (AAV preferred) in dollars.
    pub cap_hit: f64,
    /// Current-season cap percentage.
    pub cap_hit_percentage: f64,
    /// Seasons remaining counted from the current season start.
    pub years_remaining: usize,
    /// True when the current clause contains `NTC`.
    pub no_trade_clause: bool,
    /// True when the current clause contains `NMC`.
    pub no_movement_clause: bool,
    /// `Active` while seasons remain, else `Expired`.
    pub contract_status: String,
}

// ============================================================================
// SECTION: Field Parsing
// ============================================================================

/// Parses a currency string (`$13,250,000`) to dollars; 0 for blanks.
#[must_use]
pub fn parse_currency(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return 0.0;
    }
    let cleaned: String =
        trimmed.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Parses a percentage string (`14.5%`) to a float; 0 for blanks.
#[must_use]
pub fn parse_percentage(value: &str) -> f64 {
    let cleaned = value.trim().trim_end_matches('%').trim();
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }
    cleaned.parse().unwrap_or(0.0)
}

/// Splits one CSV line, honoring double-quoted cells.
///
/// Currency cells quote embedded commas (`"$7,875,000"`); doubled quotes
/// inside a quoted cell unescape to one quote.
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                let _ = chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Parses a detail-row season (`2025-26`) to its starting year.
fn season_start_year(season: &str) -> Option<i32> {
    season.split('-').next().and_then(|year| year.parse().ok())
}

// ============================================================================
// SECTION: File Location
// ============================================================================

/// Finds the most recent `*_{player_id}_summary_*.csv` file for a player.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] when no file matches and
/// [`MarketError::Unavailable`] when the directory cannot be read.
pub fn find_latest_contract_csv(dir: &Path, player_id: i64) -> Result<PathBuf, MarketError> {
    let needle = format!("_{player_id}_summary_");
    let entries =
        std::fs::read_dir(dir).map_err(|err| MarketError::Unavailable(err.to_string()))?;
    let mut matches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "csv")
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.contains(&needle))
        })
        .collect();
    matches.sort();
    matches.pop().ok_or_else(|| {
        MarketError::NotFound(format!("No contract data found for player ID {player_id}"))
    })
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Section currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Metadata preamble before any section marker.
    Preamble,
    /// `CONTRACTS` rows.
    Contracts,
    /// `CONTRACT DETAILS - YEAR BY YEAR` rows.
    Details,
}

/// Parses a sectioned contract CSV into the denormalized view.
///
/// `current_season_start` anchors the years-remaining count (seasons whose
/// start year is at or past it are counted).
#[must_use]
pub fn parse_contract_csv(
    player_id: i64,
    content: &str,
    current_season_start: i32,
) -> CsvContract {
    let mut player_name = String::new();
    let mut full_name = String::new();
    let mut team_abbrev = String::new();
    let mut position = String::new();
    let mut contracts: Vec<CsvContractRow> = Vec::new();
    let mut details: Vec<CsvDetailRow> = Vec::new();
    let mut section = Section::Preamble;

    for line in content.lines() {
        let cells = split_line(line);
        let Some(first) = cells.first().map(String::as_str) else {
            continue;
        };
        if first.is_empty() {
            continue;
        }
        match first {
            "CONTRACTS" => {
                section = Section::Contracts;
                continue;
            }
            "CONTRACT DETAILS - YEAR BY YEAR" => {
                section = Section::Details;
                continue;
            }
            // Header rows inside sections.
            "Type" | "Season" | "Clause" => continue,
            _ => {}
        }
        match section {
            Section::Preamble => {
                let value = cells.get(1).cloned().unwrap_or_default();
                match first {
                    "Player Name" => player_name = value,
                    "Official Name" => full_name = value,
                    "Current Team" => team_abbrev = value,
                    "Position" => position = value,
                    _ => {}
                }
            }
            Section::Contracts if cells.len() >= 3 => {
                let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();
                contracts.push(CsvContractRow {
                    contract_type: cell(0),
                    team: cell(1),
                    signing_date: cell(2),
                    length_years: cell(3),
                    total_value: cell(4),
                    cap_hit: cell(5),
                    expiry_status: cell(6),
                });
            }
            Section::Details if cells.len() >= 3 => {
                let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();
                details.push(CsvDetailRow {
                    season: cell(0),
                    clause: cell(1),
                    cap_hit: cell(2),
                    cap_percentage: cell(3),
                    aav: cell(4),
                    performance_bonuses: cell(5),
                    signing_bonuses: cell(6),
                    base_salary: cell(7),
                    total_salary: cell(8),
                    minors_salary: cell(9),
                });
            }
            Section::Contracts | Section::Details => {}
        }
    }

    let latest_detail = details.first().cloned().unwrap_or_default();
    let years_remaining = details
        .iter()
        .filter(|detail| {
            season_start_year(&detail.season)
                .is_some_and(|year| year >= current_season_start)
        })
        .count();
    let cap_hit = {
        let from_aav = parse_currency(&latest_detail.aav);
        if from_aav > 0.0 { from_aav } else { parse_currency(&latest_detail.cap_hit) }
    };

    CsvContract {
        nhl_player_id: player_id,
        player_name,
        full_name,
        team_abbrev,
        position,
        cap_hit,
        cap_hit_percentage: parse_percentage(&latest_detail.cap_percentage),
        years_remaining,
        no_trade_clause: latest_detail.clause.contains("NTC"),
        no_movement_clause: latest_detail.clause.contains("NMC"),
        contract_status: if years_remaining > 0 { "Active" } else { "Expired" }.to_string(),
        contracts,
        contract_details: details,
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

    use super::find_latest_contract_csv;
    use super::parse_contract_csv;
    use super::parse_currency;
    use super::parse_percentage;

    /// Representative sectioned summary file.
    const SAMPLE: &str = "\
Player Name,Nick Suzuki
Official Name,Nicholas Suzuki
Current Team,MTL
Position,C

CONTRACTS
Type,Team,Signing Date,Length,Value,Cap Hit,Expiry
Standard Contract,MTL,2021-10-12,8,63000000,7875000,UFA
Entry-Level,MTL,2017-10-10,3,2775000,925000,RFA

CONTRACT DETAILS - YEAR BY YEAR
Season,Clause,Cap Hit,Cap %,AAV,PB,SB,Base,Total,Minors
2025-26,NTC,\"$7,875,000\",8.9%,\"$7,875,000\",-,-,\"$8,000,000\",\"$8,000,000\",-
2026-27,NTC,\"$7,875,000\",8.5%,\"$7,875,000\",-,-,\"$7,500,000\",\"$7,500,000\",-
2024-25,,\"$7,875,000\",9.2%,\"$7,875,000\",-,-,\"$7,000,000\",\"$7,000,000\",-
";

    #[test]
    fn currency_and_percentage_parsing_handle_decorations() {
        assert!((parse_currency("$13,250,000") - 13_250_000.0).abs() < f64::EPSILON);
        assert!((parse_currency("-")).abs() < f64::EPSILON);
        assert!((parse_currency("")).abs() < f64::EPSILON);
        assert!((parse_percentage("14.5%") - 14.5).abs() < f64::EPSILON);
        assert!((parse_percentage("-")).abs() < f64::EPSILON);
    }

    #[test]
    fn sections_parse_into_raw_rows() {
        let parsed = parse_contract_csv(8_480_018, SAMPLE, 2025);
        assert_eq!(parsed.player_name, "Nick Suzuki");
        assert_eq!(parsed.full_name, "Nicholas Suzuki");
        assert_eq!(parsed.team_abbrev, "MTL");
        assert_eq!(parsed.position, "C");
        assert_eq!(parsed.contracts.len(), 2);
        assert_eq!(parsed.contracts[0].contract_type, "Standard Contract");
        assert_eq!(parsed.contract_details.len(), 3);
    }

    #[test]
    fn summary_denormalizes_clauses_and_years_remaining() {
        let parsed = parse_contract_csv(8_480_018, SAMPLE, 2025);
        assert!(parsed.no_trade_clause);
        assert!(!parsed.no_movement_clause);
        // 2025-26 and 2026-27 count; 2024-25 is behind the anchor.
        assert_eq!(parsed.years_remaining, 2);
        assert_eq!(parsed.contract_status, "Active");
        assert!((parsed.cap_hit - 7_875_000.0).abs() < f64::EPSILON);
        assert!((parsed.cap_hit_percentage - 8.9).abs() < f64::EPSILON);
    }

    #[test]
    fn expired_contract_counts_zero_years() {
        let parsed = parse_contract_csv(8_480_018, SAMPLE, 2030);
        assert_eq!(parsed.years_remaining, 0);
        assert_eq!(parsed.contract_status, "Expired");
    }

    #[test]
    fn latest_file_wins_when_multiple_match() {
        let dir = tempfile::tempdir().expect("tempdir");
        let older = dir.path().join("suzuki_8480018_summary_20250101.csv");
        let newer = dir.path().join("suzuki_8480018_summary_20250601.csv");
        let other = dir.path().join("dach_8481540_summary_20250601.csv");
        std::fs::write(&older, SAMPLE).expect("write");
        std::fs::write(&newer, SAMPLE).expect("write");
        std::fs::write(&other, SAMPLE).expect("write");

        let found = find_latest_contract_csv(dir.path(), 8_480_018).expect("found");
        assert_eq!(found, newer);
        assert!(find_latest_contract_csv(dir.path(), 12345).is_err());
    }
}
