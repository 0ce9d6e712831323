// crates/puckboard-core/src/core/identifiers.rs
// ============================================================================
// Module: Identifier Newtypes
// Description: Validated identifiers for players, teams, games, and seasons.
// Purpose: Keep identifier validation in one place so routes fail closed.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Identifier newtypes used throughout the backend. Construction validates
//! shape (date strings are `YYYY-MM-DD`, seasons are `YYYY-YYYY`, team codes
//! are short uppercase abbreviations) so downstream code can trust the
//! contents. Invalid inputs are rejected with [`IdentifierError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::Date;
use time::Month;
use time::format_description::well_known::Iso8601;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while validating identifiers.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// Date string was not `YYYY-MM-DD`.
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    /// Season string was not `YYYY-YYYY` with consecutive years.
    #[error("invalid season (expected YYYY-YYYY): {0}")]
    InvalidSeason(String),
    /// Team code was empty or not 2-4 ASCII letters.
    #[error("invalid team code: {0}")]
    InvalidTeamCode(String),
    /// Numeric identifier failed to parse or was non-positive.
    #[error("invalid numeric id: {0}")]
    InvalidNumericId(String),
}

// ============================================================================
// SECTION: Player / Game / Clip / Conversation Identifiers
// ============================================================================

/// NHL player identifier.
///
/// Stored as a string because upstream feeds alternate between integer and
/// float-formatted ids (`8480018` vs `8480018.0`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a player id from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a strictly numeric player id.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidNumericId`] when the value is not a
    /// positive integer.
    pub fn parse_numeric(value: &str) -> Result<Self, IdentifierError> {
        let trimmed = value.trim();
        let parsed: u64 = trimmed
            .parse()
            .map_err(|_| IdentifierError::InvalidNumericId(value.to_string()))?;
        if parsed == 0 {
            return Err(IdentifierError::InvalidNumericId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// NHL game identifier (positive integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(i64);

impl GameId {
    /// Creates a game id after checking positivity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidNumericId`] for non-positive values.
    pub fn new(value: i64) -> Result<Self, IdentifierError> {
        if value <= 0 {
            return Err(IdentifierError::InvalidNumericId(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External clip identifier (globally unique, opaque).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    /// Creates a clip id from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversation identifier (opaque, server-issued).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Creates a conversation id from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Team Code
// ============================================================================

/// Team abbreviation (`MTL`, `TOR`, ...), stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamCode(String);

impl TeamCode {
    /// Parses and uppercases a team abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidTeamCode`] when the value is not
    /// 2-4 ASCII letters.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let trimmed = value.trim();
        let valid = (2..=4).contains(&trimmed.len())
            && trimmed.chars().all(|c| c.is_ascii_alphabetic());
        if !valid {
            return Err(IdentifierError::InvalidTeamCode(value.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the uppercase abbreviation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Game Date
// ============================================================================

/// Calendar date in the strict `YYYY-MM-DD` wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameDate(Date);

impl GameDate {
    /// Parses a `YYYY-MM-DD` date string.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidDate`] on any other shape.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let trimmed = value.trim();
        if trimmed.len() != 10 {
            return Err(IdentifierError::InvalidDate(value.to_string()));
        }
        let date = Date::parse(trimmed, &Iso8601::DATE)
            .map_err(|_| IdentifierError::InvalidDate(value.to_string()))?;
        Ok(Self(date))
    }

    /// Returns the wrapped calendar date.
    #[must_use]
    pub const fn date(self) -> Date {
        self.0
    }

    /// Formats the date back to `YYYY-MM-DD`.
    #[must_use]
    pub fn as_wire(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }

    /// Returns the NHL season containing this date.
    ///
    /// Seasons roll over in July: a date in June belongs to the season that
    /// started the previous calendar year.
    #[must_use]
    pub fn season(&self) -> Season {
        let start_year = if u8::from(self.0.month()) >= u8::from(Month::July) {
            self.0.year()
        } else {
            self.0.year() - 1
        };
        Season(format!("{start_year}-{}", start_year + 1))
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire())
    }
}

impl Serialize for GameDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for GameDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Season
// ============================================================================

/// NHL season in `YYYY-YYYY` form with consecutive years.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(String);

impl Season {
    /// Parses a `YYYY-YYYY` season string.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidSeason`] when the halves are not
    /// consecutive four-digit years.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let trimmed = value.trim();
        let Some((start, end)) = trimmed.split_once('-') else {
            return Err(IdentifierError::InvalidSeason(value.to_string()));
        };
        let (Ok(start_year), Ok(end_year)) = (start.parse::<i32>(), end.parse::<i32>()) else {
            return Err(IdentifierError::InvalidSeason(value.to_string()));
        };
        if start.len() != 4 || end.len() != 4 || end_year != start_year + 1 {
            return Err(IdentifierError::InvalidSeason(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the season string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the starting calendar year of the season.
    #[must_use]
    pub fn start_year(&self) -> i32 {
        self.0.split('-').next().and_then(|y| y.parse().ok()).unwrap_or(0)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
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

    use super::GameDate;
    use super::GameId;
    use super::PlayerId;
    use super::Season;
    use super::TeamCode;

    #[test]
    fn game_date_accepts_wire_format_and_round_trips() {
        let date = GameDate::parse("2025-01-15").expect("valid date");
        assert_eq!(date.as_wire(), "2025-01-15");
    }

    #[test]
    fn game_date_rejects_loose_shapes() {
        assert!(GameDate::parse("2025-1-5").is_err());
        assert!(GameDate::parse("01/15/2025").is_err());
        assert!(GameDate::parse("2025-13-40").is_err());
        assert!(GameDate::parse("").is_err());
    }

    #[test]
    fn season_rollover_happens_in_july() {
        let june = GameDate::parse("2025-06-30").expect("valid date");
        let july = GameDate::parse("2025-07-01").expect("valid date");
        assert_eq!(june.season().as_str(), "2024-2025");
        assert_eq!(july.season().as_str(), "2025-2026");
    }

    #[test]
    fn season_requires_consecutive_years() {
        assert!(Season::parse("2024-2025").is_ok());
        assert!(Season::parse("2024-2026").is_err());
        assert!(Season::parse("2024").is_err());
    }

    #[test]
    fn team_code_uppercases_and_bounds_length() {
        assert_eq!(TeamCode::parse("mtl").expect("valid").as_str(), "MTL");
        assert!(TeamCode::parse("M").is_err());
        assert!(TeamCode::parse("MONTREAL").is_err());
        assert!(TeamCode::parse("M7L").is_err());
    }

    #[test]
    fn numeric_ids_reject_zero_and_garbage() {
        assert!(PlayerId::parse_numeric("8480018").is_ok());
        assert!(PlayerId::parse_numeric("0").is_err());
        assert!(PlayerId::parse_numeric("suzuki").is_err());
        assert!(GameId::new(2024020500).is_ok());
        assert!(GameId::new(0).is_err());
    }
}
