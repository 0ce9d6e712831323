// crates/puckboard-core/src/core/user.rs
// ============================================================================
// Module: Principals and Roles
// Description: Request-scoped user identity with role and team scoping.
// Purpose: Carry the authenticated principal through every handler and tool.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`User`] is created at authentication and lives for the request; there
//! are no server-side sessions. The role drives clip-access policy and the
//! `user_role` field of query responses. Preferences carry an optional
//! timezone (set from request headers) and, for player principals, the
//! player's own NHL id used by the clip policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Role
// ============================================================================

/// Principal role.
///
/// # Invariants
/// - Variants are stable for policy decisions and response labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Coaching staff.
    Coach,
    /// Active player; clip access restricted to own clips.
    Player,
    /// Analytics staff.
    Analyst,
    /// Scouting staff.
    Scout,
    /// Front-office staff.
    Staff,
}

impl Role {
    /// Returns a stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coach => "coach",
            Self::Player => "player",
            Self::Analyst => "analyst",
            Self::Scout => "scout",
            Self::Staff => "staff",
        }
    }

    /// Parses a role label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coach" => Some(Self::Coach),
            "player" => Some(Self::Player),
            "analyst" => Some(Self::Analyst),
            "scout" => Some(Self::Scout),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Preferences
// ============================================================================

/// Per-request user preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// IANA timezone name supplied by the client; invalid values are dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// NHL player id for player principals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

// ============================================================================
// SECTION: User
// ============================================================================

/// Authenticated principal for a single request.
///
/// # Invariants
/// - `team_access` entries are uppercase team abbreviations; the sentinel
///   `ALL` grants access to every team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable username of the principal.
    pub user_id: String,
    /// Principal role.
    pub role: Role,
    /// Human-readable display name.
    pub display_name: String,
    /// Team abbreviations this principal may read.
    pub team_access: BTreeSet<String>,
    /// Request-scoped preferences.
    #[serde(default)]
    pub preferences: Preferences,
}

impl User {
    /// Returns true when the principal may read data for the given team.
    #[must_use]
    pub fn can_access_team(&self, team: &str) -> bool {
        self.team_access.contains("ALL") || self.team_access.contains(&team.to_ascii_uppercase())
    }

    /// Applies a client-supplied timezone, silently dropping invalid values.
    ///
    /// A value is accepted when it looks like an IANA zone name
    /// (`Region/City`) or `UTC`; anything else is ignored rather than fatal.
    pub fn apply_timezone(&mut self, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };
        let trimmed = raw.trim();
        let plausible = trimmed == "UTC"
            || (trimmed.contains('/')
                && trimmed.len() <= 64
                && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || "/_+-".contains(c)));
        if plausible {
            self.preferences.timezone = Some(trimmed.to_string());
        }
    }
}

// ============================================================================
// SECTION: Player Id Normalization
// ============================================================================

/// Normalizes a player id for RBAC comparison.
///
/// Upstream exports sometimes render integer ids as floats (`8480018.0`);
/// the trailing `.0` is stripped so both forms compare equal.
#[must_use]
pub fn normalize_player_id(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
