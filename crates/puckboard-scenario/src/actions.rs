// crates/puckboard-scenario/src/actions.rs
// ============================================================================
// Module: Scenario Actions
// Description: Tagged roster action variants with player references.
// Purpose: Model what-if roster moves as data.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Actions are tagged variants carrying a player reference by id or name.
//! The engine resolves references before applying; unknown references are
//! skipped with a warning rather than failing the scenario.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Action Kind
// ============================================================================

/// Roster action kind.
///
/// # Invariants
/// - Variants are stable wire labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Add a player already in the organization to the roster.
    AddPlayer,
    /// Remove a player from the roster entirely.
    RemovePlayer,
    /// Recall a player from the minors.
    CallUp,
    /// Assign a player to the minors.
    SendDown,
    /// Place a player on injured reserve.
    PlaceIr,
    /// Place a player on long-term injured reserve (cap relief).
    PlaceLtir,
    /// Acquire an external player.
    AcquirePlayer,
}

impl ActionKind {
    /// Returns true when the action brings a player onto the roster.
    #[must_use]
    pub const fn is_addition(self) -> bool {
        matches!(self, Self::AddPlayer | Self::CallUp | Self::AcquirePlayer)
    }

    /// Returns true when the action is restricted by the trade deadline.
    #[must_use]
    pub const fn is_deadline_restricted(self) -> bool {
        matches!(self, Self::AddPlayer | Self::AcquirePlayer)
    }

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddPlayer => "add_player",
            Self::RemovePlayer => "remove_player",
            Self::CallUp => "call_up",
            Self::SendDown => "send_down",
            Self::PlaceIr => "place_ir",
            Self::PlaceLtir => "place_ltir",
            Self::AcquirePlayer => "acquire_player",
        }
    }
}

// ============================================================================
// SECTION: Action
// ============================================================================

/// One roster action with its player reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action kind.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Player id reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<i64>,
    /// Player name reference (partial match).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    /// Free-form annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Action {
    /// Builds an action referencing a player by id.
    #[must_use]
    pub const fn by_id(kind: ActionKind, player_id: i64) -> Self {
        Self {
            kind,
            player_id: Some(player_id),
            player_name: None,
            notes: None,
        }
    }

    /// Builds an action referencing a player by name.
    #[must_use]
    pub fn by_name(kind: ActionKind, player_name: impl Into<String>) -> Self {
        Self {
            kind,
            player_id: None,
            player_name: Some(player_name.into()),
            notes: None,
        }
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

    use super::Action;
    use super::ActionKind;

    #[test]
    fn actions_round_trip_with_snake_case_tags() {
        let action = Action::by_name(ActionKind::AcquirePlayer, "Kirby Dach");
        let value = serde_json::to_value(&action).expect("serialize");
        assert_eq!(value["type"], "acquire_player");
        let back: Action = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, action);
    }

    #[test]
    fn deadline_restriction_covers_acquiring_kinds_only() {
        assert!(ActionKind::AcquirePlayer.is_deadline_restricted());
        assert!(ActionKind::AddPlayer.is_deadline_restricted());
        assert!(!ActionKind::SendDown.is_deadline_restricted());
        assert!(!ActionKind::PlaceLtir.is_deadline_restricted());
    }
}
