// crates/puckboard-media/src/policy.rs
// ============================================================================
// Module: Clip Access Policy
// Description: Single policy function behind both auth resolvers.
// Purpose: Decide clip access from role, ownership, and the dev override.
// Dependencies: crate::store, puckboard-core
// ============================================================================

//! ## Overview
//! One policy function decides clip access for both the strict and the
//! permissive (media URL) resolvers: coach, analyst, staff, and scout
//! principals see everything; players see only their own clips, compared on
//! normalized player ids (trailing `.0` stripped); the dev override flag
//! allows all. Existence is checked before policy by the caller: a missing
//! clip is `not_found`, an existing denied clip is `forbidden`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use puckboard_core::Role;
use puckboard_core::User;
use puckboard_core::normalize_player_id;

use crate::store::ClipRecord;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Clip access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipAccess {
    /// Access granted.
    Allow,
    /// Access denied (caller emits `forbidden`).
    Deny,
}

/// Decides whether a user may access a clip.
#[must_use]
pub fn check_clip_access(user: &User, clip: &ClipRecord, open_access: bool) -> ClipAccess {
    if open_access {
        return ClipAccess::Allow;
    }
    match user.role {
        Role::Coach | Role::Analyst | Role::Staff | Role::Scout => ClipAccess::Allow,
        Role::Player => {
            let own = user
                .preferences
                .player_id
                .as_deref()
                .map(normalize_player_id)
                .is_some_and(|own_id| own_id == normalize_player_id(&clip.player_id));
            if own { ClipAccess::Allow } else { ClipAccess::Deny }
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

    use std::collections::BTreeSet;

    use puckboard_core::Preferences;
    use puckboard_core::Role;
    use puckboard_core::User;

    use super::ClipAccess;
    use super::check_clip_access;
    use crate::store::ClipRecord;
    use crate::store::ProcessingStatus;

    /// Builds a clip featuring the given player id.
    fn clip(player_id: &str) -> ClipRecord {
        ClipRecord {
            internal_pk: 1,
            clip_id: "c1".to_string(),
            player_id: player_id.to_string(),
            player_name: "Nick Suzuki".to_string(),
            team_code: "MTL".to_string(),
            opponent_code: "BOS".to_string(),
            game_id: "2024020500".to_string(),
            game_date: "2025-01-15".to_string(),
            season: "2024-2025".to_string(),
            period: 2,
            event_type: "goal".to_string(),
            outcome: "scored".to_string(),
            zone: "oz".to_string(),
            start_s: 0.0,
            end_s: 12.0,
            duration_s: 12.0,
            source_uri: String::new(),
            processing_status: ProcessingStatus::Ready,
            created_ts: 0,
            updated_ts: 0,
        }
    }

    /// Builds a user with the given role and optional own player id.
    fn user(role: Role, player_id: Option<&str>) -> User {
        User {
            user_id: "someone".to_string(),
            role,
            display_name: "Someone".to_string(),
            team_access: BTreeSet::from(["MTL".to_string()]),
            preferences: Preferences {
                timezone: None,
                player_id: player_id.map(str::to_string),
            },
        }
    }

    #[test]
    fn staff_roles_always_allow() {
        for role in [Role::Coach, Role::Analyst, Role::Staff, Role::Scout] {
            assert_eq!(
                check_clip_access(&user(role, None), &clip("8480018"), false),
                ClipAccess::Allow
            );
        }
    }

    #[test]
    fn players_see_only_their_own_clips_with_float_suffix_normalization() {
        let suzuki = user(Role::Player, Some("8480018"));
        assert_eq!(
            check_clip_access(&suzuki, &clip("8480018.0"), false),
            ClipAccess::Allow
        );
        assert_eq!(check_clip_access(&suzuki, &clip("8481540"), false), ClipAccess::Deny);
        let no_id = user(Role::Player, None);
        assert_eq!(check_clip_access(&no_id, &clip("8480018"), false), ClipAccess::Deny);
    }

    #[test]
    fn dev_override_allows_everything() {
        let denied = user(Role::Player, Some("1"));
        assert_eq!(check_clip_access(&denied, &clip("8480018"), true), ClipAccess::Allow);
    }
}
