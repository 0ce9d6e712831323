// crates/puckboard-scenario/src/waivers.rs
// ============================================================================
// Module: Waiver Eligibility
// Description: Waiver exemption as a pure function of player biography.
// Purpose: Decide whether a minors assignment clears waivers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Waiver exemption approximates league rules from age at first signing and
//! NHL games plus pro seasons since: players signed at 19 or younger stay
//! exempt until 160 NHL games or 5 pro seasons; players signed at 20 or
//! older until 80 games or 4 seasons, whichever comes first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Game threshold for players signed at 19 or younger.
const YOUNG_GAMES_THRESHOLD: i64 = 160;
/// Season threshold for players signed at 19 or younger.
const YOUNG_SEASONS_THRESHOLD: i64 = 5;
/// Game threshold for players signed at 20 or older.
const OLDER_GAMES_THRESHOLD: i64 = 80;
/// Season threshold for players signed at 20 or older.
const OLDER_SEASONS_THRESHOLD: i64 = 4;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Biography inputs for the waiver decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiverInputs {
    /// Player age at the earliest signing date.
    pub age_at_signing: i64,
    /// NHL games played since the earliest signing.
    pub nhl_games_since_signing: i64,
    /// Pro seasons with at least one NHL game since signing.
    pub pro_seasons_since_signing: i64,
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Returns true when the player can be assigned without clearing waivers.
#[must_use]
pub const fn is_waiver_exempt(inputs: &WaiverInputs) -> bool {
    let (games_threshold, seasons_threshold) = if inputs.age_at_signing <= 19 {
        (YOUNG_GAMES_THRESHOLD, YOUNG_SEASONS_THRESHOLD)
    } else {
        (OLDER_GAMES_THRESHOLD, OLDER_SEASONS_THRESHOLD)
    };
    inputs.nhl_games_since_signing < games_threshold
        && inputs.pro_seasons_since_signing < seasons_threshold
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

    use super::WaiverInputs;
    use super::is_waiver_exempt;

    #[test]
    fn young_signing_uses_the_higher_thresholds() {
        let rookie = WaiverInputs {
            age_at_signing: 18,
            nhl_games_since_signing: 120,
            pro_seasons_since_signing: 3,
        };
        assert!(is_waiver_exempt(&rookie));
        let played_out = WaiverInputs {
            age_at_signing: 18,
            nhl_games_since_signing: 160,
            pro_seasons_since_signing: 3,
        };
        assert!(!is_waiver_exempt(&played_out));
    }

    #[test]
    fn older_signing_uses_the_lower_thresholds() {
        let signee = WaiverInputs {
            age_at_signing: 22,
            nhl_games_since_signing: 79,
            pro_seasons_since_signing: 3,
        };
        assert!(is_waiver_exempt(&signee));
        let seasoned = WaiverInputs {
            age_at_signing: 22,
            nhl_games_since_signing: 10,
            pro_seasons_since_signing: 4,
        };
        assert!(!is_waiver_exempt(&seasoned));
    }

    #[test]
    fn either_threshold_ends_the_exemption() {
        let games_out = WaiverInputs {
            age_at_signing: 19,
            nhl_games_since_signing: 200,
            pro_seasons_since_signing: 1,
        };
        assert!(!is_waiver_exempt(&games_out));
        let seasons_out = WaiverInputs {
            age_at_signing: 19,
            nhl_games_since_signing: 10,
            pro_seasons_since_signing: 5,
        };
        assert!(!is_waiver_exempt(&seasons_out));
    }
}
