// crates/puckboard-orchestrator/src/classify.rs
// ============================================================================
// Module: Query Classification
// Description: Clarification gate and lexical query-type inference.
// Purpose: Decide whether and which tools run for a query.
// Dependencies: puckboard-core
// ============================================================================

//! ## Overview
//! The clarification gate rejects degenerate input (empty, two characters or
//! fewer, punctuation-only, or a short greeting) before any tool runs.
//! Classification is lexical: cue words map the query onto one of the seven
//! dispatchable types, defaulting to `statistical` for plain lookups.

// ============================================================================
// SECTION: Imports
// ============================================================================

use puckboard_core::QueryType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Short greetings that trigger the clarification gate.
const SHORT_GREETINGS: [&str; 7] = ["hi", "hey", "yo", "ok", "k", "sup", "hello"];
/// Characters considered punctuation for the punctuation-only check.
const PUNCTUATION: &str = "?!.,;:-_ '";

// ============================================================================
// SECTION: Clarification Gate
// ============================================================================

/// Returns true when the input is too short or ambiguous to run tools.
#[must_use]
pub fn is_ambiguous(text: &str) -> bool {
    let trimmed = text.trim().to_lowercase();
    if trimmed.is_empty() || trimmed.chars().count() <= 2 {
        return true;
    }
    if trimmed.chars().all(|c| PUNCTUATION.contains(c)) {
        return true;
    }
    SHORT_GREETINGS.contains(&trimmed.as_str())
}

/// Builds the cooperative clarification message echoing the input.
#[must_use]
pub fn clarification_message(original: &str) -> String {
    format!(
        "I can help with NHL analytics. Could you clarify what you need?\n\n\
         For example, try one of these:\n\
         - Compare a player's xGF% over the last 10 games\n\
         - Show a team's power-play efficiency this season\n\
         - Retrieve clips of a player's goals against a specific opponent\n\
         - What is a team's expected goals trend this week?\n\n\
         You wrote: '{}'. A bit more detail will help me give a precise answer.",
        original.trim()
    )
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Returns true when any cue appears in the lowercased query.
fn any_cue(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| text.contains(cue))
}

/// Infers the query type from lexical cues.
#[must_use]
pub fn classify_query(text: &str) -> QueryType {
    let lower = text.to_lowercase();
    if any_cue(&lower, &["clip", "video", "highlight", "footage", "watch"]) {
        return QueryType::ClipRetrieval;
    }
    if any_cue(&lower, &["matchup", "versus", " vs ", " vs.", "against the", "head-to-head"]) {
        return QueryType::Matchup;
    }
    if any_cue(&lower, &["forecheck", "breakout", "system", "zone entry", "tactic", "deployment"])
    {
        return QueryType::Tactical;
    }
    if any_cue(&lower, &["game", "last night", "boxscore", "play-by-play", "period"]) {
        return QueryType::GameAnalysis;
    }
    if any_cue(
        &lower,
        &["team", "power play", "penalty kill", "standings", "pace", "line", "pdo"],
    ) {
        return QueryType::TeamAnalytics;
    }
    if any_cue(&lower, &["form", "trending", "how is", "performance", "playing", "slump"]) {
        return QueryType::PlayerPerformance;
    }
    QueryType::Statistical
}

// ============================================================================
// SECTION: Tests
// ============================================================================
