// crates/puckboard-market/src/comparables.rs
// ============================================================================
// Module: Contract Comparables
// Description: Similarity scoring and ranking for comparable contracts.
// Purpose: Rank comparable deals on a 0-100 similarity scale.
// Dependencies: crate::efficiency, serde
// ============================================================================

//! ## Overview
//! Comparables similarity allocates 25 points to age proximity (−3 per year
//! of gap), 35 to production similarity (min/max ratio), 15 to position
//! match (7.5 for matching position type), 10 to contract-era proximity
//! (−1 per year), and 15 to cap-hit-percentage similarity. Missing
//! production or cap-percentage data scores the neutral half of its bucket.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::efficiency::PositionCategory;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Player profile used for similarity comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableProfile {
    /// Player full name.
    pub full_name: String,
    /// Player age.
    pub age: i64,
    /// Last-season production (points for skaters).
    #[serde(default)]
    pub production_last_season: f64,
    /// Position label.
    pub position: String,
    /// Calendar year the deal was signed.
    pub signing_year: i64,
    /// Cap hit as a percentage of the ceiling at signing.
    #[serde(default)]
    pub cap_hit_percentage: f64,
}

/// One scored comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableScore {
    /// The comparable player's profile.
    pub profile: ComparableProfile,
    /// Similarity on a 0-100 scale.
    pub similarity: f64,
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Ratio-based similarity of two positive magnitudes; `neutral` when either
/// side is missing.
fn ratio_points(a: f64, b: f64, bucket: f64) -> f64 {
    if a > 0.0 && b > 0.0 {
        (a.min(b) / a.max(b)) * bucket
    } else {
        bucket / 2.0
    }
}

/// Computes the 0-100 similarity score between two profiles.
#[must_use]
pub fn similarity_score(target: &ComparableProfile, candidate: &ComparableProfile) -> f64 {
    let mut score = 0.0;

    // Age proximity: 25 points, minus 3 per year of gap.
    let age_gap = (target.age - candidate.age).abs() as f64;
    score += age_gap.mul_add(-3.0, 25.0).max(0.0);

    // Production similarity: 35 points on the min/max ratio.
    score += ratio_points(
        target.production_last_season,
        candidate.production_last_season,
        35.0,
    );

    // Position match: 15 for exact, 7.5 for same position type.
    if target.position.eq_ignore_ascii_case(&candidate.position) {
        score += 15.0;
    } else if PositionCategory::from_label(&target.position)
        == PositionCategory::from_label(&candidate.position)
    {
        score += 7.5;
    }

    // Contract era: 10 points, minus 1 per year between signings.
    let era_gap = (target.signing_year - candidate.signing_year).abs() as f64;
    score += (10.0 - era_gap).max(0.0);

    // Cap-hit-percentage similarity: 15 points on the min/max ratio.
    score += ratio_points(target.cap_hit_percentage, candidate.cap_hit_percentage, 15.0);

    (score * 100.0).round() / 100.0
}

/// Ranks candidates by similarity, dropping scores below `min_similarity`.
#[must_use]
pub fn find_comparables(
    target: &ComparableProfile,
    candidates: &[ComparableProfile],
    min_similarity: f64,
    limit: usize,
) -> Vec<ComparableScore> {
    let mut scored: Vec<ComparableScore> = candidates
        .iter()
        .filter(|candidate| candidate.full_name != target.full_name)
        .map(|candidate| ComparableScore {
            profile: candidate.clone(),
            similarity: similarity_score(target, candidate),
        })
        .filter(|entry| entry.similarity >= min_similarity)
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.profile.full_name.cmp(&b.profile.full_name))
    });
    scored.truncate(limit);
    scored
}

// ============================================================================
// SECTION: Tests
// ============================================================================
