// crates/puckboard-market/src/efficiency.rs
// ============================================================================
// Module: Contract Efficiency
// Description: Position-weighted contract efficiency index.
// Purpose: Score contract value on a 0-200 scale where 100 is league average.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Contract efficiency composes position-weighted sub-scores: production
//! value (points/60 and xG/60 against a positional cap baseline), defensive
//! value, an age-curve adjustment, and a term penalty. Goalies swap the
//! production pair for save percentage and goals saved above expected. Each
//! sub-score is a ratio to the positional league baseline clipped to
//! [0, 200]; the composite is exactly the sum of the post-weight components.
//! Market value keeps the positional piecewise-linear heuristic for v1.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// League-average cap hit by position category.
const LEAGUE_AVG_CAP_HIT: [(PositionCategory, f64); 3] = [
    (PositionCategory::Forward, 2_500_000.0),
    (PositionCategory::Defense, 2_800_000.0),
    (PositionCategory::Goalie, 2_200_000.0),
];
/// League-average save percentage for goalie scaling.
const LEAGUE_SV_PCT: f64 = 0.905;
/// Sub-score ceiling.
const COMPONENT_CEILING: f64 = 200.0;
/// Market value floor in dollars.
const MARKET_VALUE_FLOOR: f64 = 750_000.0;
/// Market value ceiling in dollars.
const MARKET_VALUE_CEILING: f64 = 15_000_000.0;

// ============================================================================
// SECTION: Position Categories
// ============================================================================

/// Position category driving weights and baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionCategory {
    /// Centers and wingers.
    Forward,
    /// Defensemen.
    Defense,
    /// Goaltenders.
    Goalie,
}

impl PositionCategory {
    /// Categorizes a position label; unknown labels default to forward.
    #[must_use]
    pub fn from_label(position: &str) -> Self {
        match position.trim().to_ascii_uppercase().as_str() {
            "D" | "LD" | "RD" => Self::Defense,
            "G" => Self::Goalie,
            _ => Self::Forward,
        }
    }

    /// League-average cap hit for this category.
    #[must_use]
    pub fn league_avg_cap_hit(self) -> f64 {
        LEAGUE_AVG_CAP_HIT
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, avg)| *avg)
            .unwrap_or(2_500_000.0)
    }

    /// Component weights: production, secondary production, defense,
    /// age, term.
    #[must_use]
    pub const fn weights(self) -> [f64; 5] {
        match self {
            Self::Forward => [0.40, 0.25, 0.15, 0.10, 0.10],
            Self::Defense => [0.20, 0.20, 0.35, 0.15, 0.10],
            Self::Goalie => [0.40, 0.30, 0.15, 0.10, 0.05],
        }
    }
}

// ============================================================================
// SECTION: Inputs and Outputs
// ============================================================================

/// Player performance inputs for efficiency scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Points per 60 (skaters).
    #[serde(default)]
    pub points_per_60: f64,
    /// Expected goals per 60 (skaters).
    #[serde(default)]
    pub xg_per_60: f64,
    /// Defensive rating on a 0-100 scale.
    #[serde(default)]
    pub defensive_rating: f64,
    /// Save percentage (goalies), e.g. `0.912`.
    #[serde(default)]
    pub save_percentage: f64,
    /// Goals saved above expected (goalies).
    #[serde(default)]
    pub goals_saved_above_expected: f64,
}

/// Contract inputs for efficiency scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    /// Cap hit in dollars.
    pub cap_hit: f64,
    /// Seasons remaining including the current one.
    pub years_remaining: i64,
    /// Player age.
    pub age: i64,
}

/// Post-weight components of the efficiency composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyComponents {
    /// Primary production value (points/60, or save % for goalies).
    pub production_value: f64,
    /// Secondary production value (xG/60, or GSAx for goalies).
    pub secondary_value: f64,
    /// Defensive value (workload value for goalies).
    pub defensive_value: f64,
    /// Age-curve adjustment.
    pub age_adjustment: f64,
    /// Term penalty.
    pub term_penalty: f64,
}

/// Contract efficiency report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyReport {
    /// Composite index; equals the component sum within 1e-6.
    pub contract_efficiency: f64,
    /// Estimated fair market value in dollars.
    pub market_value: f64,
    /// Market value minus cap hit.
    pub surplus_value: f64,
    /// Post-weight components.
    pub components: EfficiencyComponents,
    /// Status band: overperforming, fair, or underperforming.
    pub status: String,
    /// Estimated league percentile.
    pub percentile: f64,
}

// ============================================================================
// SECTION: Sub-Scores
// ============================================================================

/// Production-per-dollar value against the positional baseline, clipped.
fn production_value(production: f64, cap_hit: f64, league_avg: f64, weight: f64) -> f64 {
    if cap_hit <= 0.0 || league_avg <= 0.0 || production <= 0.0 {
        return 0.0;
    }
    let value_per_dollar = production / cap_hit;
    let baseline = production / league_avg;
    let normalized = if baseline > 0.0 {
        (value_per_dollar / baseline * 100.0).min(COMPONENT_CEILING)
    } else {
        50.0
    };
    normalized * weight
}

/// Defensive value; the rating is already on the 0-100 scale.
fn defensive_value(rating: f64, weight: f64) -> f64 {
    rating.clamp(0.0, 100.0) * weight
}

/// Goalie save-percentage value against the league mark, clipped.
fn goalie_value(save_pct: f64, weight: f64) -> f64 {
    let normalized = ((save_pct - LEAGUE_SV_PCT) / 0.015 + 1.0) * 100.0;
    normalized.clamp(0.0, COMPONENT_CEILING) * weight
}

/// Age-curve factor: peak at 24-28, ramp below, decline above.
fn age_curve(age: i64, weight: f64) -> f64 {
    let age = age as f64;
    let factor = if (24.0..=28.0).contains(&age) {
        100.0
    } else if age < 24.0 {
        (age - 20.0).mul_add(3.75, 85.0)
    } else {
        (100.0 - (age - 28.0) * 5.0).max(50.0)
    };
    factor * weight
}

/// Term factor: sweet spot at 3-5 years, penalties outside.
fn term_penalty(years_remaining: i64, weight: f64) -> f64 {
    let years = years_remaining.max(0) as f64;
    let factor = if (3.0..=5.0).contains(&years) {
        100.0
    } else if years < 3.0 {
        years.mul_add(10.0, 70.0)
    } else {
        (100.0 - (years - 5.0) * 5.0).max(60.0)
    };
    factor * weight
}

/// Piecewise-linear market value heuristic (v1).
fn estimate_market_value(stats: &PlayerStats, category: PositionCategory) -> f64 {
    let base = match category {
        PositionCategory::Forward => stats.points_per_60 * 500_000.0,
        PositionCategory::Defense => stats.points_per_60 * 750_000.0,
        PositionCategory::Goalie => (stats.save_percentage - 0.890) * 50_000_000.0,
    };
    base.clamp(MARKET_VALUE_FLOOR, MARKET_VALUE_CEILING)
}

/// Status banding of the composite.
fn classify(efficiency: f64) -> &'static str {
    if efficiency >= 120.0 {
        "overperforming"
    } else if efficiency >= 80.0 {
        "fair"
    } else {
        "underperforming"
    }
}

/// Percentile estimate anchored at 100 = 50th.
fn estimate_percentile(efficiency: f64) -> f64 {
    let percentile = if efficiency >= 100.0 {
        (efficiency - 100.0).mul_add(0.8, 50.0)
    } else {
        efficiency * 0.5
    };
    percentile.clamp(0.0, 100.0)
}

// ============================================================================
// SECTION: Composite
// ============================================================================

/// Computes the position-weighted contract efficiency report.
#[must_use]
pub fn compute_contract_efficiency(
    stats: &PlayerStats,
    terms: &ContractTerms,
    position: &str,
) -> EfficiencyReport {
    let category = PositionCategory::from_label(position);
    let weights = category.weights();
    let league_avg = category.league_avg_cap_hit();

    let components = match category {
        PositionCategory::Forward | PositionCategory::Defense => EfficiencyComponents {
            production_value: production_value(
                stats.points_per_60,
                terms.cap_hit,
                league_avg,
                weights[0],
            ),
            secondary_value: production_value(
                stats.xg_per_60,
                terms.cap_hit,
                league_avg,
                weights[1],
            ),
            defensive_value: defensive_value(stats.defensive_rating, weights[2]),
            age_adjustment: age_curve(terms.age, weights[3]),
            term_penalty: term_penalty(terms.years_remaining, weights[4]),
        },
        PositionCategory::Goalie => EfficiencyComponents {
            production_value: goalie_value(stats.save_percentage, weights[0]),
            secondary_value: production_value(
                stats.goals_saved_above_expected,
                terms.cap_hit,
                league_avg,
                weights[1],
            ),
            defensive_value: defensive_value(50.0, weights[2]),
            age_adjustment: age_curve(terms.age, weights[3]),
            term_penalty: term_penalty(terms.years_remaining, weights[4]),
        },
    };

    let contract_efficiency = components.production_value
        + components.secondary_value
        + components.defensive_value
        + components.age_adjustment
        + components.term_penalty;

    let market_value = estimate_market_value(stats, category);
    EfficiencyReport {
        contract_efficiency,
        market_value,
        surplus_value: market_value - terms.cap_hit,
        components,
        status: classify(contract_efficiency).to_string(),
        percentile: estimate_percentile(contract_efficiency),
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

    use super::ContractTerms;
    use super::PlayerStats;
    use super::PositionCategory;
    use super::compute_contract_efficiency;

    fn skater_stats() -> PlayerStats {
        PlayerStats {
            points_per_60: 2.4,
            xg_per_60: 0.9,
            defensive_rating: 60.0,
            save_percentage: 0.0,
            goals_saved_above_expected: 0.0,
        }
    }

    #[test]
    fn composite_equals_component_sum_within_tolerance() {
        let report = compute_contract_efficiency(
            &skater_stats(),
            &ContractTerms {
                cap_hit: 2_000_000.0,
                years_remaining: 4,
                age: 26,
            },
            "C",
        );
        let sum = report.components.production_value
            + report.components.secondary_value
            + report.components.defensive_value
            + report.components.age_adjustment
            + report.components.term_penalty;
        assert!((report.contract_efficiency - sum).abs() < 1e-6);
    }

    #[test]
    fn cheaper_contract_scores_higher_for_equal_production() {
        let terms = |cap_hit| ContractTerms {
            cap_hit,
            years_remaining: 4,
            age: 26,
        };
        let cheap = compute_contract_efficiency(&skater_stats(), &terms(1_500_000.0), "C");
        let rich = compute_contract_efficiency(&skater_stats(), &terms(9_000_000.0), "C");
        assert!(cheap.contract_efficiency > rich.contract_efficiency);
        assert_eq!(cheap.status, "overperforming");
    }

    #[test]
    fn age_curve_matches_the_contract_breakpoints() {
        let stats = skater_stats();
        let at = |age| {
            compute_contract_efficiency(
                &stats,
                &ContractTerms {
                    cap_hit: 2_500_000.0,
                    years_remaining: 4,
                    age,
                },
                "C",
            )
            .components
            .age_adjustment
        };
        // Weight for forwards is 0.10.
        assert!((at(26) - 10.0).abs() < 1e-9);
        assert!((at(22) - (85.0 + 2.0 * 3.75) * 0.10).abs() < 1e-9);
        assert!((at(34) - 7.0).abs() < 1e-9);
        assert!((at(45) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn term_penalty_matches_the_contract_breakpoints() {
        let stats = skater_stats();
        let at = |years| {
            compute_contract_efficiency(
                &stats,
                &ContractTerms {
                    cap_hit: 2_500_000.0,
                    years_remaining: years,
                    age: 26,
                },
                "C",
            )
            .components
            .term_penalty
        };
        assert!((at(4) - 10.0).abs() < 1e-9);
        assert!((at(1) - 8.0).abs() < 1e-9);
        assert!((at(8) - 8.5).abs() < 1e-9);
        assert!((at(20) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn goalies_use_save_percentage_scaling() {
        let stats = PlayerStats {
            points_per_60: 0.0,
            xg_per_60: 0.0,
            defensive_rating: 0.0,
            save_percentage: 0.920,
            goals_saved_above_expected: 10.0,
        };
        let report = compute_contract_efficiency(
            &stats,
            &ContractTerms {
                cap_hit: 2_200_000.0,
                years_remaining: 4,
                age: 27,
            },
            "G",
        );
        assert!(report.components.production_value > 0.0);
        assert!(report.market_value > 1_000_000.0);
    }

    #[test]
    fn market_value_is_floored_and_capped() {
        let quiet = PlayerStats {
            points_per_60: 0.1,
            ..PlayerStats::default()
        };
        let report = compute_contract_efficiency(
            &quiet,
            &ContractTerms {
                cap_hit: 800_000.0,
                years_remaining: 1,
                age: 24,
            },
            "LW",
        );
        assert!((report.market_value - 750_000.0).abs() < f64::EPSILON);
        let elite = PlayerStats {
            points_per_60: 100.0,
            ..PlayerStats::default()
        };
        let report = compute_contract_efficiency(
            &elite,
            &ContractTerms {
                cap_hit: 10_000_000.0,
                years_remaining: 5,
                age: 27,
            },
            "RW",
        );
        assert!((report.market_value - 15_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn position_labels_categorize_with_forward_default() {
        assert_eq!(PositionCategory::from_label("LD"), PositionCategory::Defense);
        assert_eq!(PositionCategory::from_label("g"), PositionCategory::Goalie);
        assert_eq!(PositionCategory::from_label("W"), PositionCategory::Forward);
        assert_eq!(PositionCategory::from_label("??"), PositionCategory::Forward);
    }
}
