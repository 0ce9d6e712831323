// crates/puckboard-metrics/src/stats.rs
// ============================================================================
// Module: Statistical Helpers
// Description: Mean, deviation, z-score, and rounding primitives.
// Purpose: Keep the cohort statistics used by every pipeline in one place.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Small numeric helpers shared by the metric pipelines. Standardization
//! uses the sample deviation; trend thresholds use the population deviation,
//! matching the historical behavior of the analytics stack. An undefined
//! deviation standardizes to zero rather than propagating NaN.

// ============================================================================
// SECTION: Aggregates
// ============================================================================

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().copied().filter(|v| v.is_finite()).sum();
    total / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator); 0 when undefined.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let center = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - center).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation (n denominator); 0 when undefined.
#[must_use]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let center = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - center).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Standardizes one value against a cohort; 0 when the deviation is 0.
#[must_use]
pub fn z_score(value: f64, cohort_mean: f64, cohort_std: f64) -> f64 {
    if cohort_std > 0.0 {
        (value - cohort_mean) / cohort_std
    } else {
        0.0
    }
}

/// Rounds to one decimal place for display scores.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Rounds to two decimal places for breakdown components.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamps a value into `[lo, hi]`.
#[must_use]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
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

    use super::clamp;
    use super::mean;
    use super::population_std;
    use super::round1;
    use super::sample_std;
    use super::z_score;

    #[test]
    fn mean_of_empty_slice_is_zero() {
        assert!((mean(&[])).abs() < f64::EPSILON);
    }

    #[test]
    fn sample_std_requires_two_values() {
        assert!((sample_std(&[5.0])).abs() < f64::EPSILON);
        assert!(sample_std(&[1.0, 3.0]) > 0.0);
    }

    #[test]
    fn population_std_is_smaller_than_sample_std() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(population_std(&values) < sample_std(&values));
    }

    #[test]
    fn degenerate_cohort_standardizes_to_zero() {
        assert!((z_score(3.0, 3.0, 0.0)).abs() < f64::EPSILON);
        assert!((z_score(5.0, 3.0, 2.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounding_and_clamping_behave() {
        assert!((round1(61.27) - 61.3).abs() < f64::EPSILON);
        assert!((clamp(130.0, 0.0, 100.0) - 100.0).abs() < f64::EPSILON);
        assert!((clamp(-3.0, 0.0, 100.0)).abs() < f64::EPSILON);
    }
}
