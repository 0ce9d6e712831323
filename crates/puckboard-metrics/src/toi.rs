// crates/puckboard-metrics/src/toi.rs
// ============================================================================
// Module: Time-On-Ice Parsing
// Description: Permissive parsing of heterogeneous TOI encodings.
// Purpose: Turn MM:SS strings and numeric minutes into float minutes.
// Dependencies: crate::rows
// ============================================================================

//! ## Overview
//! Time-on-ice arrives as `MM:SS` strings or plain minute values. Numeric
//! values pass through as minutes; only genuinely missing or NaN entries
//! fall back to [`DEFAULT_TOI_MINUTES`], a documented assumption pending
//! dataset semantics review. Unparseable text yields zero minutes, and the
//! per-60 pipelines guard the division so zero-TOI rows rate at zero
//! rather than dividing by zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::rows::RawToi;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minutes assumed for rows with missing or NaN TOI.
pub const DEFAULT_TOI_MINUTES: f64 = 20.0;

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses a raw TOI value into minutes.
///
/// Missing and non-finite values take the documented default; parseable
/// values pass through unchanged (including zero); garbage text is zero.
#[must_use]
pub fn parse_toi_minutes(raw: Option<&RawToi>) -> f64 {
    match raw {
        Some(RawToi::Text(text)) => parse_text(text),
        Some(RawToi::Number(number)) if number.is_finite() => *number,
        Some(RawToi::Number(_)) | None => DEFAULT_TOI_MINUTES,
    }
}

/// Parses a textual TOI value (`MM:SS` or stringified minutes); 0 when the
/// text does not parse.
fn parse_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if let Some((minutes, seconds)) = trimmed.split_once(':') {
        let parsed = minutes
            .trim()
            .parse::<f64>()
            .ok()
            .zip(seconds.trim().parse::<f64>().ok())
            .map(|(m, s)| s.mul_add(1.0 / 60.0, m));
        return parsed.filter(|v| v.is_finite()).unwrap_or(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
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

    use super::DEFAULT_TOI_MINUTES;
    use super::parse_toi_minutes;
    use crate::rows::RawToi;

    /// Float comparison helper for parsed minutes.
    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mm_ss_strings_parse_to_fractional_minutes() {
        let raw = RawToi::Text("18:30".to_string());
        assert!(close(parse_toi_minutes(Some(&raw)), 18.5));
    }

    #[test]
    fn numeric_values_pass_through_as_minutes() {
        let raw = RawToi::Number(17.25);
        assert!(close(parse_toi_minutes(Some(&raw)), 17.25));
        // Large values are taken at face value, not reinterpreted.
        let large = RawToi::Number(1_110.0);
        assert!(close(parse_toi_minutes(Some(&large)), 1_110.0));
        let text = RawToi::Text("12.5".to_string());
        assert!(close(parse_toi_minutes(Some(&text)), 12.5));
    }

    #[test]
    fn zero_toi_is_preserved_not_defaulted() {
        let zero = RawToi::Number(0.0);
        assert!(close(parse_toi_minutes(Some(&zero)), 0.0));
        let zero_text = RawToi::Text("0:00".to_string());
        assert!(close(parse_toi_minutes(Some(&zero_text)), 0.0));
    }

    #[test]
    fn missing_and_nan_fall_back_to_the_default() {
        assert!(close(parse_toi_minutes(None), DEFAULT_TOI_MINUTES));
        let nan = RawToi::Number(f64::NAN);
        assert!(close(parse_toi_minutes(Some(&nan)), DEFAULT_TOI_MINUTES));
        let inf = RawToi::Number(f64::INFINITY);
        assert!(close(parse_toi_minutes(Some(&inf)), DEFAULT_TOI_MINUTES));
    }

    #[test]
    fn garbage_text_parses_to_zero_minutes() {
        let garbage = RawToi::Text("dnp".to_string());
        assert!(close(parse_toi_minutes(Some(&garbage)), 0.0));
        let half_garbage = RawToi::Text("12:xx".to_string());
        assert!(close(parse_toi_minutes(Some(&half_garbage)), 0.0));
    }
}
