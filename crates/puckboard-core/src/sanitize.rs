// crates/puckboard-core/src/sanitize.rs
// ============================================================================
// Module: Numeric Sanitization
// Description: Single-pass replacement of non-finite floats with null.
// Purpose: Guarantee serialized payloads never carry NaN or infinity.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! One recursive pass over a JSON payload replaces every non-finite float
//! with `null`. The response layer runs this pass once before hashing and
//! once before serialization, replacing scattered per-call-site NaN handling.
//! Division-by-zero defaults (50 for percentages, 0 for counts) are applied
//! at computation sites; this pass is the backstop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Replaces non-finite numbers with null, recursively.
pub fn sanitize_in_place(value: &mut Value) {
    match value {
        Value::Number(number) => {
            if let Some(float) = number.as_f64()
                && !float.is_finite()
            {
                *value = Value::Null;
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize_in_place(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                sanitize_in_place(item);
            }
        }
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}

/// Returns a sanitized copy of the payload.
#[must_use]
pub fn sanitized(mut value: Value) -> Value {
    sanitize_in_place(&mut value);
    value
}

/// Converts a finite float to a JSON number, or null otherwise.
///
/// Use this when building payloads by hand so non-finite intermediates never
/// enter a [`Value`] in the first place.
#[must_use]
pub fn finite_or_null(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Returns `value` when finite, otherwise the supplied default.
#[must_use]
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
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

    use serde_json::Value;
    use serde_json::json;

    use super::finite_or;
    use super::finite_or_null;
    use super::sanitized;

    /// Walks a value asserting no number is non-finite.
    fn assert_all_finite(value: &Value) {
        match value {
            Value::Number(number) => {
                if let Some(float) = number.as_f64() {
                    assert!(float.is_finite());
                }
            }
            Value::Array(items) => items.iter().for_each(assert_all_finite),
            Value::Object(map) => map.values().for_each(assert_all_finite),
            Value::Null | Value::Bool(_) | Value::String(_) => {}
        }
    }

    #[test]
    fn finite_or_null_drops_nan_and_infinity() {
        assert_eq!(finite_or_null(f64::NAN), Value::Null);
        assert_eq!(finite_or_null(f64::INFINITY), Value::Null);
        assert_eq!(finite_or_null(f64::NEG_INFINITY), Value::Null);
        assert_eq!(finite_or_null(50.0), json!(50.0));
    }

    #[test]
    fn finite_or_applies_documented_defaults() {
        assert!((finite_or(f64::NAN, 50.0) - 50.0).abs() < f64::EPSILON);
        assert!((finite_or(0.25, 50.0) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn sanitized_payloads_contain_no_non_finite_floats() {
        let payload = json!({
            "rival_threat_index": [
                {"team": "BOS", "rti_score": finite_or_null(f64::NAN)},
                {"team": "TOR", "rti_score": 61.2},
            ],
            "nested": [[finite_or_null(f64::INFINITY), 1.5]],
        });
        let clean = sanitized(payload);
        assert_all_finite(&clean);
        assert_eq!(clean["rival_threat_index"][0]["rti_score"], Value::Null);
        assert_eq!(clean["rival_threat_index"][1]["rti_score"], json!(61.2));
    }
}
