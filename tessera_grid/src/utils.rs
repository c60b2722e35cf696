// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lenient coercion of loosely typed configuration values.
//!
//! Configuration arrives as [`serde_json::Value`] so that a bad number or a stray string takes
//! the same warn-and-fall-back path everywhere.

use serde_json::Value;
use tracing::warn;

/// Truthiness of a loosely typed value.
///
/// `null`, `false`, `0`, `NaN` and the empty string are falsy. Everything else, including empty
/// arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Same as [`is_truthy`], on an optional value where absence is falsy.
pub fn is_truthy_opt(value: Option<&Value>) -> bool {
    value.is_some_and(is_truthy)
}

/// Coerces an attribute value to a boolean.
///
/// Any string counts as `true`, the literal `"false"` included. Callers that expose this to
/// users should document it.
pub fn normalize_boolean(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        other => is_truthy(other),
    }
}

/// Parses a non-negative integer given either as a JSON number or a string of digits.
///
/// `0` is accepted. Fractions, negatives, exponents and values beyond `u32` are not.
pub fn parse_positive_integer(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

/// Parses `value` as a non-negative integer, warning and returning `fallback` when it is not one.
pub fn normalize_positive_integer(attribute: &str, value: &Value, fallback: u32) -> u32 {
    parse_positive_integer(value).unwrap_or_else(|| {
        warn!(
            attribute,
            %value,
            fallback,
            "expected a non-negative integer, using the default"
        );
        fallback
    })
}

/// Clamps `num` into `[min, max]`.
///
/// Unlike [`Ord::clamp`] this never panics: when `min > max` the lower bound wins.
pub fn clamp(num: u32, min: u32, max: u32) -> u32 {
    if num <= min {
        min
    } else if num >= max {
        max
    } else {
        num
    }
}

/// Renders a key-like value as a string.
///
/// Strings are taken as is, numbers and booleans use their display form, anything else falls
/// back to its JSON text.
pub fn value_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(!is_truthy_opt(None));
    }

    #[test]
    fn any_string_normalizes_to_true() {
        assert!(normalize_boolean(&json!("false")), "string truthiness, not parsing");
        assert!(!normalize_boolean(&json!(false)));
        assert!(!normalize_boolean(&json!(null)));
    }

    #[test]
    fn positive_integers_accept_digits_and_zero() {
        assert_eq!(parse_positive_integer(&json!(0)), Some(0));
        assert_eq!(parse_positive_integer(&json!("42")), Some(42));
        assert_eq!(parse_positive_integer(&json!(-1)), None);
        assert_eq!(parse_positive_integer(&json!(1.5)), None);
        assert_eq!(parse_positive_integer(&json!("4a")), None);
        assert_eq!(parse_positive_integer(&json!("")), None);
        assert_eq!(normalize_positive_integer("resizeStep", &json!("abc"), 10), 10);
    }

    #[test]
    fn clamp_prefers_min_when_bounds_cross() {
        assert_eq!(clamp(5, 10, 20), 10);
        assert_eq!(clamp(25, 10, 20), 20);
        assert_eq!(clamp(15, 10, 20), 15);
        assert_eq!(clamp(15, 30, 20), 30);
    }

    #[test]
    fn keys_render_numbers_plainly() {
        assert_eq!(value_to_key(&json!("a")), "a");
        assert_eq!(value_to_key(&json!(7)), "7");
    }
}
