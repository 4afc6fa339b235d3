//! Tolerant readers for Unistats fields
//!
//! The Unistats API is loose about scalar types: identifiers arrive as
//! numbers or strings, indicators as `0`/`1` or `"0"`/`"1"`, and course
//! lengths as strings that may be empty. These helpers read such values the
//! same way everywhere.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a string-or-number field into an optional string.
///
/// Numbers are rendered in their decimal form, `null` and absent fields
/// become `None`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

/// Render a scalar JSON value as a string
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric reading of an indicator field; anything non-numeric reads as zero.
fn numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// True iff the indicator is present and numerically greater than zero
pub fn indicator(value: Option<&Value>) -> bool {
    value.map(numeric).is_some_and(|n| n > 0.0)
}

/// Read a whole number of years.
///
/// Empty strings, zero (as a number or a string), and values with no leading
/// digits yield `None` so that "unknown" stays distinguishable from a real
/// length.
pub fn whole_years(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => {
            let years = n.as_f64()?.trunc();
            if years == 0.0 || !years.is_finite() {
                None
            } else {
                Some(years as i32)
            }
        }
        Value::String(s) => leading_integer(s).filter(|years| *years != 0),
        _ => None,
    }
}

/// Parse the leading integer of a string, ignoring any trailing text ("3 years" -> 3)
fn leading_integer(s: &str) -> Option<i32> {
    let trimmed = s.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first()? {
        b'-' => (-1, &trimmed[1..]),
        b'+' => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i32>().ok().map(|n| sign * n)
}

/// Read a yes/no flag that may be encoded as a boolean, number or string
pub fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
