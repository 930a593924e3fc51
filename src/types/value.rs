//! Context values and the numeric coercion used by conditions and effects

use serde_json::Value;
use std::collections::BTreeMap;

/// Shared key-value state mutated by effects and read by conditions
pub type Context = BTreeMap<String, Value>;

/// Coerce a context value to a number
///
/// Missing, null and non-numeric values count as `0`; booleans count as `1`/`0`
/// and numeric strings are parsed after trimming.
pub fn as_number(value: Option<&Value>) -> f64 {
    let number = match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => 0.0,
    };

    if number.is_finite() { number } else { 0.0 }
}

/// Store a number, as an integer when it is whole
pub fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::from(number as i64)
    } else {
        serde_json::json!(number)
    }
}

/// Strict equality, with numbers compared by value (`2` equals `2.0`)
pub fn strict_eq(current: Option<&Value>, expected: &Value) -> bool {
    match (current, expected) {
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(current), expected) => current == expected,
        (None, _) => false,
    }
}
