//! Helpers over the dynamic value type
//!
//! Configuration props, action params, state entries and remote payloads all
//! share one closed value type: [`serde_json::Value`]. The helpers here give it
//! the loose semantics the configuration language expects (truthiness, text
//! conversion, dotted-path lookup).

pub use serde_json::{Map, Value};

/// Whether a value counts as "set" in conditions and fallbacks.
///
/// `null`, `false`, `0`, and the empty string are falsy; every array and
/// object (even empty ones) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthiness of an optional value; absent is falsy.
pub fn is_truthy_opt(value: Option<&Value>) -> bool {
    value.is_some_and(is_truthy)
}

/// Convert a value to display text.
///
/// Strings are returned verbatim and `null` becomes the empty string. Arrays
/// join their stringified elements with commas; objects render as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Text for an optional value; absent becomes the empty string.
pub fn stringify_opt(value: Option<&Value>) -> String {
    value.map(stringify).unwrap_or_default()
}

/// Walk a dotted path into a value.
///
/// Object members are addressed by name and array elements by numeric
/// segment. Any missing segment yields `None`.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Walk a dotted path starting at an object map.
pub fn lookup_in_map<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let first = map.get(head)?;
    match rest {
        Some(rest) => lookup_path(first, rest),
        None => Some(first),
    }
}

/// Numeric coercion used by the numeric transforms.
///
/// Returns `None` where a loose numeric conversion would produce NaN.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [single] => coerce_number(single),
            _ => None,
        },
        Value::Object(_) => None,
    }
}
