//! Named value transforms
//!
//! Bindings and data fetches refer to transforms by name. Every transform is
//! total: malformed input produces a documented fallback, never a panic.
//!
//! | Name          | Result                                   | Fallback          |
//! |---------------|------------------------------------------|-------------------|
//! | `toOptions`   | `[{label, value}]` from a collection     | `[]`              |
//! | `toString`    | display text                             | `""` for null     |
//! | `toNumber`    | number                                   | `0`               |
//! | `toDate`      | `M/D/YYYY` in local time                 | today's date      |
//! | `toUpperCase` | upper-cased text                         |                   |
//! | `toLowerCase` | lower-cased text                         |                   |
//! | `toBoolean`   | truthiness                               |                   |
//! | `toCurrency`  | `$1,234.50`                              | `$0.00`           |
//! | `toJSON`      | pretty-printed JSON text                 | `{}`              |
//! | `toArray`     | the array, or `[value]` when truthy      | `[]`              |
//! | `toFixed`     | text with two decimals                   | `0.00`            |
//! | `toPercent`   | `x * 100` with one decimal and `%`       | `0.0%`            |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::json;

use crate::value::{coerce_number, is_truthy, lookup_path, stringify, Map, Value};

/// A transform implementation.
pub type TransformFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Lookup table from transform name to implementation.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.transforms.keys().collect();
        names.sort();
        f.debug_struct("TransformRegistry")
            .field("names", &names)
            .finish()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TransformRegistry {
    /// Registry holding only the built-in transforms.
    pub fn builtin() -> Self {
        let builtins: [(&str, fn(&Value) -> Value); 12] = [
            ("toOptions", to_options),
            ("toString", to_string),
            ("toNumber", to_number),
            ("toDate", to_date),
            ("toUpperCase", to_upper_case),
            ("toLowerCase", to_lower_case),
            ("toBoolean", to_boolean),
            ("toCurrency", to_currency),
            ("toJSON", to_json),
            ("toArray", to_array),
            ("toFixed", to_fixed),
            ("toPercent", to_percent),
        ];
        let transforms = builtins
            .into_iter()
            .map(|(name, f)| (name.to_string(), Arc::new(f) as TransformFn))
            .collect();
        Self { transforms }
    }

    /// Add a custom transform.
    ///
    /// Existing names are never replaced; returns `false` if `name` is taken.
    pub fn register<F>(&mut self, name: impl Into<String>, transform: F) -> bool
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        if self.transforms.contains_key(&name) {
            tracing::warn!(transform = %name, "transform already registered");
            return false;
        }
        self.transforms.insert(name, Arc::new(transform));
        true
    }

    /// Whether a transform with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Apply the named transform.
    ///
    /// Unknown names leave the value unchanged.
    pub fn apply(&self, name: &str, value: Value) -> Value {
        match self.transforms.get(name) {
            Some(transform) => transform(&value),
            None => {
                tracing::warn!(transform = name, "unknown transform");
                value
            }
        }
    }

    /// Apply an optional transform.
    pub fn apply_opt(&self, name: Option<&str>, value: Value) -> Value {
        match name {
            Some(name) => self.apply(name, value),
            None => value,
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| json!(0))
    }
}

fn first_truthy<'a>(item: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| lookup_path(item, field))
        .find(|value| is_truthy(value))
}

fn to_options(value: &Value) -> Value {
    let Value::Array(items) = value else {
        return Value::Array(Vec::new());
    };
    items
        .iter()
        .map(|item| {
            let label = first_truthy(item, &["name", "label"])
                .cloned()
                .unwrap_or_else(|| Value::String(stringify(item)));
            let value = first_truthy(item, &["id", "value"])
                .cloned()
                .unwrap_or_else(|| item.clone());
            let mut option = Map::new();
            option.insert("label".into(), label);
            option.insert("value".into(), value);
            Value::Object(option)
        })
        .collect()
}

fn to_string(value: &Value) -> Value {
    Value::String(stringify(value))
}

fn to_number(value: &Value) -> Value {
    number_value(coerce_number(value).unwrap_or(0.0))
}

fn to_date(value: &Value) -> Value {
    let date = parse_date(value).unwrap_or_else(|| Local::now().date_naive());
    Value::String(format!("{}/{}/{}", date.month(), date.day(), date.year()))
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            let utc = DateTime::from_timestamp_millis(millis)?;
            Some(utc.with_timezone(&Local).date_naive())
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Local).date_naive());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                return Local
                    .from_local_datetime(&dt)
                    .earliest()
                    .map(|local| local.date_naive());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

fn to_upper_case(value: &Value) -> Value {
    Value::String(stringify(value).to_uppercase())
}

fn to_lower_case(value: &Value) -> Value {
    Value::String(stringify(value).to_lowercase())
}

fn to_boolean(value: &Value) -> Value {
    Value::Bool(is_truthy(value))
}

fn to_currency(value: &Value) -> Value {
    let text = match coerce_number(value) {
        Some(n) => format_usd(n),
        None => "$0.00".to_string(),
    };
    Value::String(text)
}

fn format_usd(n: f64) -> String {
    let cents = (n.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if n < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn to_json(value: &Value) -> Value {
    Value::String(serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()))
}

fn to_array(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        other if is_truthy(other) => Value::Array(vec![other.clone()]),
        _ => Value::Array(Vec::new()),
    }
}

fn to_fixed(value: &Value) -> Value {
    let n = coerce_number(value).unwrap_or(0.0);
    Value::String(format!("{n:.2}"))
}

fn to_percent(value: &Value) -> Value {
    let n = coerce_number(value).unwrap_or(0.0);
    Value::String(format!("{:.1}%", n * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(name: &str, value: Value) -> Value {
        TransformRegistry::builtin().apply(name, value)
    }

    #[test]
    fn test_to_options_prefers_name_and_id() {
        assert_eq!(
            apply("toOptions", json!([{"id": 1, "name": "Ann"}])),
            json!([{"label": "Ann", "value": 1}])
        );
        assert_eq!(
            apply("toOptions", json!([{"label": "L", "value": "v"}, "plain"])),
            json!([{"label": "L", "value": "v"}, {"label": "plain", "value": "plain"}])
        );
        assert_eq!(apply("toOptions", json!({"id": 1})), json!([]));
        assert_eq!(apply("toOptions", Value::Null), json!([]));
    }

    #[test]
    fn test_to_options_skips_falsy_fields() {
        // An id of 0 is falsy, so the whole item becomes the value.
        assert_eq!(
            apply("toOptions", json!([{"id": 0, "name": ""}])),
            json!([{"label": r#"{"id":0,"name":""}"#, "value": {"id": 0, "name": ""}}])
        );
    }

    #[test]
    fn test_numeric_transforms() {
        assert_eq!(apply("toNumber", json!("12")), json!(12));
        assert_eq!(apply("toNumber", json!("1.5")), json!(1.5));
        assert_eq!(apply("toNumber", json!("abc")), json!(0));
        assert_eq!(apply("toFixed", json!(3.14159)), json!("3.14"));
        assert_eq!(apply("toFixed", json!("nope")), json!("0.00"));
        assert_eq!(apply("toPercent", json!(0.256)), json!("25.6%"));
        assert_eq!(apply("toPercent", json!({})), json!("0.0%"));
    }

    #[test]
    fn test_currency() {
        assert_eq!(apply("toCurrency", json!(1234.5)), json!("$1,234.50"));
        assert_eq!(apply("toCurrency", json!(-0.5)), json!("-$0.50"));
        assert_eq!(apply("toCurrency", json!(999)), json!("$999.00"));
        assert_eq!(apply("toCurrency", json!(1_000_000)), json!("$1,000,000.00"));
        assert_eq!(apply("toCurrency", json!("garbage")), json!("$0.00"));
    }

    #[test]
    fn test_text_transforms() {
        assert_eq!(apply("toString", Value::Null), json!(""));
        assert_eq!(apply("toString", json!(7)), json!("7"));
        assert_eq!(apply("toUpperCase", json!("ann")), json!("ANN"));
        assert_eq!(apply("toLowerCase", json!("ANN")), json!("ann"));
        assert_eq!(apply("toBoolean", json!("")), json!(false));
        assert_eq!(apply("toBoolean", json!([])), json!(true));
        assert_eq!(apply("toJSON", json!({"a": 1})), json!("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn test_to_array() {
        assert_eq!(apply("toArray", json!([1, 2])), json!([1, 2]));
        assert_eq!(apply("toArray", json!("x")), json!(["x"]));
        assert_eq!(apply("toArray", json!(0)), json!([]));
        assert_eq!(apply("toArray", Value::Null), json!([]));
    }

    #[test]
    fn test_to_date() {
        assert_eq!(apply("toDate", json!("2024-03-05")), json!("3/5/2024"));
        assert_eq!(apply("toDate", json!("2024-03-05T10:30:00")), json!("3/5/2024"));
        let today = Local::now().date_naive();
        let fallback = apply("toDate", json!({"not": "a date"}));
        assert_eq!(
            fallback,
            json!(format!("{}/{}/{}", today.month(), today.day(), today.year()))
        );
    }

    #[test]
    fn test_malformed_input_never_panics() {
        let registry = TransformRegistry::builtin();
        let inputs = [
            Value::Null,
            json!(true),
            json!(-1e300),
            json!(""),
            json!("  "),
            json!([null, [], {}]),
            json!({"id": null, "name": []}),
        ];
        for name in [
            "toOptions",
            "toString",
            "toNumber",
            "toDate",
            "toUpperCase",
            "toLowerCase",
            "toBoolean",
            "toCurrency",
            "toJSON",
            "toArray",
            "toFixed",
            "toPercent",
        ] {
            assert!(registry.contains(name));
            for input in &inputs {
                let _ = registry.apply(name, input.clone());
            }
        }
    }

    #[test]
    fn test_unknown_transform_is_identity() {
        assert_eq!(apply("toKlingon", json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_register_does_not_replace_builtins() {
        let mut registry = TransformRegistry::builtin();
        assert!(!registry.register("toString", |_| json!("hijacked")));
        assert_eq!(registry.apply("toString", json!(1)), json!("1"));

        assert!(registry.register("double", |v| json!(v.as_f64().unwrap_or(0.0) * 2.0)));
        assert_eq!(registry.apply("double", json!(2)), json!(4.0));
    }
}
