//! Binding resolution
//!
//! A binding copies a state value into a prop. Besides the bound prop, every
//! binding checks the `<source>_loading` and `<source>_error` companion keys so
//! a bound node reflects the lifecycle of the data behind it without extra
//! wiring.

use indexmap::IndexMap;

use crate::node::DataBinding;
use crate::transform::TransformRegistry;
use crate::value::{is_truthy, lookup_in_map, lookup_path, Map, Value};

/// Suffix of the companion key holding a load-in-progress flag.
pub const LOADING_SUFFIX: &str = "_loading";
/// Suffix of the companion key holding the last load error.
pub const ERROR_SUFFIX: &str = "_error";

/// Companion key holding the loading flag for `key`.
pub fn loading_key(key: &str) -> String {
    format!("{key}{LOADING_SUFFIX}")
}

/// Companion key holding the error for `key`.
pub fn error_key(key: &str) -> String {
    format!("{key}{ERROR_SUFFIX}")
}

/// Resolve a single binding to its value (absent resolves to `null`).
pub fn resolve_binding(
    binding: &DataBinding,
    state: &Map<String, Value>,
    transforms: &TransformRegistry,
) -> Value {
    let source = lookup_in_map(state, &binding.source);
    let value = match (&binding.field, source) {
        (Some(field), Some(source)) => lookup_path(source, field).cloned(),
        (None, Some(source)) => Some(source.clone()),
        (_, None) => None,
    };
    transforms.apply_opt(binding.transform.as_deref(), value.unwrap_or(Value::Null))
}

/// Resolve all bindings of a node into props.
///
/// Bindings are applied in declaration order. After each bound prop, a
/// defined loading flag sets `loading` and a truthy error sets `error`, so
/// later bindings win on collisions.
pub fn resolve_bindings(
    bindings: &IndexMap<String, DataBinding>,
    state: &Map<String, Value>,
    transforms: &TransformRegistry,
) -> Map<String, Value> {
    let mut props = Map::new();
    for (prop, binding) in bindings {
        let value = resolve_binding(binding, state, transforms);
        props.insert(prop.clone(), value);

        if let Some(loading) = lookup_in_map(state, &loading_key(&binding.source)) {
            props.insert("loading".into(), loading.clone());
        }
        if let Some(error) = lookup_in_map(state, &error_key(&binding.source)) {
            if is_truthy(error) {
                props.insert("error".into(), error.clone());
            }
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn bindings(pairs: &[(&str, DataBinding)]) -> IndexMap<String, DataBinding> {
        pairs
            .iter()
            .map(|(prop, binding)| (prop.to_string(), binding.clone()))
            .collect()
    }

    #[test]
    fn test_field_and_transform() {
        let state = state(json!({"user": {"company": {"name": "acme"}}}));
        let transforms = TransformRegistry::builtin();

        let binding = DataBinding::new("user")
            .field("company.name")
            .transform("toUpperCase");
        assert_eq!(resolve_binding(&binding, &state, &transforms), json!("ACME"));

        let missing = DataBinding::new("user").field("address.city");
        assert_eq!(resolve_binding(&missing, &state, &transforms), Value::Null);

        let absent = DataBinding::new("nobody").field("name");
        assert_eq!(resolve_binding(&absent, &state, &transforms), Value::Null);
    }

    #[test]
    fn test_companion_props() {
        let state = state(json!({
            "users": [{"id": 1, "name": "Ann"}],
            "users_loading": false,
            "users_error": "API call failed: 500 Internal Server Error"
        }));
        let props = resolve_bindings(
            &bindings(&[("options", DataBinding::new("users").transform("toOptions"))]),
            &state,
            &TransformRegistry::builtin(),
        );
        assert_eq!(props["options"], json!([{"label": "Ann", "value": 1}]));
        assert_eq!(props["loading"], json!(false));
        assert_eq!(
            props["error"],
            json!("API call failed: 500 Internal Server Error")
        );
    }

    #[test]
    fn test_no_companions_when_keys_absent_or_falsy() {
        let state = state(json!({"users": [], "users_error": ""}));
        let props = resolve_bindings(
            &bindings(&[("options", DataBinding::new("users"))]),
            &state,
            &TransformRegistry::builtin(),
        );
        assert!(!props.contains_key("loading"));
        assert!(!props.contains_key("error"));
    }

    #[test]
    fn test_companion_overrides_explicit_loading_binding() {
        let state = state(json!({"users_loading": true, "users": []}));
        let props = resolve_bindings(
            &bindings(&[
                ("loading", DataBinding::new("other")),
                ("options", DataBinding::new("users")),
            ]),
            &state,
            &TransformRegistry::builtin(),
        );
        assert_eq!(props["loading"], json!(true));
    }
}
