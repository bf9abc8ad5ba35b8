//! `${...}` placeholder evaluation
//!
//! Placeholders name a root and a dotted path:
//!
//! | Placeholder        | Resolves to                             |
//! |--------------------|-----------------------------------------|
//! | `${state.a.b}`     | the state value at `a.b`                |
//! | `${item.a}`        | member `a` of the current repeat item   |
//! | `${item}`          | the current repeat item itself          |
//! | `${event.a.b}`     | member `a.b` of the firing UI event     |
//!
//! Anything else, or a root with no value in scope, becomes the empty string.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::node::Condition;
use crate::value::{is_truthy_opt, lookup_in_map, lookup_path, stringify, Map, Value};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Values a template may refer to.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    state: Option<&'a Map<String, Value>>,
    item: Option<&'a Value>,
    event: Option<&'a Value>,
}

impl<'a> Scope<'a> {
    /// Scope over a state snapshot.
    pub fn new(state: &'a Map<String, Value>) -> Self {
        Self {
            state: Some(state),
            item: None,
            event: None,
        }
    }

    /// Add the current repeat item.
    pub fn with_item(mut self, item: &'a Value) -> Self {
        self.item = Some(item);
        self
    }

    /// Add the firing UI event, if any.
    pub fn with_event(mut self, event: Option<&'a Value>) -> Self {
        self.event = event;
        self
    }

    fn state_value(&self, path: &str) -> Option<&'a Value> {
        self.state.and_then(|state| lookup_in_map(state, path))
    }

    fn resolve(&self, body: &str) -> String {
        if let Some(path) = body.strip_prefix("state.") {
            return self.state_value(path).map(stringify).unwrap_or_default();
        }
        if let Some(path) = body.strip_prefix("item.") {
            return self
                .item
                .and_then(|item| lookup_path(item, path))
                .map(stringify)
                .unwrap_or_default();
        }
        if body == "item" {
            return self.item.map(stringify).unwrap_or_default();
        }
        if let Some(path) = body.strip_prefix("event.") {
            return self
                .event
                .and_then(|event| lookup_path(event, path))
                .map(stringify)
                .unwrap_or_default();
        }
        tracing::debug!(placeholder = body, "unrecognized placeholder");
        String::new()
    }
}

/// Replace every placeholder in `template`.
///
/// Strings without `${` are returned borrowed and untouched.
pub fn process_template<'t>(template: &'t str, scope: &Scope<'_>) -> Cow<'t, str> {
    if !template.contains("${") {
        return Cow::Borrowed(template);
    }
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| scope.resolve(&caps[1]))
}

/// Decide whether a node should render.
///
/// Only a string that is exactly one `${state.<path>}` placeholder is
/// evaluated against state. Any other string is truthy when non-empty, and
/// values that are neither flags nor strings never render.
pub fn evaluate_condition(condition: Option<&Condition>, scope: &Scope<'_>) -> bool {
    match condition {
        None => true,
        Some(Condition::Flag(flag)) => *flag,
        Some(Condition::Expr(expr)) => match state_expression(expr) {
            Some(path) => is_truthy_opt(scope.state_value(path)),
            None => !expr.is_empty(),
        },
        Some(Condition::Other(_)) => false,
    }
}

fn state_expression(expr: &str) -> Option<&str> {
    let body = expr.strip_prefix("${")?.strip_suffix('}')?;
    if body.contains('}') {
        return None;
    }
    body.strip_prefix("state.")
}

/// Resolve structured action params.
///
/// Strings are templated; arrays and objects are resolved member by member;
/// every other value is returned as is.
pub fn resolve_params(params: &Value, scope: &Scope<'_>) -> Value {
    match params {
        Value::String(s) => Value::String(process_template(s, scope).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_params(v, scope)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_params(v, scope)))
                .collect(),
        ),
        other => other.clone(),
    }
}
