//! Declarative configuration types
//!
//! A [`ComponentNode`] tree is authored as JSON (or built in code) and never
//! mutated by the interpreter. Field names follow the camelCase JSON shape:
//!
//! ```json
//! {
//!   "type": "Select",
//!   "props": { "placeholder": "Select User" },
//!   "bindings": { "options": { "source": "users" } },
//!   "events": [
//!     { "type": "onChange", "action": "setState",
//!       "target": "selectedUser", "params": "${event.target.value}" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::event::EventType;
use crate::value::{Map, Value};

/// One declarative unit of UI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    /// Registry name of the component to instantiate.
    #[serde(rename = "type")]
    pub kind: String,
    /// Literal props; string values may contain placeholders.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
    /// Explicit identity for the rendered element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventBinding>,
    /// Prop name to state binding, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub bindings: IndexMap<String, DataBinding>,
    /// Remote loads run when this node is mounted as a root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_fetch: Vec<DataFetchSpec>,
}

impl ComponentNode {
    /// Create a bare node of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: Map::new(),
            children: None,
            condition: None,
            repeat: None,
            key: None,
            events: Vec::new(),
            bindings: IndexMap::new(),
            data_fetch: Vec::new(),
        }
    }

    /// Parse a configuration tree from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a configuration tree from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Set a literal prop.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        let child = child.into();
        self.children = Some(match self.children.take() {
            None => Children::One(Box::new(child)),
            Some(Children::One(first)) => Children::Many(vec![*first, child]),
            Some(Children::Many(mut all)) => {
                all.push(child);
                Children::Many(all)
            }
        });
        self
    }

    /// Set the render condition.
    pub fn condition(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Repeat this node over a collection.
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = Some(repeat);
        self
    }

    /// Bind a prop to a state value.
    pub fn bind(mut self, prop: impl Into<String>, binding: DataBinding) -> Self {
        self.bindings.insert(prop.into(), binding);
        self
    }

    /// Attach an action to an event.
    pub fn on(mut self, event_type: EventType, action: ActionSpec) -> Self {
        self.events.push(EventBinding { event_type, action });
        self
    }

    /// Add a mount-time remote load.
    pub fn fetch(mut self, spec: DataFetchSpec) -> Self {
        self.data_fetch.push(spec);
        self
    }

    /// Child entries in declaration order.
    pub fn child_list(&self) -> &[Child] {
        match &self.children {
            None => &[],
            Some(Children::One(child)) => std::slice::from_ref(child.as_ref()),
            Some(Children::Many(all)) => all,
        }
    }
}

/// A node's children: a single entry or an ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Children {
    Many(Vec<Child>),
    One(Box<Child>),
}

/// One child entry: a nested node or opaque literal content.
///
/// Any object with a string `type` is read as a node. One that does not form
/// a valid node is kept as [`Child::Invalid`] and renders nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Node(ComponentNode),
    Content(Value),
    /// The raw configuration of a malformed node.
    Invalid(Value),
}

impl<'de> Deserialize<'de> for Child {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.get("type").is_some_and(Value::is_string) {
            return Ok(Child::Content(value));
        }
        match ComponentNode::deserialize(&value) {
            Ok(node) => Ok(Child::Node(node)),
            Err(err) => {
                tracing::warn!(kind = ?value["type"], error = %err, "malformed child node");
                Ok(Child::Invalid(value))
            }
        }
    }
}

impl From<ComponentNode> for Child {
    fn from(node: ComponentNode) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Content(Value::String(text.to_string()))
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Content(Value::String(text))
    }
}

/// Render condition: a literal flag or a template string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Flag(bool),
    Expr(String),
    /// Any other JSON value; never satisfied.
    Other(Value),
}

impl From<bool> for Condition {
    fn from(flag: bool) -> Self {
        Condition::Flag(flag)
    }
}

impl From<&str> for Condition {
    fn from(expr: &str) -> Self {
        Condition::Expr(expr.to_string())
    }
}

/// Collection a node is repeated over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Repeat {
    /// Literal items.
    Items(Vec<Value>),
    /// State key holding the items.
    Source(String),
}

/// Link from a prop to a state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBinding {
    /// State key to read.
    pub source: String,
    /// Dotted path into the source value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Transform applied to the resolved value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

impl DataBinding {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            field: None,
            transform: None,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn transform(mut self, transform: impl Into<String>) -> Self {
        self.transform = Some(transform.into());
        self
    }
}

/// An action attached to a UI event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBinding {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(flatten)]
    pub action: ActionSpec,
}

/// Kind of side effect an action performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    SetState,
    Api,
    Submit,
    Navigate,
    /// Any name outside the fixed set; dispatching it is a logged no-op.
    Unknown(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::SetState => "setState",
            ActionKind::Api => "api",
            ActionKind::Submit => "submit",
            ActionKind::Navigate => "navigate",
            ActionKind::Unknown(name) => name,
        }
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "setState" => ActionKind::SetState,
            "api" => ActionKind::Api,
            "submit" => ActionKind::Submit,
            "navigate" => ActionKind::Navigate,
            _ => ActionKind::Unknown(name),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A side-effecting operation with optional continuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
    #[serde(rename = "action")]
    pub kind: ActionKind,
    /// State key (or navigation target) the action writes to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Runs after an `api` action succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_action: Option<Box<ActionSpec>>,
    /// Runs after an `api` action fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_action: Option<Box<ActionSpec>>,
}

impl ActionSpec {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            target: None,
            params: None,
            success_action: None,
            error_action: None,
        }
    }

    /// `setState` writing `params` to `target`.
    pub fn set_state(target: impl Into<String>, params: impl Into<Value>) -> Self {
        Self::new(ActionKind::SetState)
            .target(target)
            .params(params)
    }

    /// `api` call storing its result at `target`.
    pub fn api(target: impl Into<String>, config: &ApiConfig) -> Self {
        let params = serde_json::to_value(config).unwrap_or(Value::Null);
        Self::new(ActionKind::Api).target(target).params(params)
    }

    /// `navigate` to a (templated) location.
    pub fn navigate(location: impl Into<String>) -> Self {
        Self::new(ActionKind::Navigate).params(Value::String(location.into()))
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn params(mut self, params: impl Into<Value>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn on_success(mut self, action: ActionSpec) -> Self {
        self.success_action = Some(Box::new(action));
        self
    }

    pub fn on_error(mut self, action: ActionSpec) -> Self {
        self.error_action = Some(Box::new(action));
        self
    }
}

/// HTTP method of a remote call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote call description. `url` and string `body` members are templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ApiConfig {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Remote load performed when the root node mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFetchSpec {
    /// State key receiving the payload (and its companion keys).
    pub key: String,
    pub api: ApiConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<ActionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<ActionSpec>,
}

impl DataFetchSpec {
    pub fn new(key: impl Into<String>, api: ApiConfig) -> Self {
        Self {
            key: key.into(),
            api,
            transform: None,
            on_success: None,
            on_error: None,
        }
    }

    pub fn transform(mut self, transform: impl Into<String>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    pub fn on_success(mut self, action: ActionSpec) -> Self {
        self.on_success = Some(action);
        self
    }

    pub fn on_error(mut self, action: ActionSpec) -> Self {
        self.on_error = Some(action);
        self
    }
}
