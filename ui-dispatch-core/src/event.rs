//! UI event types delivered by the host

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::value::Value;

/// Events a node can attach actions to.
///
/// The serialized names double as the prop names under which the rendered
/// element exposes its handlers (`onClick`, `onChange`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "onClick")]
    Click,
    #[serde(rename = "onChange")]
    Change,
    #[serde(rename = "onSubmit")]
    Submit,
    #[serde(rename = "onBlur")]
    Blur,
    #[serde(rename = "onFocus")]
    Focus,
    #[serde(rename = "onKeyPress")]
    KeyPress,
    #[serde(rename = "onKeyDown")]
    KeyDown,
    #[serde(rename = "onKeyUp")]
    KeyUp,
    #[serde(rename = "onMouseOver")]
    MouseOver,
    #[serde(rename = "onMouseOut")]
    MouseOut,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [EventType; 10] = [
        EventType::Click,
        EventType::Change,
        EventType::Submit,
        EventType::Blur,
        EventType::Focus,
        EventType::KeyPress,
        EventType::KeyDown,
        EventType::KeyUp,
        EventType::MouseOver,
        EventType::MouseOut,
    ];

    /// Prop name carrying the handler for this event.
    pub fn prop_name(self) -> &'static str {
        match self {
            EventType::Click => "onClick",
            EventType::Change => "onChange",
            EventType::Submit => "onSubmit",
            EventType::Blur => "onBlur",
            EventType::Focus => "onFocus",
            EventType::KeyPress => "onKeyPress",
            EventType::KeyDown => "onKeyDown",
            EventType::KeyUp => "onKeyUp",
            EventType::MouseOver => "onMouseOver",
            EventType::MouseOut => "onMouseOut",
        }
    }

    /// Look up an event type by its prop name.
    pub fn from_prop_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prop_name() == name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prop_name())
    }
}

/// Event object handed to actions as `${event.*}`.
///
/// The payload is free-form; the constructors below build the shapes that
/// configurations conventionally reference (`event.target.value`).
#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent {
    pub kind: EventType,
    pub payload: Value,
}

impl UiEvent {
    /// Event with an arbitrary payload.
    pub fn new(kind: EventType, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// A click with no extra data.
    pub fn click() -> Self {
        Self::new(EventType::Click, json!({ "type": "click" }))
    }

    /// A value change, exposed as `event.target.value`.
    pub fn change(value: impl Into<Value>) -> Self {
        Self::new(
            EventType::Change,
            json!({ "type": "change", "target": { "value": value.into() } }),
        )
    }

    /// A form submission.
    pub fn submit() -> Self {
        Self::new(EventType::Submit, json!({ "type": "submit" }))
    }

    /// A key event, exposed as `event.key`.
    pub fn key(kind: EventType, key: impl Into<String>) -> Self {
        Self::new(kind, json!({ "type": kind.prop_name(), "key": key.into() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_names_round_trip() {
        for kind in EventType::ALL {
            assert_eq!(EventType::from_prop_name(kind.prop_name()), Some(kind));
            let json = serde_json::to_value(kind).expect("serialize");
            assert_eq!(json, Value::String(kind.prop_name().to_string()));
        }
        assert_eq!(EventType::from_prop_name("onHover"), None);
    }

    #[test]
    fn test_change_payload_shape() {
        let event = UiEvent::change("3");
        assert_eq!(event.kind, EventType::Change);
        assert_eq!(event.payload["target"]["value"], "3");
    }
}
