//! Resolved render output
//!
//! An [`Element`] tree is what the renderer hands to the host: component
//! kind, identity key, fully resolved props, and children. Event props carry
//! an [`EventHandler`] the host fires when the user interacts.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::dispatcher::{ActionDispatcher, DispatchReport};
use crate::event::{EventType, UiEvent};
use crate::node::ActionSpec;
use crate::value::{stringify, Value};

/// Props of a rendered element, in insertion order.
pub type Props = IndexMap<String, Prop>;

/// A resolved prop.
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    Value(Value),
    Handler(EventHandler),
}

impl Prop {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Prop::Value(value) => Some(value),
            Prop::Handler(_) => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Prop::Handler(handler) => Some(handler),
            Prop::Value(_) => None,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Value(value)
    }
}

/// Runs the actions bound to one event type of one element.
#[derive(Debug, Clone)]
pub struct EventHandler {
    event: EventType,
    actions: Arc<[ActionSpec]>,
    dispatcher: ActionDispatcher,
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event && self.actions == other.actions
    }
}

impl EventHandler {
    pub(crate) fn new(event: EventType, actions: Vec<ActionSpec>, dispatcher: ActionDispatcher) -> Self {
        Self {
            event,
            actions: actions.into(),
            dispatcher,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    /// Dispatch every bound action in declaration order, each chain running
    /// to completion before the next starts.
    pub async fn fire(&self, payload: &Value) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(self.actions.len());
        for action in self.actions.iter() {
            reports.push(self.dispatcher.dispatch(action, Some(payload)).await);
        }
        reports
    }

    /// [`fire`](Self::fire) with the payload of a [`UiEvent`].
    pub async fn fire_event(&self, event: &UiEvent) -> Vec<DispatchReport> {
        if event.kind != self.event {
            tracing::debug!(expected = %self.event, got = %event.kind, "event type mismatch");
        }
        self.fire(&event.payload).await
    }
}

/// A rendered child.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementChild {
    Element(Element),
    /// Literal content passed through unchanged.
    Content(Value),
}

/// A resolved component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: String,
    pub key: Option<String>,
    pub props: Props,
    pub children: Vec<ElementChild>,
}

impl Element {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn with_children(mut self, children: Vec<ElementChild>) -> Self {
        self.children = children;
        self
    }

    /// Value prop by name (handlers are not values).
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name).and_then(Prop::as_value)
    }

    pub fn handler(&self, event: EventType) -> Option<&EventHandler> {
        self.props.get(event.prop_name()).and_then(Prop::as_handler)
    }

    /// Child elements, skipping literal content.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            ElementChild::Element(element) => Some(element),
            ElementChild::Content(_) => None,
        })
    }

    /// Concatenated literal content of the subtree, depth first.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                ElementChild::Element(element) => element.collect_text(out),
                ElementChild::Content(value) => out.push_str(&stringify(value)),
            }
        }
    }

    /// First element in the subtree (self included) matching `predicate`.
    pub fn find(&self, predicate: &impl Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(predicate))
    }

    /// First element of the given kind.
    pub fn find_kind(&self, kind: &str) -> Option<&Element> {
        self.find(&|element| element.kind == kind)
    }

    /// Every element in the subtree (self included), breadth first.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let current = out[index];
            out.extend(current.child_elements());
            index += 1;
        }
        out
    }
}
