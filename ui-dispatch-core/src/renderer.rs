//! Tree rendering
//!
//! Turns a configuration tree plus the current state into [`Element`]s. For
//! each node, in order:
//!
//! 1. look up the component for its type (unknown types render nothing)
//! 2. evaluate its condition (false renders nothing)
//! 3. expand `repeat` into one instance per item, templating the node's
//!    string props with `${item...}`
//! 4. resolve data bindings
//! 5. attach event handlers, one per event type
//! 6. render children
//! 7. template every string prop (explicit or bound) against state
//! 8. hand the merged props (explicit < bound < handlers) to the component
//!
//! A render pass reads one state snapshot throughout, so every node of a pass
//! sees the same state.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::binding::resolve_bindings;
use crate::dispatcher::ActionDispatcher;
use crate::element::{Element, ElementChild, EventHandler, Prop, Props};
use crate::node::{Child, ComponentNode, Repeat};
use crate::registry::{Component, ComponentRegistry};
use crate::state::Snapshot;
use crate::template::{evaluate_condition, process_template, Scope};
use crate::value::{is_truthy, lookup_in_map, stringify, Map, Value};

/// Renders configuration trees against a dispatcher's store.
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<ComponentRegistry>,
    dispatcher: ActionDispatcher,
    max_depth: usize,
}

impl Renderer {
    pub fn new(registry: Arc<ComponentRegistry>, dispatcher: ActionDispatcher) -> Self {
        let max_depth = dispatcher.options().max_depth;
        Self {
            registry,
            dispatcher,
            max_depth,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Render `root` against the current state.
    ///
    /// A repeated root yields one element per item; a hidden or unknown root
    /// yields none.
    pub fn render(&self, root: &ComponentNode) -> Vec<Element> {
        let snapshot = self.dispatcher.store().snapshot();
        let mut out = Vec::new();
        self.render_node(root, &snapshot, 0, None, &mut out);
        out
    }

    fn render_node(
        &self,
        node: &ComponentNode,
        state: &Snapshot,
        depth: usize,
        key: Option<String>,
        out: &mut Vec<Element>,
    ) {
        if depth > self.max_depth {
            tracing::warn!(kind = %node.kind, depth, "maximum render depth exceeded");
            return;
        }

        let Some(component) = self.registry.get(&node.kind) else {
            tracing::warn!(kind = %node.kind, "unknown component type");
            return;
        };

        let scope = Scope::new(state);
        if !evaluate_condition(node.condition.as_ref(), &scope) {
            tracing::debug!(kind = %node.kind, "condition false; node hidden");
            return;
        }

        let Some(repeat) = &node.repeat else {
            let key = node.key.as_ref().map(stringify).or(key);
            out.push(self.instantiate(node, component.as_ref(), node.props.clone(), state, depth, key));
            return;
        };

        let items = match repeat {
            Repeat::Items(items) => items.as_slice(),
            Repeat::Source(source) => match lookup_in_map(state, source) {
                Some(Value::Array(items)) => items.as_slice(),
                _ => {
                    tracing::debug!(kind = %node.kind, source = %source, "repeat source is not a list");
                    return;
                }
            },
        };

        for (index, item) in items.iter().enumerate() {
            let item_scope = Scope::new(state).with_item(item);
            let props = template_props(&node.props, &item_scope);
            let id = item
                .get("id")
                .filter(|id| is_truthy(id))
                .map(stringify)
                .unwrap_or_else(|| index.to_string());
            let key = format!("{}-{}-{}", node.kind, index, id);
            out.push(self.instantiate(node, component.as_ref(), props, state, depth, Some(key)));
        }
    }

    /// Steps 4 to 8 for one node instance.
    fn instantiate(
        &self,
        node: &ComponentNode,
        component: &dyn Component,
        explicit: Map<String, Value>,
        state: &Snapshot,
        depth: usize,
        key: Option<String>,
    ) -> Element {
        let bound = resolve_bindings(&node.bindings, state, self.dispatcher.transforms());

        let mut grouped: IndexMap<_, Vec<_>> = IndexMap::new();
        for binding in &node.events {
            grouped
                .entry(binding.event_type)
                .or_default()
                .push(binding.action.clone());
        }

        let children = self.render_children(node, state, depth);

        let mut values = explicit;
        values.extend(bound);
        let values = template_props(&values, &Scope::new(state));
        let mut props = Props::with_capacity(values.len() + grouped.len());
        props.extend(values.into_iter().map(|(name, value)| (name, Prop::Value(value))));
        for (event, actions) in grouped {
            let handler = EventHandler::new(event, actions, self.dispatcher.clone());
            props.insert(event.prop_name().to_string(), Prop::Handler(handler));
        }

        let mut element = component.render(props, children);
        if element.key.is_none() {
            element.key = key;
        }
        element
    }

    fn render_children(&self, node: &ComponentNode, state: &Snapshot, depth: usize) -> Vec<ElementChild> {
        let mut children = Vec::new();
        for (index, child) in node.child_list().iter().enumerate() {
            match child {
                Child::Node(child) => {
                    let mut rendered = Vec::new();
                    let key = format!("{}-child-{}", child.kind, index);
                    self.render_node(child, state, depth + 1, Some(key), &mut rendered);
                    children.extend(rendered.into_iter().map(ElementChild::Element));
                }
                Child::Content(content) => children.push(ElementChild::Content(content.clone())),
                Child::Invalid(raw) => {
                    tracing::warn!(parent = %node.kind, kind = ?raw.get("type"), "malformed child skipped");
                }
            }
        }
        children
    }
}

/// Template every string member of `props`; other values are kept as is.
fn template_props(props: &Map<String, Value>, scope: &Scope<'_>) -> Map<String, Value> {
    props
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(text) => Value::String(process_template(text, scope).into_owned()),
                other => other.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}
