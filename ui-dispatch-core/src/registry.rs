//! Component registry
//!
//! Maps the `type` tag of a configuration node to the [`Component`] that
//! builds its element. Nodes whose type is not registered render nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::element::{Element, ElementChild, Props};

/// Builds an element from resolved props and rendered children.
///
/// # Example
///
/// ```
/// use ui_dispatch_core::element::{Element, ElementChild, Props};
/// use ui_dispatch_core::registry::{Component, ComponentRegistry};
///
/// struct Badge;
///
/// impl Component for Badge {
///     fn render(&self, props: Props, children: Vec<ElementChild>) -> Element {
///         Element::new("span").with_props(props).with_children(children)
///     }
/// }
///
/// let mut registry = ComponentRegistry::standard();
/// registry.register("Badge", Badge);
/// assert!(registry.contains("Badge"));
/// ```
pub trait Component: Send + Sync {
    fn render(&self, props: Props, children: Vec<ElementChild>) -> Element;
}

impl<F> Component for F
where
    F: Fn(Props, Vec<ElementChild>) -> Element + Send + Sync,
{
    fn render(&self, props: Props, children: Vec<ElementChild>) -> Element {
        self(props, children)
    }
}

/// Component that emits an element of its own kind with props and children
/// unchanged. The host decides how each kind is drawn.
#[derive(Debug, Clone)]
pub struct Passthrough {
    kind: String,
}

impl Passthrough {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl Component for Passthrough {
    fn render(&self, props: Props, children: Vec<ElementChild>) -> Element {
        Element::new(self.kind.clone())
            .with_props(props)
            .with_children(children)
    }
}

/// Kinds registered by [`ComponentRegistry::standard`].
pub const STANDARD_COMPONENTS: &[&str] = &[
    "Button",
    "Card",
    "CardHeader",
    "CardTitle",
    "CardContent",
    "Alert",
    "Select",
    "div",
    "span",
    "p",
    "h1",
    "h2",
    "h3",
    "section",
    "article",
    "header",
    "footer",
    "nav",
    "aside",
    "main",
    "form",
    "label",
    "input",
];

/// Type tag to component lookup.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.components.keys().collect();
        names.sort();
        f.debug_struct("ComponentRegistry")
            .field("components", &names)
            .finish()
    }
}

impl ComponentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a [`Passthrough`] for every name in
    /// [`STANDARD_COMPONENTS`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in STANDARD_COMPONENTS {
            registry.register(*kind, Passthrough::new(*kind));
        }
        registry
    }

    /// Register `component` under `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: impl Into<String>, component: impl Component + 'static) {
        self.components.insert(kind.into(), Arc::new(component));
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Component>> {
        self.components.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.components.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
