//! Interpreter core for declarative ui-dispatch component trees
//!
//! A configuration tree of [`ComponentNode`]s describes a UI: which
//! components to show, which state values feed their props, and which actions
//! run when the user interacts. This crate interprets such a tree at runtime.
//!
//! # Core Concepts
//!
//! - **StateStore**: one mutable JSON namespace per interpreter, with dotted
//!   paths and change notification
//! - **Templates**: `${state.x}`, `${item.x}` and `${event.x}` placeholders in
//!   props, params and URLs
//! - **Bindings**: copy state values into props, optionally through a named
//!   transform
//! - **Actions**: `setState`, `api`, `submit` and `navigate`, chained through
//!   `successAction`/`errorAction`
//! - **Renderer**: turns the tree plus current state into [`Element`]s that a
//!   host draws
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use ui_dispatch_core::prelude::*;
//!
//! let root = ComponentNode::new("Card")
//!     .condition("${state.user}")
//!     .child(ComponentNode::new("CardTitle").prop("title", "${state.user.name}"));
//!
//! let interpreter = Interpreter::builder(root).build();
//! assert!(interpreter.render().is_empty());
//!
//! interpreter.store().set("user", json!({"name": "Ann"}));
//! let card = interpreter.render().remove(0);
//! let title = card.find_kind("CardTitle").unwrap();
//! assert_eq!(title.prop("title"), Some(&json!("Ann")));
//! ```
//!
//! # Side effects
//!
//! Remote calls go through the [`Transport`] trait ([`HttpTransport`] by
//! default) and navigation through [`Navigator`]. Both are injected when the
//! interpreter is built, which is also how tests substitute
//! [`testing::MockTransport`] and [`testing::RecordingNavigator`].

pub mod binding;
pub mod config;
pub mod debug;
pub mod dispatcher;
pub mod element;
pub mod error;
pub mod event;
pub mod fetch;
pub mod interpreter;
pub mod navigate;
pub mod node;
pub mod registry;
pub mod renderer;
pub mod state;
pub mod tasks;
pub mod template;
pub mod testing;
pub mod transform;
pub mod transport;
pub mod value;

// Configuration model
pub use node::{
    ActionKind, ActionSpec, ApiConfig, Child, Children, ComponentNode, Condition, DataBinding,
    DataFetchSpec, EventBinding, HttpMethod, Repeat,
};

// Runtime
pub use config::RendererOptions;
pub use dispatcher::{ActionDispatcher, ActionStatus, DispatchReport, LinkReport};
pub use element::{Element, ElementChild, EventHandler, Prop, Props};
pub use event::{EventType, UiEvent};
pub use fetch::{FetchQueue, FetchRecord, FetchReport};
pub use interpreter::{Completion, Interpreter, InterpreterBuilder};
pub use registry::{Component, ComponentRegistry};
pub use renderer::Renderer;
pub use state::{Snapshot, StateStore};
pub use transform::TransformRegistry;
pub use value::{Map, Value};

// Seams
pub use navigate::{LogNavigator, Navigator};
pub use transport::{ApiRequest, HttpTransport, Transport};

// Errors
pub use error::{ActionError, ConfigError, TransportError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatcher::{ActionDispatcher, ActionStatus, DispatchReport};
    pub use crate::element::{Element, ElementChild, EventHandler, Prop};
    pub use crate::event::{EventType, UiEvent};
    pub use crate::interpreter::{Completion, Interpreter};
    pub use crate::navigate::Navigator;
    pub use crate::node::{
        ActionKind, ActionSpec, ApiConfig, ComponentNode, DataBinding, DataFetchSpec, HttpMethod,
        Repeat,
    };
    pub use crate::registry::{Component, ComponentRegistry};
    pub use crate::state::StateStore;
    pub use crate::transport::Transport;
    pub use crate::RendererOptions;
}
