//! ui-dispatch: declarative component trees driven by a shared state store
//!
//! Describe a UI as data (a JSON tree of components with bindings, templates
//! and actions) and let the interpreter resolve it against live state. Hosts
//! draw the resolved [`Element`] tree and fire its event handlers; remote
//! calls, loading flags and error text all flow through one store.
//!
//! # Example
//! ```
//! use serde_json::json;
//! use ui_dispatch::prelude::*;
//!
//! let root = ComponentNode::from_json_str(r#"{
//!     "type": "span",
//!     "props": { "repeatLabel": "${item}" },
//!     "repeat": ["x", "y"]
//! }"#).unwrap();
//!
//! let interpreter = Interpreter::builder(root).build();
//! let labels: Vec<_> = interpreter
//!     .render()
//!     .iter()
//!     .map(|element| element.prop("repeatLabel").cloned())
//!     .collect();
//! assert_eq!(labels, vec![Some(json!("x")), Some(json!("y"))]);
//! ```

// Re-export everything from core
pub use ui_dispatch_core::*;

/// Prelude for convenient imports
pub mod prelude {
    // Configuration
    pub use ui_dispatch_core::{
        ActionKind, ActionSpec, ApiConfig, ComponentNode, DataBinding, DataFetchSpec, HttpMethod,
        Repeat,
    };

    // Runtime
    pub use ui_dispatch_core::{
        ActionDispatcher, ActionStatus, Completion, DispatchReport, Element, ElementChild,
        EventHandler, EventType, Interpreter, Prop, RendererOptions, StateStore, UiEvent,
    };

    // Extension points
    pub use ui_dispatch_core::{Component, ComponentRegistry, Navigator, Transport};

    // Debug
    pub use ui_dispatch_core::debug::{DebugSection, DebugState, DispatchFilter, DispatchLog};
}
