//! One mounted configuration tree
//!
//! An [`Interpreter`] owns everything a tree needs at runtime: its state
//! store, the dispatcher and renderer over it, background tasks, and the
//! lifetime token that ends all of them. Interpreters share nothing, so two
//! trees never see each other's state.
//!
//! ```no_run
//! use ui_dispatch_core::{ComponentNode, Interpreter};
//!
//! # async fn run() -> Result<(), ui_dispatch_core::ConfigError> {
//! let root = ComponentNode::from_json_str(r#"{ "type": "div", "children": "hello" }"#)?;
//! let mut interpreter = Interpreter::builder(root).build();
//! interpreter.mount().await;
//! let elements = interpreter.render();
//! assert_eq!(elements[0].text(), "hello");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::RendererOptions;
use crate::dispatcher::{ActionDispatcher, DispatchReport};
use crate::element::{Element, EventHandler};
use crate::event::{EventType, UiEvent};
use crate::fetch::{FetchQueue, FetchReport};
use crate::navigate::Navigator;
use crate::node::ComponentNode;
use crate::registry::ComponentRegistry;
use crate::renderer::Renderer;
use crate::state::StateStore;
use crate::tasks::TaskManager;
use crate::transform::TransformRegistry;
use crate::transport::Transport;

const MOUNT_TASK: &str = "mount";

/// Output of a background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Mount-time fetches finished.
    Mounted(FetchReport),
    /// A fired event handler finished all of its actions.
    Fired {
        event: EventType,
        reports: Vec<DispatchReport>,
    },
}

/// Builder for [`Interpreter`].
pub struct InterpreterBuilder {
    root: ComponentNode,
    transport: Option<Arc<dyn Transport>>,
    navigator: Option<Arc<dyn Navigator>>,
    registry: Option<Arc<ComponentRegistry>>,
    transforms: Option<Arc<TransformRegistry>>,
    options: RendererOptions,
}

impl InterpreterBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn registry(mut self, registry: Arc<ComponentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn transforms(mut self, transforms: Arc<TransformRegistry>) -> Self {
        self.transforms = Some(transforms);
        self
    }

    pub fn options(mut self, options: RendererOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Interpreter {
        let store = StateStore::new();
        let lifetime = CancellationToken::new();

        let mut dispatcher = ActionDispatcher::builder(store.clone())
            .options(self.options)
            .lifetime(lifetime.clone());
        if let Some(transport) = self.transport {
            dispatcher = dispatcher.transport(transport);
        }
        if let Some(navigator) = self.navigator {
            dispatcher = dispatcher.navigator(navigator);
        }
        if let Some(transforms) = self.transforms {
            dispatcher = dispatcher.transforms(transforms);
        }
        let dispatcher = dispatcher.build();

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ComponentRegistry::standard()));
        let renderer = Renderer::new(registry, dispatcher.clone());

        let (tx, completions) = mpsc::unbounded_channel();
        Interpreter {
            root: Arc::new(self.root),
            store,
            dispatcher,
            renderer,
            lifetime,
            tasks: TaskManager::new(tx),
            completions,
            mounted: false,
            fired: 0,
        }
    }
}

/// A configuration tree bound to its own state and side effects.
#[derive(Debug)]
pub struct Interpreter {
    root: Arc<ComponentNode>,
    store: StateStore,
    dispatcher: ActionDispatcher,
    renderer: Renderer,
    lifetime: CancellationToken,
    tasks: TaskManager<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    mounted: bool,
    fired: u64,
}

impl Interpreter {
    /// Start building an interpreter for `root`.
    ///
    /// Defaults: HTTP transport, logging navigator, the standard component
    /// registry and the built-in transforms.
    pub fn builder(root: ComponentNode) -> InterpreterBuilder {
        InterpreterBuilder {
            root,
            transport: None,
            navigator: None,
            registry: None,
            transforms: None,
            options: RendererOptions::default(),
        }
    }

    pub fn root(&self) -> &ComponentNode {
        &self.root
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Change notifications; a host re-renders whenever this changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Render the tree against the current state.
    pub fn render(&self) -> Vec<Element> {
        self.renderer.render(&self.root)
    }

    /// Run the root's data fetches and wait for them.
    ///
    /// Fetches run at most once per interpreter: later calls (and calls
    /// after [`spawn_mount`](Self::spawn_mount)) return `None`.
    pub async fn mount(&mut self) -> Option<FetchReport> {
        if !self.begin_mount() {
            return None;
        }
        Some(self.fetch_queue().run(&self.dispatcher).await)
    }

    /// Like [`mount`](Self::mount), but runs in the background. The report
    /// arrives as [`Completion::Mounted`]. Returns whether a mount started.
    pub fn spawn_mount(&mut self) -> bool {
        if !self.begin_mount() {
            return false;
        }
        let queue = self.fetch_queue();
        let dispatcher = self.dispatcher.clone();
        self.tasks.spawn(MOUNT_TASK, async move {
            Completion::Mounted(queue.run(&dispatcher).await)
        });
        true
    }

    /// Fire `handler` with `event` in the background. The reports arrive as
    /// [`Completion::Fired`].
    pub fn fire(&mut self, handler: &EventHandler, event: UiEvent) {
        if self.is_ended() {
            tracing::debug!(event = %event.kind, "interpreter ended; event ignored");
            return;
        }
        self.fired += 1;
        let handler = handler.clone();
        self.tasks.spawn(format!("event-{}", self.fired), async move {
            let reports = handler.fire_event(&event).await;
            Completion::Fired {
                event: handler.event_type(),
                reports,
            }
        });
    }

    /// Wait for the next background completion.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// A completion that is already available, if any.
    pub fn try_completion(&mut self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Whether the instance has ended (unmounted or navigated away).
    pub fn is_ended(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// End the instance: pending work is aborted and in-flight calls write
    /// nothing further.
    pub fn unmount(&mut self) {
        tracing::debug!(kind = %self.root.kind, "unmounting");
        self.lifetime.cancel();
        self.tasks.cancel_all();
    }

    fn begin_mount(&mut self) -> bool {
        if self.mounted || self.is_ended() {
            return false;
        }
        self.mounted = true;
        true
    }

    fn fetch_queue(&self) -> FetchQueue {
        FetchQueue::new(self.root.data_fetch.iter().cloned())
            .abort_on_error(self.dispatcher.options().abort_fetches_on_error)
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
