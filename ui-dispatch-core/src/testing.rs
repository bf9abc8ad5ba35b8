//! Test utilities for ui-dispatch trees
//!
//! - [`MockTransport`]: scripted responses per method and URL, optional
//!   latency, and a log of every request sent
//! - [`RecordingNavigator`]: remembers navigation requests
//! - [`harness`]: a store, dispatcher, mock transport and navigator wired
//!   together
//! - Assertion macros for store contents and dispatch reports
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use ui_dispatch_core::node::{ActionSpec, ApiConfig, HttpMethod};
//! use ui_dispatch_core::testing::{harness, MockTransport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let h = harness(
//!     MockTransport::new().respond(HttpMethod::Get, "/users", json!([{"id": 1}])),
//! );
//! h.dispatcher
//!     .dispatch(&ActionSpec::api("users", &ApiConfig::get("/users")), None)
//!     .await;
//! assert_eq!(h.store.get("users"), Some(json!([{"id": 1}])));
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::RendererOptions;
use crate::dispatcher::ActionDispatcher;
use crate::error::TransportError;
use crate::navigate::Navigator;
use crate::node::HttpMethod;
use crate::state::StateStore;
use crate::transport::{ApiRequest, Transport};
use crate::value::Value;

/// A scripted reply.
#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status(u16),
}

/// Transport returning scripted replies.
///
/// Each route holds a queue of replies. Replies are consumed in order; the
/// last one repeats. Requests without a route fail with `404 Not Found`.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(HttpMethod, String), Vec<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
    latency: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method url` with a JSON payload.
    pub fn respond(self, method: HttpMethod, url: impl Into<String>, payload: Value) -> Self {
        self.push(method, url.into(), Reply::Json(payload))
    }

    /// Answer `method url` with an error status.
    pub fn fail(self, method: HttpMethod, url: impl Into<String>, status: u16) -> Self {
        self.push(method, url.into(), Reply::Status(status))
    }

    /// Delay every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// URLs requested so far, in arrival order.
    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }

    fn push(self, method: HttpMethod, url: String, reply: Reply) -> Self {
        self.routes.lock().entry((method, url)).or_default().push(reply);
        self
    }

    fn next_reply(&self, method: HttpMethod, url: &str) -> Option<Reply> {
        let mut routes = self.routes.lock();
        let queue = routes.get_mut(&(method, url.to_string()))?;
        if queue.len() > 1 {
            Some(queue.remove(0))
        } else {
            queue.first().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let reply = self.next_reply(request.method, &request.url);
        self.requests.lock().push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match reply.unwrap_or(Reply::Status(404)) {
            Reply::Json(payload) => Ok(payload),
            Reply::Status(status) => Err(TransportError::Status {
                status,
                reason: reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|code| code.canonical_reason())
                    .unwrap_or_default()
                    .to_string(),
            }),
        }
    }
}

/// Navigator that records every requested location.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.visits.lock().push(location.to_string());
    }
}

/// A dispatcher wired to a mock transport and a recording navigator.
pub struct Harness {
    pub store: StateStore,
    pub transport: Arc<MockTransport>,
    pub navigator: RecordingNavigator,
    pub dispatcher: ActionDispatcher,
}

impl Harness {
    pub fn new(transport: MockTransport) -> Self {
        Self::with_options(transport, RendererOptions::default())
    }

    pub fn with_options(transport: MockTransport, options: RendererOptions) -> Self {
        let store = StateStore::new();
        let transport = Arc::new(transport);
        let navigator = RecordingNavigator::new();
        let dispatcher = ActionDispatcher::builder(store.clone())
            .transport(transport.clone())
            .navigator(Arc::new(navigator.clone()))
            .options(options)
            .build();
        Self {
            store,
            transport,
            navigator,
            dispatcher,
        }
    }
}

/// Shorthand for [`Harness::new`].
pub fn harness(transport: MockTransport) -> Harness {
    Harness::new(transport)
}

/// Assert that the store holds `value` at `path` (or nothing, for `None`).
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use ui_dispatch_core::{assert_state, StateStore};
///
/// let store = StateStore::new();
/// store.set("user.name", json!("Ann"));
/// assert_state!(store, "user.name" => json!("Ann"));
/// assert_state!(store, "user.email" => None);
/// ```
#[macro_export]
macro_rules! assert_state {
    ($store:expr, $path:expr => None) => {
        assert!(
            !$store.has($path),
            "Expected `{}` to be absent, but found: {:?}",
            $path,
            $store.get($path)
        );
    };
    ($store:expr, $path:expr => $value:expr) => {
        assert_eq!(
            $store.get($path),
            Some($value),
            "Unexpected value at `{}`",
            $path
        );
    };
}

/// Assert that a dispatch report contains a link of the given kind and status.
///
/// # Example
///
/// ```ignore
/// let report = dispatcher.dispatch(&action, None).await;
/// assert_link!(report, ActionKind::Api, ActionStatus::Failed);
/// ```
#[macro_export]
macro_rules! assert_link {
    ($report:expr, $kind:pat, $status:pat) => {
        assert!(
            $report
                .links
                .iter()
                .any(|link| matches!(link.kind, $kind) && matches!(link.status, $status)),
            "Expected a `{}` link with status `{}`, but got: {:?}",
            stringify!($kind),
            stringify!($status),
            $report.links
        );
    };
}
