//! Action dispatch
//!
//! An [`ActionSpec`] is the head of a chain: an `api` link names the action to
//! run next on success or on failure. The dispatcher walks that chain as a
//! loop, one link at a time, each link starting only after its parent has
//! settled and written its results to the store.
//!
//! Failures never escape a dispatch. A failed `api` link writes its error text
//! to the `<target>_error` companion key and continues with `errorAction`.
//!
//! Every dispatcher carries the lifetime token of the interpreter that owns
//! it. Once the token is cancelled (unmount or `navigate`), pending links are
//! skipped and in-flight calls finish without touching the store.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::binding::{error_key, loading_key};
use crate::config::RendererOptions;
use crate::debug::DispatchLog;
use crate::error::ActionError;
use crate::navigate::{LogNavigator, Navigator};
use crate::node::{ActionKind, ActionSpec, ApiConfig, DataFetchSpec, HttpMethod};
use crate::state::StateStore;
use crate::template::{process_template, resolve_params, Scope};
use crate::transform::TransformRegistry;
use crate::transport::{ApiRequest, HttpTransport, Transport};
use crate::value::Value;

/// How a single link ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Succeeded,
    Failed,
    /// A `navigate` link handed off to the host and ended the instance.
    Navigated,
    /// Not run: unknown kind, or the owning interpreter had already ended.
    Skipped,
}

/// Outcome of one executed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub kind: ActionKind,
    pub target: Option<String>,
    pub status: ActionStatus,
}

impl LinkReport {
    fn new(action: &ActionSpec, status: ActionStatus) -> Self {
        Self {
            kind: action.kind.clone(),
            target: action.target.clone(),
            status,
        }
    }
}

/// Links executed by one dispatch, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub links: Vec<LinkReport>,
}

impl DispatchReport {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn statuses(&self) -> Vec<ActionStatus> {
        self.links.iter().map(|link| link.status).collect()
    }

    /// Status of the final link, i.e. how the chain ended.
    pub fn last_status(&self) -> Option<ActionStatus> {
        self.links.last().map(|link| link.status)
    }
}

/// Result of the shared `api` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl CallOutcome {
    fn status(self) -> ActionStatus {
        match self {
            CallOutcome::Succeeded => ActionStatus::Succeeded,
            CallOutcome::Failed => ActionStatus::Failed,
            CallOutcome::Cancelled => ActionStatus::Skipped,
        }
    }
}

struct Inner {
    store: StateStore,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
    transforms: Arc<TransformRegistry>,
    options: RendererOptions,
    lifetime: CancellationToken,
    log: Mutex<DispatchLog>,
}

/// Executes actions against one interpreter's store.
///
/// Cloning is cheap; clones share the store, transport and dispatch log.
#[derive(Clone)]
pub struct ActionDispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("store", &self.inner.store)
            .field("ended", &self.is_ended())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionDispatcher`].
pub struct DispatcherBuilder {
    store: StateStore,
    transport: Option<Arc<dyn Transport>>,
    navigator: Option<Arc<dyn Navigator>>,
    transforms: Option<Arc<TransformRegistry>>,
    options: RendererOptions,
    lifetime: Option<CancellationToken>,
}

impl DispatcherBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
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

    pub fn lifetime(mut self, lifetime: CancellationToken) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn build(self) -> ActionDispatcher {
        let log = DispatchLog::new(self.options.dispatch_log.clone());
        ActionDispatcher {
            inner: Arc::new(Inner {
                store: self.store,
                transport: self
                    .transport
                    .unwrap_or_else(|| Arc::new(HttpTransport::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
                transforms: self
                    .transforms
                    .unwrap_or_else(|| Arc::new(TransformRegistry::builtin())),
                options: self.options,
                lifetime: self.lifetime.unwrap_or_default(),
                log: Mutex::new(log),
            }),
        }
    }
}

impl ActionDispatcher {
    /// Start building a dispatcher over `store`.
    ///
    /// Unset parts default to [`HttpTransport`], [`LogNavigator`], the
    /// built-in transforms and a fresh lifetime token.
    pub fn builder(store: StateStore) -> DispatcherBuilder {
        DispatcherBuilder {
            store,
            transport: None,
            navigator: None,
            transforms: None,
            options: RendererOptions::default(),
            lifetime: None,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    pub fn transforms(&self) -> &Arc<TransformRegistry> {
        &self.inner.transforms
    }

    pub fn options(&self) -> &RendererOptions {
        &self.inner.options
    }

    pub fn lifetime(&self) -> &CancellationToken {
        &self.inner.lifetime
    }

    /// Whether the owning interpreter has ended.
    pub fn is_ended(&self) -> bool {
        self.inner.lifetime.is_cancelled()
    }

    /// Copy of the dispatch log.
    pub fn dispatch_log(&self) -> DispatchLog {
        self.inner.log.lock().clone()
    }

    /// Run an action and its continuation chain to completion.
    ///
    /// `event` is the payload of the UI event that triggered the action, if
    /// any; it is visible to templates as `${event.…}`.
    pub async fn dispatch(&self, action: &ActionSpec, event: Option<&Value>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut next = Some(Cow::Borrowed(action));

        while let Some(link) = next.take() {
            if self.is_ended() {
                tracing::debug!(action = %link.kind, "interpreter ended; dropping action");
                report.links.push(self.record(LinkReport::new(&link, ActionStatus::Skipped)));
                break;
            }

            let entry = LinkReport::new(&link, ActionStatus::Skipped);
            let (status, follow) = self.run_link(link, event).await;
            tracing::debug!(
                action = %entry.kind,
                key = entry.target.as_deref().unwrap_or_default(),
                ?status,
                "action settled"
            );
            report.links.push(self.record(LinkReport { status, ..entry }));
            next = follow;
        }

        report
    }

    /// Run a mount-time fetch: the `api` lifecycle, the optional transform,
    /// then the matching `onSuccess`/`onError` action.
    pub(crate) async fn fetch(&self, spec: &DataFetchSpec) -> (ActionStatus, Option<DispatchReport>) {
        let entry = LinkReport {
            kind: ActionKind::Api,
            target: Some(spec.key.clone()),
            status: ActionStatus::Skipped,
        };
        if self.is_ended() {
            return (self.record(entry).status, None);
        }

        let params = serde_json::to_value(&spec.api).unwrap_or(Value::Null);
        let outcome = self
            .call_api(&spec.key, &params, None, spec.transform.as_deref())
            .await;
        let status = self.record(LinkReport { status: outcome.status(), ..entry }).status;

        let follow = match outcome {
            CallOutcome::Succeeded => spec.on_success.as_ref(),
            CallOutcome::Failed => spec.on_error.as_ref(),
            CallOutcome::Cancelled => None,
        };
        let continuation = match follow {
            Some(action) => Some(self.dispatch(action, None).await),
            None => None,
        };
        (status, continuation)
    }

    fn record(&self, link: LinkReport) -> LinkReport {
        self.inner.log.lock().record(&link);
        link
    }

    async fn run_link<'a>(
        &self,
        link: Cow<'a, ActionSpec>,
        event: Option<&Value>,
    ) -> (ActionStatus, Option<Cow<'a, ActionSpec>>) {
        let kind = link.kind.clone();
        match kind {
            ActionKind::SetState => (self.set_state(&link, event), None),
            ActionKind::Api => {
                let outcome = match link.target.as_deref() {
                    Some(target) => {
                        let params = link.params.as_ref().unwrap_or(&Value::Null);
                        self.call_api(target, params, event, None).await
                    }
                    None => {
                        tracing::warn!(error = %ActionError::MissingTarget { kind: "api" }, "api action skipped");
                        CallOutcome::Failed
                    }
                };
                match outcome {
                    CallOutcome::Succeeded => (ActionStatus::Succeeded, continuation(link, true)),
                    CallOutcome::Failed => (ActionStatus::Failed, continuation(link, false)),
                    CallOutcome::Cancelled => (ActionStatus::Skipped, None),
                }
            }
            ActionKind::Submit => match self.submit_as_api(&link) {
                Some(api) => (ActionStatus::Succeeded, Some(Cow::Owned(api))),
                None => (ActionStatus::Failed, None),
            },
            ActionKind::Navigate => (self.navigate(&link, event), None),
            ActionKind::Unknown(name) => {
                tracing::warn!(action = %name, "unknown action kind");
                (ActionStatus::Skipped, None)
            }
        }
    }

    fn set_state(&self, action: &ActionSpec, event: Option<&Value>) -> ActionStatus {
        let Some(target) = action.target.as_deref() else {
            tracing::warn!(error = %ActionError::MissingTarget { kind: "setState" }, "setState skipped");
            return ActionStatus::Failed;
        };
        let snapshot = self.inner.store.snapshot();
        let scope = Scope::new(&snapshot).with_event(event);
        let value = resolve_params(action.params.as_ref().unwrap_or(&Value::Null), &scope);
        self.inner.store.set(target, value);
        ActionStatus::Succeeded
    }

    /// Turn a `submit` into a POST of the state value it names.
    fn submit_as_api(&self, action: &ActionSpec) -> Option<ActionSpec> {
        let Some(target) = action.target.as_deref() else {
            tracing::warn!(error = %ActionError::MissingTarget { kind: "submit" }, "submit skipped");
            return None;
        };
        let source = action
            .params
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or(target);

        let config = ApiConfig {
            url: target.to_string(),
            method: HttpMethod::Post,
            headers: Default::default(),
            body: self.inner.store.get(source),
        };
        let mut api = ActionSpec::api(target, &config);
        api.success_action = action.success_action.clone();
        api.error_action = action.error_action.clone();
        Some(api)
    }

    fn navigate(&self, action: &ActionSpec, event: Option<&Value>) -> ActionStatus {
        let location = match (&action.params, &action.target) {
            (Some(Value::String(location)), _) => location,
            (_, Some(target)) => target,
            _ => {
                tracing::warn!(error = %ActionError::MissingTarget { kind: "navigate" }, "navigate skipped");
                return ActionStatus::Failed;
            }
        };
        let snapshot = self.inner.store.snapshot();
        let scope = Scope::new(&snapshot).with_event(event);
        let location = process_template(location, &scope);

        self.inner.navigator.navigate(&location);
        self.inner.lifetime.cancel();
        ActionStatus::Navigated
    }

    /// The `api` lifecycle shared by actions and fetches.
    async fn call_api(
        &self,
        target: &str,
        params: &Value,
        event: Option<&Value>,
        transform: Option<&str>,
    ) -> CallOutcome {
        let store = &self.inner.store;
        let loading = loading_key(target);
        store.set(&loading, Value::Bool(true));
        store.remove(&error_key(target));

        let result = tokio::select! {
            biased;
            _ = self.inner.lifetime.cancelled() => {
                tracing::debug!(key = target, "interpreter ended during call; result dropped");
                return CallOutcome::Cancelled;
            }
            result = self.send(params, event) => result,
        };

        let outcome = match result {
            Ok(payload) => {
                let payload = self.inner.transforms.apply_opt(transform, payload);
                store.set(target, payload);
                CallOutcome::Succeeded
            }
            Err(err) => {
                tracing::warn!(key = target, error = %err, "api call failed");
                store.set(&error_key(target), Value::String(err.to_string()));
                CallOutcome::Failed
            }
        };
        store.set(&loading, Value::Bool(false));
        outcome
    }

    async fn send(&self, params: &Value, event: Option<&Value>) -> Result<Value, ActionError> {
        let request = self.build_request(params, event)?;
        Ok(self.inner.transport.send(request).await?)
    }

    fn build_request(&self, params: &Value, event: Option<&Value>) -> Result<ApiRequest, ActionError> {
        let snapshot = self.inner.store.snapshot();
        let scope = Scope::new(&snapshot).with_event(event);
        let config: ApiConfig = serde_json::from_value(resolve_params(params, &scope))
            .map_err(|err| ActionError::InvalidApiConfig(err.to_string()))?;

        let mut request = ApiRequest::new(config.method, config.url);
        request.headers = self.inner.options.default_headers.clone();
        request.headers.extend(
            config
                .headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value)),
        );
        request.body = config.body;
        Ok(request)
    }
}

/// The continuation of a settled `api` link.
fn continuation(link: Cow<'_, ActionSpec>, succeeded: bool) -> Option<Cow<'_, ActionSpec>> {
    match link {
        Cow::Borrowed(spec) => {
            let next = if succeeded { &spec.success_action } else { &spec.error_action };
            next.as_deref().map(Cow::Borrowed)
        }
        Cow::Owned(spec) => {
            let next = if succeeded { spec.success_action } else { spec.error_action };
            next.map(|spec| Cow::Owned(*spec))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{harness, MockTransport};
    use serde_json::json;
    use std::time::Duration;

    fn users_api() -> ApiConfig {
        ApiConfig::get("https://api.test/users")
    }

    #[tokio::test]
    async fn test_set_state_with_event_value() {
        let h = harness(MockTransport::new());
        let action = ActionSpec::set_state("selectedUser", "${event.target.value}");

        let report = h
            .dispatcher
            .dispatch(&action, Some(&json!({"target": {"value": "3"}})))
            .await;

        assert_eq!(report.statuses(), vec![ActionStatus::Succeeded]);
        assert_eq!(h.store.get("selectedUser"), Some(json!("3")));
    }

    #[tokio::test]
    async fn test_set_state_resolves_structured_params() {
        let h = harness(MockTransport::new());
        h.store.set("user", json!({"name": "Ann"}));
        let action = ActionSpec::set_state("form", json!({"name": "${state.user.name}", "age": 3}));

        h.dispatcher.dispatch(&action, None).await;
        assert_eq!(h.store.get("form"), Some(json!({"name": "Ann", "age": 3})));
    }

    #[tokio::test]
    async fn test_api_success_runs_success_chain() {
        let transport = MockTransport::new().respond(
            HttpMethod::Get,
            "https://api.test/users",
            json!([{"id": 1, "name": "Ann"}]),
        );
        let h = harness(transport);
        let action = ActionSpec::api("users", &users_api())
            .on_success(ActionSpec::set_state("status", "loaded"))
            .on_error(ActionSpec::set_state("status", "failed"));

        let report = h.dispatcher.dispatch(&action, None).await;

        assert_eq!(
            report.statuses(),
            vec![ActionStatus::Succeeded, ActionStatus::Succeeded]
        );
        assert_eq!(h.store.get("users"), Some(json!([{"id": 1, "name": "Ann"}])));
        assert_eq!(h.store.get("users_loading"), Some(json!(false)));
        assert_eq!(h.store.get("status"), Some(json!("loaded")));
        assert!(!h.store.has("users_error"));
    }

    #[tokio::test]
    async fn test_api_failure_runs_error_chain() {
        let transport = MockTransport::new().fail(HttpMethod::Get, "https://api.test/users", 500);
        let h = harness(transport);
        h.store.set("users_error", json!("stale"));
        let action = ActionSpec::api("users", &users_api())
            .on_success(ActionSpec::set_state("status", "loaded"))
            .on_error(ActionSpec::set_state("status", "failed"));

        let report = h.dispatcher.dispatch(&action, None).await;

        assert_eq!(report.statuses(), vec![ActionStatus::Failed, ActionStatus::Succeeded]);
        assert_eq!(
            h.store.get("users_error"),
            Some(json!("API call failed: 500 Internal Server Error"))
        );
        assert_eq!(h.store.get("users_loading"), Some(json!(false)));
        assert_eq!(h.store.get("status"), Some(json!("failed")));
        assert!(!h.store.has("users"));
    }

    #[tokio::test]
    async fn test_invalid_api_params_fail_the_link() {
        let h = harness(MockTransport::new());
        let action = ActionSpec::new(ActionKind::Api)
            .target("users")
            .params(json!({"method": "GET"}));

        let report = h.dispatcher.dispatch(&action, None).await;

        assert_eq!(report.last_status(), Some(ActionStatus::Failed));
        let error = h.store.get("users_error").expect("error recorded");
        assert!(error.as_str().unwrap().starts_with("invalid api params"));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_loading_flag_visible_while_in_flight() {
        let transport = MockTransport::new()
            .respond(HttpMethod::Get, "https://api.test/users", json!([]))
            .with_latency(Duration::from_millis(50));
        let h = harness(transport);
        let action = ActionSpec::api("users", &users_api());

        let dispatcher = h.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.dispatch(&action, None).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.store.get("users_loading"), Some(json!(true)));

        task.await.expect("dispatch task");
        assert_eq!(h.store.get("users_loading"), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_request_url_and_body_are_templated() {
        let transport = MockTransport::new().respond(
            HttpMethod::Post,
            "https://api.test/users/7/notes",
            json!({"ok": true}),
        );
        let h = harness(transport);
        h.store.set("selected", json!(7));
        let config = ApiConfig::post(
            "https://api.test/users/${state.selected}/notes",
            json!({"text": "${event.target.value}"}),
        )
        .header("X-Trace", "abc");

        h.dispatcher
            .dispatch(
                &ActionSpec::api("note", &config),
                Some(&json!({"target": {"value": "hello"}})),
            )
            .await;

        let requests = h.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({"text": "hello"})));
        assert_eq!(requests[0].headers["x-trace"], "abc");
        assert_eq!(requests[0].headers["content-type"], "application/json");
        assert_eq!(h.store.get("note"), Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_submit_posts_state_value() {
        let transport =
            MockTransport::new().respond(HttpMethod::Post, "/api/forms", json!({"id": 10}));
        let h = harness(transport);
        h.store.set("form", json!({"email": "ann@example.com"}));
        let action = ActionSpec::new(ActionKind::Submit)
            .target("/api/forms")
            .params("form")
            .on_success(ActionSpec::set_state("submitted", true));

        let report = h.dispatcher.dispatch(&action, None).await;

        let kinds: Vec<_> = report.links.iter().map(|l| l.kind.clone()).collect();
        assert_eq!(kinds, vec![ActionKind::Submit, ActionKind::Api, ActionKind::SetState]);
        let requests = h.transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].body, Some(json!({"email": "ann@example.com"})));
        assert_eq!(h.store.get("/api/forms"), Some(json!({"id": 10})));
        assert_eq!(h.store.get("submitted"), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_navigate_ends_instance() {
        let h = harness(MockTransport::new());
        h.store.set("id", json!(4));

        let report = h
            .dispatcher
            .dispatch(&ActionSpec::navigate("/users/${state.id}"), None)
            .await;
        assert_eq!(report.statuses(), vec![ActionStatus::Navigated]);
        assert_eq!(h.navigator.visits(), vec!["/users/4".to_string()]);
        assert!(h.dispatcher.is_ended());

        let after = h
            .dispatcher
            .dispatch(&ActionSpec::set_state("late", true), None)
            .await;
        assert_eq!(after.statuses(), vec![ActionStatus::Skipped]);
        assert!(!h.store.has("late"));
    }

    #[tokio::test]
    async fn test_cancelled_call_writes_nothing() {
        let transport = MockTransport::new()
            .respond(HttpMethod::Get, "https://api.test/users", json!([1]))
            .with_latency(Duration::from_millis(200));
        let h = harness(transport);
        let action = ActionSpec::api("users", &users_api())
            .on_success(ActionSpec::set_state("status", "loaded"));

        let dispatcher = h.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.dispatch(&action, None).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.dispatcher.lifetime().cancel();

        let report = task.await.expect("dispatch task");
        assert_eq!(report.statuses(), vec![ActionStatus::Skipped]);
        assert!(!h.store.has("users"));
        assert!(!h.store.has("status"));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_skipped() {
        let h = harness(MockTransport::new());
        let action = ActionSpec::new(ActionKind::Unknown("teleport".into())).target("x");

        let report = h.dispatcher.dispatch(&action, None).await;
        assert_eq!(report.statuses(), vec![ActionStatus::Skipped]);
        assert_eq!(h.store.version(), 0);
    }

    #[tokio::test]
    async fn test_links_are_logged() {
        let transport =
            MockTransport::new().respond(HttpMethod::Get, "https://api.test/users", json!([]));
        let h = harness(transport);
        let action = ActionSpec::api("users", &users_api())
            .on_success(ActionSpec::set_state("status", "loaded"));

        h.dispatcher.dispatch(&action, None).await;

        let log = h.dispatcher.dispatch_log();
        let names: Vec<_> = log.entries().map(|e| e.name()).collect();
        assert_eq!(names, vec!["api:users", "setState:status"]);
    }

    #[tokio::test]
    async fn test_fetch_applies_transform_and_continuation() {
        let transport = MockTransport::new().respond(
            HttpMethod::Get,
            "https://api.test/users",
            json!([{"id": 1, "name": "Ann"}]),
        );
        let h = harness(transport);
        let spec = DataFetchSpec::new("users", users_api())
            .transform("toOptions")
            .on_success(ActionSpec::set_state("ready", true));

        let (status, continuation) = h.dispatcher.fetch(&spec).await;

        assert_eq!(status, ActionStatus::Succeeded);
        assert_eq!(continuation.map(|r| r.len()), Some(1));
        assert_eq!(h.store.get("users"), Some(json!([{"label": "Ann", "value": 1}])));
        assert_eq!(h.store.get("ready"), Some(json!(true)));
    }
}
