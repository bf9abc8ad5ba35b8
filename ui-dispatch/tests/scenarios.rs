//! Cross-module behavior: fetch ordering, action chains, repeat expansion,
//! transforms feeding bindings, and instance lifetime.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use ui_dispatch::prelude::*;
use ui_dispatch::debug::DispatchLogConfig;
use ui_dispatch::testing::{harness, Harness, MockTransport, RecordingNavigator};
use ui_dispatch::{assert_link, assert_state};

#[tokio::test]
async fn test_fetches_complete_in_declaration_order() {
    let root = ComponentNode::new("div")
        .fetch(DataFetchSpec::new("a", ApiConfig::get("/a")))
        .fetch(DataFetchSpec::new("b", ApiConfig::get("/b?after=${state.a.token}")))
        .fetch(DataFetchSpec::new("c", ApiConfig::get("/c")));
    let transport = Arc::new(
        MockTransport::new()
            .respond(HttpMethod::Get, "/a", json!({"token": "t1"}))
            .respond(HttpMethod::Get, "/b?after=t1", json!("b"))
            .respond(HttpMethod::Get, "/c", json!("c"))
            .with_latency(Duration::from_millis(5)),
    );
    let mut interpreter = Interpreter::builder(root)
        .transport(transport.clone())
        .build();

    let report = interpreter.mount().await.expect("mounted");

    assert_eq!(report.keys(), vec!["a", "b", "c"]);
    assert!(report.all_succeeded());
    assert_eq!(transport.urls(), vec!["/a", "/b?after=t1", "/c"]);
}

#[tokio::test]
async fn test_exactly_one_continuation_runs() {
    for (fail, expected) in [(false, "ok"), (true, "failed")] {
        let transport = if fail {
            MockTransport::new().fail(HttpMethod::Post, "/save", 422)
        } else {
            MockTransport::new().respond(HttpMethod::Post, "/save", json!({"saved": true}))
        };
        let h = harness(transport);
        let action = ActionSpec::api("save", &ApiConfig::post("/save", json!({"n": 1})))
            .on_success(ActionSpec::set_state("outcome", "ok"))
            .on_error(ActionSpec::set_state("outcome", "failed"));

        let report = h.dispatcher.dispatch(&action, None).await;

        assert_eq!(report.len(), 2);
        assert_state!(h.store, "outcome" => json!(expected));
        assert_state!(h.store, "save_loading" => json!(false));
        if fail {
            assert_link!(report, ActionKind::Api, ActionStatus::Failed);
            assert_state!(
                h.store,
                "save_error" => json!("API call failed: 422 Unprocessable Entity")
            );
        } else {
            assert_link!(report, ActionKind::Api, ActionStatus::Succeeded);
            assert_state!(h.store, "save_error" => None);
        }
    }
}

#[tokio::test]
async fn test_loading_flag_cleared_before_continuation_runs() {
    let transport = MockTransport::new().respond(HttpMethod::Get, "/users", json!([]));
    let h = harness(transport);
    let action = ActionSpec::api("users", &ApiConfig::get("/users"))
        .on_success(ActionSpec::set_state("seenLoading", "${state.users_loading}"));

    h.dispatcher.dispatch(&action, None).await;
    assert_state!(h.store, "seenLoading" => json!("false"));
}

#[tokio::test]
async fn test_long_chains_run_in_order() {
    let mut action = ActionSpec::set_state("step", 50);
    for n in (0..50).rev() {
        action = ActionSpec::api(format!("call{n}"), &ApiConfig::get("/ping"))
            .on_success(action);
    }
    let h = harness(MockTransport::new().respond(HttpMethod::Get, "/ping", json!("pong")));

    let report = h.dispatcher.dispatch(&action, None).await;

    assert_eq!(report.len(), 51);
    assert_eq!(h.transport.requests().len(), 50);
    assert_state!(h.store, "call49" => json!("pong"));
    assert_state!(h.store, "step" => json!(50));
}

#[test]
fn test_repeat_over_literal_items() {
    let root = ComponentNode::new("span")
        .prop("text", "${item}")
        .repeat(Repeat::Items(vec![json!("x"), json!("y")]));
    let interpreter = Interpreter::builder(root).build();

    let texts: Vec<_> = interpreter
        .render()
        .iter()
        .map(|e| e.prop("text").cloned().unwrap())
        .collect();
    assert_eq!(texts, vec![json!("x"), json!("y")]);
}

#[test]
fn test_to_options_feeds_binding() {
    let root = ComponentNode::new("Select")
        .bind("options", DataBinding::new("users").transform("toOptions"));
    let interpreter = Interpreter::builder(root).build();
    interpreter
        .store()
        .set("users", json!([{"id": 1, "name": "Ann"}]));

    let select = interpreter.render().remove(0);
    assert_eq!(
        select.prop("options"),
        Some(&json!([{"label": "Ann", "value": 1}]))
    );
}

#[test]
fn test_rerender_reflects_writes_without_touching_config() {
    let root = ComponentNode::new("Alert")
        .condition("${state.message}")
        .prop("title", "${state.message}");
    let interpreter = Interpreter::builder(root.clone()).build();

    assert!(interpreter.render().is_empty());
    interpreter.store().set("message", json!("Saved"));
    assert_eq!(
        interpreter.render()[0].prop("title"),
        Some(&json!("Saved"))
    );
    assert_eq!(interpreter.root(), &root);
}

#[tokio::test]
async fn test_navigate_ends_instance_and_later_events_are_skipped() {
    let navigator = RecordingNavigator::new();
    let root = ComponentNode::new("div")
        .child(
            ComponentNode::new("Button")
                .on(EventType::Click, ActionSpec::navigate("/users/${state.id}")),
        )
        .child(
            ComponentNode::new("input")
                .on(EventType::Change, ActionSpec::set_state("typed", "${event.target.value}")),
        );
    let interpreter = Interpreter::builder(root)
        .transport(Arc::new(MockTransport::new()))
        .navigator(Arc::new(navigator.clone()))
        .build();
    interpreter.store().set("id", json!(9));

    let tree = interpreter.render().remove(0);
    let button = tree.find_kind("Button").unwrap();
    let input = tree.find_kind("input").unwrap();

    let reports = button
        .handler(EventType::Click)
        .unwrap()
        .fire_event(&UiEvent::click())
        .await;
    assert_eq!(reports[0].statuses(), vec![ActionStatus::Navigated]);
    assert_eq!(navigator.visits(), vec!["/users/9"]);
    assert!(interpreter.is_ended());

    let reports = input
        .handler(EventType::Change)
        .unwrap()
        .fire_event(&UiEvent::change("late"))
        .await;
    assert_eq!(reports[0].statuses(), vec![ActionStatus::Skipped]);
    assert_state!(interpreter.store(), "typed" => None);
}

#[tokio::test]
async fn test_dispatch_log_filters() {
    let options = RendererOptions::default().with_dispatch_log(
        DispatchLogConfig::with_capacity(10).filter(DispatchFilter::new(Some("api:*"), None)),
    );
    let h = Harness::with_options(
        MockTransport::new().respond(HttpMethod::Get, "/users", json!([])),
        options,
    );
    h.dispatcher
        .dispatch(&ActionSpec::set_state("before", true), None)
        .await;
    h.dispatcher
        .dispatch(&ActionSpec::api("users", &ApiConfig::get("/users")), None)
        .await;

    let log = h.dispatcher.dispatch_log();
    let names: Vec<_> = log.entries().map(|e| e.name()).collect();
    assert_eq!(names, vec!["api:users"]);
}
