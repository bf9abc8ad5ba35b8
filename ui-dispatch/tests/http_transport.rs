//! Trees talking to a real HTTP server.

use std::sync::Arc;

use serde_json::json;
use ui_dispatch::prelude::*;
use ui_dispatch::HttpTransport;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn directory(base: &str) -> ComponentNode {
    ComponentNode::new("Card")
        .fetch(
            DataFetchSpec::new("users", ApiConfig::get(format!("{base}/users")))
                .transform("toOptions"),
        )
        .child(ComponentNode::new("Select").bind("options", DataBinding::new("users")))
        .child(
            ComponentNode::new("Alert")
                .prop("variant", "destructive")
                .condition("${state.users_error}")
                .bind("children", DataBinding::new("users_error")),
        )
}

fn interpreter(root: ComponentNode) -> Interpreter {
    Interpreter::builder(root)
        .transport(Arc::new(HttpTransport::new()))
        .build()
}

#[tokio::test]
async fn test_mount_fetches_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Ann"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut interpreter = interpreter(directory(&server.uri()));
    let report = interpreter.mount().await.expect("mounted");
    assert!(report.all_succeeded());

    let root = interpreter.render().remove(0);
    assert_eq!(
        root.find_kind("Select").unwrap().prop("options"),
        Some(&json!([{"label": "Ann", "value": 1}]))
    );
    assert!(root.find_kind("Alert").is_none());
}

#[tokio::test]
async fn test_server_error_renders_alert() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut interpreter = interpreter(directory(&server.uri()));
    interpreter.mount().await;

    assert_eq!(interpreter.store().get("users_loading"), Some(json!(false)));
    let root = interpreter.render().remove(0);
    let alert = root.find_kind("Alert").expect("alert shown");
    assert_eq!(
        alert.prop("children"),
        Some(&json!("API call failed: 500 Internal Server Error"))
    );
}

#[tokio::test]
async fn test_submit_posts_form_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/forms/contact"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"email": "ann@example.com"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let submit = ActionSpec::new(ActionKind::Submit)
        .target(format!("{}/forms/contact", server.uri()))
        .params("contact")
        .on_success(ActionSpec::set_state("sent", true));
    let root = ComponentNode::new("form").on(EventType::Submit, submit);
    let interpreter = interpreter(root);
    interpreter
        .store()
        .set("contact", json!({"email": "ann@example.com"}));

    let form = interpreter.render().remove(0);
    let reports = form
        .handler(EventType::Submit)
        .expect("submit handler")
        .fire_event(&UiEvent::submit())
        .await;

    assert_eq!(
        reports[0].statuses(),
        vec![
            ActionStatus::Succeeded,
            ActionStatus::Succeeded,
            ActionStatus::Succeeded
        ]
    );
    assert_eq!(interpreter.store().get("sent"), Some(json!(true)));
}
