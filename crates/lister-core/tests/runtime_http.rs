//! Runtime driven end to end through the reqwest transport

use lister_core::config::{HttpConfig, RuntimeConfig};
use lister_core::definition::{ListerDefinition, Mapping, Resolver, Selector, Source};
use lister_core::option::OptionId;
use lister_core::runtime::{ListerRuntime, OpenOptions};
use lister_core::{DraftValue, Reason};
use serde_json::{json, Value};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runtime_for(server: &MockServer) -> ListerRuntime {
    let config = RuntimeConfig {
        debounce_ms: 10,
        http: HttpConfig {
            base_url: Some(server.uri()),
            ..HttpConfig::default()
        },
    };
    let runtime = ListerRuntime::with_default_http(config).unwrap();
    runtime.register_preset(
        "teams",
        ListerDefinition::new(
            Source::get("/teams"),
            Mapping::new(Resolver::path("slug")).with_label(Resolver::path("title")),
        )
        .with_selector(Selector::path("payload.items")),
    );
    runtime
}

#[tokio::test]
async fn test_session_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(header_exists("X-Lister-Request-Id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"items": [
                {"slug": "core", "title": "Core"},
                {"slug": "web", "title": "Web"}
            ]}
        })))
        .mount(&server)
        .await;
    let runtime = runtime_for(&server);

    let handle = runtime.open("teams", json!({"org": "acme"}), OpenOptions::multiple());
    let id = handle.session_id().cloned().unwrap();
    let session = runtime.settled(&id).await.unwrap();
    assert_eq!(session.options_list.len(), 2);
    assert!(session.error_code.is_none());

    assert!(runtime.select(&id, "web"));
    assert!(runtime.apply(&id));

    let result = handle.wait().await;
    assert_eq!(result.reason, Reason::Apply);
    assert_eq!(result.value, DraftValue::Multiple(vec![OptionId::from("web")]));
    assert_eq!(result.details.raw, json!([{"slug": "web", "title": "Web"}]));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.query(), Some("org=acme&searchAll=true"));
}

#[tokio::test]
async fn test_remote_query_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(query_param("search", "we"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"items": [{"slug": "web", "title": "Web"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"items": [{"slug": "core"}, {"slug": "web"}]}
        })))
        .mount(&server)
        .await;
    let runtime = runtime_for(&server);

    let handle = runtime.open("teams", Value::Null, OpenOptions::single());
    let id = handle.session_id().cloned().unwrap();
    assert_eq!(runtime.settled(&id).await.unwrap().options_list.len(), 2);

    assert!(runtime.set_query(&id, "we"));
    let session = runtime.settled(&id).await.unwrap();
    assert_eq!(session.options_list.len(), 1);
    assert_eq!(session.options_list[0].label, "Web");

    runtime.cancel(&id);
    assert_eq!(handle.wait().await.reason, Reason::Cancel);
}

#[tokio::test]
async fn test_shapeless_body_sets_error_code() {
    let server = MockServer::start().await;
    Mock::given(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;
    let runtime = runtime_for(&server);

    let handle = runtime.open("teams", Value::Null, OpenOptions::single());
    let id = handle.session_id().cloned().unwrap();
    let session = runtime.settled(&id).await.unwrap();

    assert_eq!(session.error_code.as_deref(), Some("extract_not_array"));
    assert!(session.options_list.is_empty());
    assert_eq!(runtime.metrics().failed(), 1);
}
