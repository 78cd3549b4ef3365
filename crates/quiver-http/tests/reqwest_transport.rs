//! Integration tests for the reqwest-backed transport against a local
//! mock server.

use quiver_http::{
    CallOptions, Client, ClientConfig, ContentType, HttpError, SearchParams, TransportFault,
    UrlContext,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context_for(server: &MockServer) -> UrlContext {
    UrlContext::new(server.uri(), "http:")
}

#[tokio::test]
async fn get_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("world")
                .insert_header("x-custom", "yes"),
        )
        .mount(&server)
        .await;

    let client = Client::over_reqwest(context_for(&server), None);
    let response = client.get("/hello", None, None).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"world");
    assert_eq!(response.header("x-custom"), Some("yes"));
    assert!(response.is_success());
}

#[tokio::test]
async fn post_sends_serialized_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "Ann"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let client = Client::over_reqwest(
        context_for(&server),
        Some(ClientConfig::new().content_type(ContentType::Json)),
    );
    let response = client
        .post("/users", Some(json!({"name": "Ann"}).into()), None)
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.json().unwrap()["id"], 1);
}

#[tokio::test]
async fn nested_search_reaches_server_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find"))
        .and(query_param("q", "rust"))
        .and(query_param("filter[lang]", "en"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = Client::over_reqwest(context_for(&server), None);
    let search = SearchParams::new()
        .with("q", "rust")
        .with("filter", SearchParams::new().with("lang", "en"));
    let response = client.get("/find", Some(search), None).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn http_error_statuses_resolve_as_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let client = Client::over_reqwest(context_for(&server), None);
    let response = client.get("/missing", None, None).await.unwrap();

    assert_eq!(response.status, 404);
    assert!(response.is_client_error());
    assert_eq!(response.body, b"nope");
}

#[tokio::test]
async fn transport_timeout_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = Client::over_reqwest(context_for(&server), None);
    let error = client
        .get("/slow", None, Some(CallOptions::new().timeout(100)))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        HttpError::Transport(TransportFault::TimedOut)
    ));
}

#[tokio::test]
async fn override_mime_replaces_reported_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    let client = Client::over_reqwest(context_for(&server), None);
    let response = client
        .get(
            "/data",
            None,
            Some(CallOptions::new().override_mime("application/json")),
        )
        .await
        .unwrap();

    assert_eq!(response.content_type(), Some("application/json"));
    assert!(response.is_json());
}
