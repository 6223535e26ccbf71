mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use config_plane::ConfigStore;

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_config(body: Value) -> Request<Body> {
    Request::post("/v1/config")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_get_config() {
    let app = common::router(common::store_with(common::MINIMAL_TOML), None);

    let (status, body) = send(app, Request::get("/v1/config").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["version"], "v1");
    assert_eq!(body["config"]["listeners"][0]["id"], "only");
}

#[tokio::test]
async fn test_update_config_success() {
    let store = Arc::new(ConfigStore::empty());
    let app = common::router(Arc::clone(&store), None);

    let (status, body) = send(
        app,
        post_config(json!({"config": {"format": "toml", "content": common::FULL_TOML}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["config"]["apps"][1]["id"], "script");
    assert_eq!(store.get().apps.len(), 2);
}

#[tokio::test]
async fn test_update_config_rejection() {
    let store = common::store_with(common::MINIMAL_TOML);
    let before = store.get();
    let app = common::router(Arc::clone(&store), None);

    let (status, body) = send(
        app,
        post_config(json!({"config": {"format": "toml", "content": "version = \"v2\""}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("v2"));
    assert_eq!(body["config"]["listeners"][0]["id"], "only");
    assert_eq!(store.get(), before);
}

#[tokio::test]
async fn test_update_config_json_document() {
    let store = Arc::new(ConfigStore::empty());
    let app = common::router(Arc::clone(&store), None);
    let document = json!({"apps": [{"id": "echo", "type": "echo"}]}).to_string();

    let (status, body) = send(
        app,
        post_config(json!({"config": {"format": "json", "content": document}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["apps"][0]["type"], "echo");
}

#[tokio::test]
async fn test_missing_config_is_bad_request() {
    let store = common::store_with(common::MINIMAL_TOML);
    let before = store.get();
    let app = common::router(Arc::clone(&store), None);

    let (status, body) = send(app, post_config(json!({"config": null}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("config is required"));
    assert_eq!(store.get(), before);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = common::router(Arc::new(ConfigStore::empty()), None);

    let request = Request::post("/v1/config")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_key_is_enforced() {
    let store = common::store_with(common::MINIMAL_TOML);

    let (status, _) = send(
        common::router(Arc::clone(&store), Some("secret")),
        Request::get("/v1/config").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        common::router(Arc::clone(&store), Some("secret")),
        Request::get("/v1/config")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        common::router(Arc::clone(&store), Some("secret")),
        Request::get("/v1/config")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["apps"][0]["id"], "echo");
}

#[tokio::test]
async fn test_status_needs_no_api_key() {
    let app = common::router(common::store_with(common::FULL_TOML), Some("secret"));

    let (status, body) = send(app, Request::get("/v1/status").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["listeners"], 2);
    assert_eq!(body["apps"], 2);
}

#[tokio::test]
async fn test_request_id_is_set() {
    let app = common::router(Arc::new(ConfigStore::empty()), None);

    let response = app
        .oneshot(Request::get("/v1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = common::router(Arc::new(ConfigStore::empty()), None);

    let response = app
        .oneshot(
            Request::get("/v1/config")
                .header("x-request-id", "caller-chosen")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "caller-chosen");
}

#[tokio::test]
async fn test_invalid_deadline_header() {
    let app = common::router(Arc::new(ConfigStore::empty()), None);

    let (status, body) = send(
        app,
        Request::get("/v1/config")
            .header("x-request-deadline-ms", "soon")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("x-request-deadline-ms"));
}

#[tokio::test]
async fn test_generous_deadline_passes() {
    let app = common::router(common::store_with(common::MINIMAL_TOML), None);

    let (status, _) = send(
        app,
        Request::get("/v1/config")
            .header("x-request-deadline-ms", "5000")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_exceeded_deadline_is_gateway_timeout() {
    let store = Arc::new(ConfigStore::empty());
    let app = common::router(Arc::clone(&store), None);

    let mut request =
        post_config(json!({"config": {"format": "toml", "content": common::FULL_TOML}}));
    request
        .headers_mut()
        .insert("x-request-deadline-ms", "0".parse().unwrap());
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "deadline exceeded");

    // The abandoned decode may still finish; either way the store holds a whole config.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let full = config_plane::config::decode_document(&config_plane::RawDocument::toml(
        common::FULL_TOML,
    ))
    .unwrap();
    let held = store.get();
    assert!(held == full || held == config_plane::CanonicalConfig::default());
}
