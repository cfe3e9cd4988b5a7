//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, plus one run
//! against a bound listener with the notification dispatcher attached.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use data_registry::{
    cache::MemoryCache,
    create_router,
    models::Notification,
    notify::{spawn_dispatcher, MemoryQueue, Notifier},
    store::MemoryStore,
    AppState, RecordService,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

fn create_test_app() -> TestApp {
    create_test_app_with_ttl(60)
}

fn create_test_app_with_ttl(list_ttl: u64) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let (notifier, _events) = Notifier::channel(64);
    let service = RecordService::new(store.clone(), Arc::new(MemoryCache::new()), notifier)
        .with_list_ttl(list_ttl);
    TestApp {
        router: create_router(AppState::new(service)),
        store,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Register Endpoint Tests ==

#[tokio::test]
async fn test_register_endpoint_success() {
    let app = create_test_app();

    let (status, json) = register(&app.router, r#"{"name":"a","value":"1"}"#).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "a");
    assert_eq!(json["value"], "1");
    assert!(!json["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_endpoint_missing_fields() {
    let app = create_test_app();

    for body in [r#"{"name":"a"}"#, r#"{"value":"1"}"#, r#"{"name":"","value":"1"}"#, "{}"] {
        let (status, json) = register(&app.router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json, json!({"error": "Name and value are required"}));
    }

    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_register_endpoint_invalid_json() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("content-type", "application/json")
                .body(Body::from("not valid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].is_string());
    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_register_endpoint_non_string_fields() {
    let app = create_test_app();

    for body in [r#"{"name":1,"value":"x"}"#, r#"{"name":"a","value":{"k":"v"}}"#, "[]"] {
        let (status, json) = register(&app.router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert!(json["error"].is_string(), "body: {}", body);
    }

    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_register_endpoint_store_down() {
    let app = create_test_app();
    app.store.set_offline(true);

    let (status, json) = register(&app.router, r#"{"name":"a","value":"1"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({"error": "Failed to register data"}));
}

// == Data Endpoint Tests ==

#[tokio::test]
async fn test_list_endpoint_empty() {
    let app = create_test_app();

    let (status, json) = send(&app.router, "GET", "/data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_list_endpoint_store_down() {
    let app = create_test_app();
    app.store.set_offline(true);

    let (status, json) = send(&app.router, "GET", "/data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({"error": "Failed to retrieve data"}));
}

#[tokio::test]
async fn test_list_endpoint_served_from_cache() {
    let app = create_test_app();
    register(&app.router, r#"{"name":"a","value":"1"}"#).await;

    let (_, first) = send(&app.router, "GET", "/data").await;
    let (_, second) = send(&app.router, "GET", "/data").await;

    assert_eq!(first, second);
    assert_eq!(app.store.read_calls(), 1);
}

#[tokio::test]
async fn test_list_endpoint_refreshes_after_ttl() {
    let app = create_test_app_with_ttl(1);
    send(&app.router, "GET", "/data").await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    send(&app.router, "GET", "/data").await;
    assert_eq!(app.store.read_calls(), 2);
}

#[tokio::test]
async fn test_get_endpoint() {
    let app = create_test_app();
    let (_, created) = register(&app.router, r#"{"name":"a","value":"1"}"#).await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app.router, "GET", &format!("/data/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);

    let (status, json) = send(&app.router, "GET", "/data/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "Data not found"}));
}

#[tokio::test]
async fn test_remove_endpoint_store_down() {
    let app = create_test_app();
    let (_, created) = register(&app.router, r#"{"name":"a","value":"1"}"#).await;
    app.store.set_offline(true);

    let uri = format!("/data/{}", created["id"].as_str().unwrap());
    let (status, json) = send(&app.router, "DELETE", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({"error": "Failed to remove data"}));
}

// == Scenario ==

#[tokio::test]
async fn test_register_list_remove_scenario() {
    let app = create_test_app();

    let (status, x) = register(&app.router, r#"{"name":"a","value":"1"}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, y) = register(&app.router, r#"{"name":"b","value":"2"}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    let x_id = x["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&app.router, "GET", "/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([x.clone(), y.clone()]));

    let (status, removed) = send(&app.router, "DELETE", &format!("/data/{}", x_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed, json!({"message": "Data removed", "id": x_id.clone()}));

    let (status, listed) = send(&app.router, "GET", "/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([y]));

    let (status, json) = send(&app.router, "DELETE", &format!("/data/{}", x_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "Data not found"}));
}

// == Stats and Health ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();
    send(&app.router, "GET", "/data").await;
    send(&app.router, "GET", "/data").await;

    let (status, json) = send(&app.router, "GET", "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app.router, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Live Server ==

#[tokio::test]
async fn test_live_server_publishes_notifications() {
    let queue = Arc::new(MemoryQueue::new(100));
    let (notifier, dispatcher) = spawn_dispatcher(queue.clone(), "data-queue", 16);
    let service = RecordService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        notifier,
    );
    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let created: Value = client
        .post(format!("{}/register", base))
        .json(&json!({"name": "a", "value": "1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let listed = client.get(format!("{}/data", base)).send().await.unwrap();
    assert_eq!(listed.status(), reqwest::StatusCode::OK);

    let removed = client
        .delete(format!("{}/data/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), reqwest::StatusCode::OK);

    drop(client);

    // Stopping the server drops the last notifier and lets the dispatcher drain
    shutdown_tx.send(()).unwrap();
    server.await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .unwrap()
        .unwrap();

    let actions: Vec<Notification> = queue
        .messages()
        .await
        .iter()
        .map(|m| m.notification().unwrap())
        .collect();
    let record: data_registry::models::Record = serde_json::from_value(created).unwrap();
    assert_eq!(
        actions,
        vec![
            Notification::Register(record.clone()),
            Notification::Retrieve(vec![record]),
            Notification::Remove(id),
        ]
    );
}
