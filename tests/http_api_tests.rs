//! HTTP-level tests against the full router
//!
//! Exercises the multipart import endpoint, the audit history listing, the
//! blob download passthrough and the SSE handshake, all through
//! `tower::ServiceExt::oneshot` without binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use kinocat::blob::{BlobStore, FsBlobStore};
use kinocat::sse::SubscriberRegistry;
use kinocat::{build_router, AppState};

const BOUNDARY: &str = "kinocat-test-boundary";

async fn test_state(dir: &TempDir) -> AppState {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    kinocat::db::init_tables(&pool).await.unwrap();

    let blob: Arc<dyn BlobStore> =
        Arc::new(FsBlobStore::new(dir.path().join("blobs")).await.unwrap());
    let registry = SubscriberRegistry::new(Duration::from_secs(3600));
    AppState::new(pool, blob, registry)
}

fn multipart_body(file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn import_request(uri: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(file_name, content)))
        .unwrap()
}

fn valid_movie(name: &str) -> Value {
    json!({
        "name": name,
        "coordinates": {"x": 0.5, "y": 1},
        "budget": 100.0,
        "totalBoxOffice": 200,
        "mpaaRating": "PG_13",
        "director": {"name": "Val", "eyeColor": "GREEN"},
        "operator": {"name": "Olya", "eyeColor": "BLACK"},
        "goldenPalmCount": 2,
        "tagline": "t"
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn import_then_history_then_download() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_state(&dir).await);

    let content = serde_json::to_vec(&json!([valid_movie("Ivan")])).unwrap();
    let response = app
        .clone()
        .oneshot(import_request("/api/import", "movies.json", &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["imported"], 1);
    let object_key = body["objectKey"].as_str().unwrap().to_string();

    // history lists the committed attempt
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/import/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = json_body(response).await;
    assert_eq!(history[0]["status"], "SUCCESS");
    assert_eq!(history[0]["importedCount"], 1);
    assert_eq!(history[0]["objectKey"], object_key.as_str());

    // download round-trips the original bytes
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/import/file/{object_key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), content.as_slice());
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_state(&dir).await);

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validation_failure_returns_422_with_violations() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_state(&dir).await);

    let mut invalid = valid_movie("X");
    invalid["budget"] = json!(-1.0);
    let content = serde_json::to_vec(&json!([invalid])).unwrap();

    let response = app
        .oneshot(import_request("/api/import", "movies.json", &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let violations = body["error"]["violations"].as_array().unwrap();
    assert_eq!(violations[0]["index"], 0);
    assert_eq!(violations[0]["field"], "budget");
}

#[tokio::test]
async fn simulate_failure_flag_rolls_the_import_back() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_state(&dir).await);

    let content = serde_json::to_vec(&json!([valid_movie("Y")])).unwrap();
    let response = app
        .clone()
        .oneshot(import_request(
            "/api/import?simulate_failure=true",
            "movies.json",
            &content,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/import/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let history = json_body(response).await;
    assert_eq!(history[0]["status"], "FAILURE");
    assert_eq!(history[0]["importedCount"], Value::Null);
}

#[tokio::test]
async fn download_of_unknown_key_is_404() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_state(&dir).await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/import/file/no-such-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscribe_opens_an_event_stream_with_connected_ack() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let registry = state.registry.clone();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sse/subscribe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    // first frame is the connected acknowledgment, sent before joining
    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().ok().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: connected"), "got frame: {text}");
    assert_eq!(registry.len(), 1);

    // dropping the stream removes the subscriber
    drop(body);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.len(), 0);
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_state(&dir).await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "kinocat");
}
