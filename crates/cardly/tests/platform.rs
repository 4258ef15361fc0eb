use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use cardly::domain::config::ApiConfig;
use cardly::features::{self, cards::Cards, uploads::Uploads};
use cardly::kernel::mail::Mailer;
use cardly::kernel::server::{ApiState, SliceContext};
use cardly_database::Database;
use cardly_event_bus::EventBus;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
const BOUNDARY: &str = "cardly-test-boundary";

async fn platform(name: &str) -> (ApiState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let database = Database::builder()
        .url("mem://")
        .session("platform", name)
        .migrations(cardly::migrations())
        .init()
        .await
        .unwrap();
    let mut config = ApiConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();
    let events = EventBus::new();
    let (mailer, _) = Mailer::memory();
    let ctx = SliceContext { config: config.clone(), database: database.clone(), events: events.clone(), mailer: mailer.clone() };

    let slices = cardly::init(&ctx).await.unwrap();
    assert_eq!(slices.len(), features::ENABLED.len());

    let state = ApiState::builder()
        .config(config)
        .db(database)
        .events(events)
        .mailer(mailer)
        .register_slices(slices)
        .build()
        .unwrap();
    (state, dir)
}

fn app(state: ApiState) -> Router {
    let (router, _) = cardly::router().split_for_parts();
    router.with_state(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn multipart_body(purpose: &str, file: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"purpose\"\r\n\r\n{purpose}\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\n\
         Content-Type: text/plain\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn every_slice_is_registered() {
    let (state, _dir) = platform("slices").await;
    assert_eq!(state.slice_ids().count(), features::ENABLED.len());
    assert!(state.try_get_slice::<Cards>().is_ok());
    assert!(state.try_get_slice::<Uploads>().is_ok());
    assert!(features::is_enabled("nfc"));
    assert!(!features::is_enabled("licensing"));
}

#[tokio::test]
async fn migrations_follow_slice_order() {
    let slices: Vec<&str> = cardly::migrations().iter().map(|m| m.slice).collect();
    let first = |name: &str| slices.iter().position(|s| *s == name).unwrap();
    assert!(first("settings") < first("billing"));
    assert!(first("billing") < first("cards"));
    assert!(first("cards") < first("contacts"));
    assert!(first("experiments") < first("uploads"));
}

#[tokio::test]
async fn openapi_documents_all_slices() {
    let (_, api) = cardly::router().split_for_parts();
    for path in ["/health", "/api/auth/register", "/api/cards", "/api/contacts", "/api/nfc", "/t/{uid}", "/api/uploads", "/files/{id}"] {
        assert!(api.paths.paths.contains_key(path), "missing {path}");
    }
}

#[tokio::test]
async fn health_is_never_cached() {
    let (state, _dir) = platform("health").await;
    let response = app(state).oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CACHE_CONTROL].to_str().unwrap().contains("no-store"));
}

#[tokio::test]
async fn register_create_card_and_upload_over_http() {
    let (state, _dir) = platform("flow").await;
    let app = app(state);

    let register = json!({ "email": "ada@example.com", "password": "lovelace1815", "displayName": "Ada" });
    let (status, body) = send(&app, json_request("POST", "/api/auth/register", None, &register)).await;
    assert_eq!(status, StatusCode::CREATED);
    let auth: Value = serde_json::from_slice(&body).unwrap();
    let token = auth["accessToken"].as_str().unwrap().to_owned();

    let (status, _) = send(&app, json_request("POST", "/api/cards", None, &json!({ "slug": "ada", "title": "Ada" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send(&app, json_request("POST", "/api/cards", Some(&token), &json!({ "slug": "ada", "title": "Ada" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, json_request("GET", "/api/cards", Some(&token), &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap().as_array().unwrap().len(), 1);

    let upload = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body("avatar", PNG)))
        .unwrap();
    let (status, body) = send(&app, upload).await;
    assert_eq!(status, StatusCode::CREATED);
    let upload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(upload["contentType"], "image/png");
    assert_eq!(upload["purpose"], "avatar");

    let id = upload["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(Request::builder().uri(format!("/files/{id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=31536000, immutable");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), PNG);

    let bad = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body("avatar", b"GIF? no, plain text")))
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}
