use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use secure_link::auth::hash_api_key;
use secure_link::{create_router, AppState, Codec, LinkEngine, ManualClock, MemoryLinkStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: ManualClock,
}

impl TestApp {
    fn new() -> Self {
        Self::with_state(|state| state)
    }

    fn with_state(configure: impl FnOnce(AppState) -> AppState) -> Self {
        let clock = ManualClock::new(Utc::now());
        let engine = LinkEngine::with_clock(
            Arc::new(MemoryLinkStore::new()),
            Codec::new("api-test-key"),
            Arc::new(clock.clone()),
        );
        let state = configure(AppState::new(Arc::new(engine)));
        Self {
            router: create_router(state),
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn create(&self, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post("/api/create-secure-link")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

#[tokio::test]
async fn create_and_redeem_scenario() {
    let app = TestApp::new();

    let (status, created) = app
        .create(json!({ "url": "https://example.com/v", "expiryHours": 1 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["message"], "Secure link created successfully");
    assert!(created["expiresAt"].is_string());
    let token = created["token"].as_str().unwrap().to_string();
    assert!(token.starts_with("sv_"));

    let (status, body) = app.get(&format!("/api/get-video/{token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://example.com/v");
    assert_eq!(body["accessCount"], 1);

    let (status, body) = app.get(&format!("/api/get-video?secureId={token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accessCount"], 2);

    app.clock.advance(Duration::minutes(61));
    let (status, body) = app.get(&format!("/api/get-video/{token}")).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "Secure link has expired");

    let (status, _) = app.get(&format!("/api/get-video/{token}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_without_expiry() {
    let app = TestApp::new();

    let (status, created) = app
        .create(json!({ "url": "https://example.com/v", "expiryHours": 0 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(created["expiresAt"].is_null());
}

#[tokio::test]
async fn create_rejects_bad_urls() {
    let app = TestApp::new();

    let (status, body) = app.create(json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");

    let (status, body) = app.create(json!({ "url": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");

    let (status, body) = app.create(json!({ "url": "not a url" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid URL format");
}

#[tokio::test]
async fn create_answers_unusable_bodies_with_json_400() {
    let app = TestApp::new();

    let (status, body) = app.create(json!({ "url": 123 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid URL format");

    let (status, body) = app
        .create(json!({ "url": "https://example.com/v", "expiryHours": "2" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    let (status, body) = app
        .send(
            Request::post("/api/create-secure-link")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Malformed JSON body");

    let (status, body) = app
        .send(
            Request::post("/api/create-secure-link")
                .body(Body::from(r#"{"url":"https://example.com/v"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected a JSON request body");

    let (_, list) = app.get("/api/admin/links").await;
    assert_eq!(list["totalCount"], 0);
}

#[tokio::test]
async fn redeem_errors() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/get-video/not-a-token").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid secure ID format");

    let (status, _) = app.get("/api/get-video").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/get-video/sv_0123456789abcdef_lk5hq0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Secure link not found");
}

#[tokio::test]
async fn stats_delete_and_list() {
    let app = TestApp::new();
    let (_, first) = app.create(json!({ "url": "https://example.com/a" })).await;
    let (_, second) = app
        .create(json!({ "url": "https://example.com/b", "expiryHours": 2 }))
        .await;
    let first = first["token"].as_str().unwrap().to_string();
    let second = second["token"].as_str().unwrap().to_string();

    app.get(&format!("/api/get-video/{first}")).await;

    let (status, stats) = app.get(&format!("/api/stats/{first}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["token"], first.as_str());
    assert_eq!(stats["accessCount"], 1);
    assert_eq!(stats["isExpired"], false);
    assert!(stats["lastAccessedAt"].is_string());
    assert!(stats.get("url").is_none());

    let (status, list) = app.get("/api/admin/links").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["totalCount"], 2);
    assert_eq!(list["links"].as_array().unwrap().len(), 2);
    assert!(!list.to_string().contains("example.com"));

    let (status, body) = app.delete(&format!("/api/delete/{second}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Secure link deleted successfully");

    let (status, _) = app.delete(&format!("/api/delete/{second}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/stats/{second}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get("/api/admin/links").await;
    assert_eq!(list["totalCount"], 1);
}

#[tokio::test]
async fn health() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn preflight_succeeds_without_body() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/create-secure-link")
                .header(header::ORIGIN, "https://client.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn admin_routes_require_key_when_configured() {
    let app = TestApp::with_state(|state| state.with_admin_key_sha3(hash_api_key("letmein")));
    let (status, created) = app.create(json!({ "url": "https://example.com/v" })).await;
    assert_eq!(status, StatusCode::OK);
    let token = created["token"].as_str().unwrap().to_string();

    // redeeming stays open
    let (status, _) = app.get(&format!("/api/get-video/{token}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/admin/links").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Request::get("/api/admin/links")
                .header("x-api-key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, list) = app
        .send(
            Request::get("/api/admin/links")
                .header("x-api-key", "letmein")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["totalCount"], 1);
}
