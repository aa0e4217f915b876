use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use year_review_backend::{
    config::Config, create_router, utils::telegram_auth::sign_init_data, AppState,
};

const TOKEN: &str = "123456:TEST-token";

// Values are signed exactly as sent, including the percent-encoding of `user`.
const SIGNED_BLOB: &str = "query_id=AAF9tXAJ&user=%7B%22id%22%3A42%2C%22first_name%22%3A%22Ann%22%7D&auth_date=1700000000&hash=017402546450a91b9aaa54d7286fd32e605dc6f99f2142ff6e1e8aebc71e6e14";

fn setup_app(public_rps: u32) -> Router {
    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        telegram_bot_token: TOKEN.to_string(),
        public_rps,
        max_body_bytes: 4 * 1024,
    };
    create_router(AppState::from_config(&config), &config)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

fn init_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/init")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn valid_init_data_is_accepted() {
    let app = setup_app(100);

    let (status, body) = send(&app, init_request(json!({ "initData": SIGNED_BLOB }).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["user_data"]["query_id"], "AAF9tXAJ");
    assert_eq!(body["user_data"]["auth_date"], "1700000000");
    assert_eq!(
        body["user_data"]["user"],
        "%7B%22id%22%3A42%2C%22first_name%22%3A%22Ann%22%7D"
    );
    assert!(body["user_data"].get("hash").is_none());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn freshly_signed_blob_is_accepted_without_user() {
    let app = setup_app(100);
    let blob = sign_init_data([("auth_date", "1700000000"), ("query_id", "q1")], TOKEN).unwrap();

    let (status, body) = send(&app, init_request(json!({ "initData": blob }).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["user_id"].is_null());
    assert_eq!(body["user_data"]["query_id"], "q1");
}

#[tokio::test]
async fn tampered_init_data_is_rejected_without_echo() {
    let app = setup_app(100);
    let tampered = SIGNED_BLOB.replace("auth_date=1700000000", "auth_date=1700000001");

    let (status, body) = send(&app, init_request(json!({ "initData": tampered }).to_string())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid signature" }));
    assert!(!body.to_string().contains("AAF9tXAJ"));
}

#[tokio::test]
async fn blob_signed_with_another_token_is_rejected() {
    let app = setup_app(100);
    let blob = sign_init_data([("query_id", "q1")], "999:other-token").unwrap();

    let (status, _) = send(&app, init_request(json!({ "initData": blob }).to_string())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_or_missing_init_data_is_unauthorized() {
    let app = setup_app(100);

    let (status, _) = send(&app, init_request(json!({ "initData": "" }).to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, init_request(json!({}).to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, init_request(json!({ "initData": "hash" }).to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let app = setup_app(100);

    let (status, body) = send(&app, init_request("{not json".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let req = Request::builder()
        .method("POST")
        .uri("/api/init")
        .body(Body::from(json!({ "initData": SIGNED_BLOB }).to_string()))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = setup_app(100);
    let huge = "a".repeat(8 * 1024);

    let (status, _) = send(&app, init_request(json!({ "initData": huge }).to_string())).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_reports_service() {
    let app = setup_app(100);
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "Year Review Mini App");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn init_endpoint_is_rate_limited() {
    let app = setup_app(1);

    let (status, _) = send(&app, init_request(json!({ "initData": SIGNED_BLOB }).to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(init_request(json!({ "initData": SIGNED_BLOB }).to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers()[header::RETRY_AFTER], "1");

    let health = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, health).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let app = setup_app(100);
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/init")
        .header(header::ORIGIN, "https://web.telegram.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
