use std::sync::Arc;

use ambient_agent::{http, AppState, Orchestrator};
use ambient_capture::CaptureSource;
use ambient_core::capability::NullScreenGrabber;
use ambient_core::Config;
use ambient_enhance::Enhancer;
use ambient_llm::{ChatClient, VisionClient};
use ambient_store::MemoryStoreClient;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let mut config = Config::default();
    config.memory.base_url = "http://127.0.0.1:0".to_string();
    config.extension.port = 7345;

    let capture = CaptureSource::new(Arc::new(NullScreenGrabber), config.capture.clone());
    let vision = VisionClient::new(&config.llm);
    let chat = ChatClient::new(&config.llm);
    let store = MemoryStoreClient::new(&config.memory);
    let enhancer = Enhancer::new();

    let state = Arc::new(AppState {
        config,
        capture,
        vision,
        chat,
        store,
        enhancer,
        last_state: RwLock::new(None),
    });

    let orchestrator = Arc::new(Orchestrator::new(state.clone(), CancellationToken::new()));
    http::router(state, orchestrator)
}

#[tokio::test]
async fn health_returns_ok_status() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn enhance_rejects_empty_prompt_with_400() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/enhance")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"prompt":""}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn enhance_surfaces_memory_store_failure_as_500() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/enhance")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"prompt":"what was I doing"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn search_requires_query_parameter() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/memories/search")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn disallowed_origin_receives_no_cors_headers() {
    let app = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "https://evil.example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn chrome_extension_origin_is_allowed() {
    let app = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "chrome-extension://abcdefghijklmnop")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_some());
}

#[tokio::test]
async fn status_endpoint_reports_running() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
