use ambient_core::LlmConfig;
use ambient_llm::VisionClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn health_succeeds_when_models_endpoint_is_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = VisionClient::new(&config);

    client.health().await.unwrap();
}

#[tokio::test]
async fn health_surfaces_non_2xx_as_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = VisionClient::new(&config);

    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ambient_core::error::LlmError::Status { status: 503, .. }));
}

#[tokio::test]
async fn analyze_parses_well_formed_vision_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"summary\":\"editing code\",\"context\":\"editor\",\"activities\":[\"coding\"],\"key_elements\":[\"vscode\"],\"user_intent\":\"build a feature\"}"
                }
            }]
        })))
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = VisionClient::new(&config);

    let result = client.analyze(&[0xFF, 0xD8, 0xFF], "").await.unwrap();
    assert_eq!(result.summary, "editing code");
    assert_eq!(result.context, "editor");
    assert_eq!(result.user_intent, "build a feature");
}

#[tokio::test]
async fn analyze_surfaces_non_2xx_as_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = VisionClient::new(&config);

    let err = client.analyze(&[1, 2, 3], "").await.unwrap_err();
    assert!(matches!(err, ambient_core::error::LlmError::Status { status: 503, .. }));
}
