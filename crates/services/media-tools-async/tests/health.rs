use media_tools_async::types::ApiHealth;
use media_tools_async::{Client, MediaToolsConfig, MediaToolsError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base: &str) -> Client<MediaToolsConfig> {
    Client::with_config(MediaToolsConfig::new().with_api_base(base).without_api_key())
}

#[tokio::test]
async fn ok_is_healthy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let health = client_for(&server.uri()).health().check().await.unwrap();
    assert_eq!(health, ApiHealth::Healthy);
    assert_eq!(health.to_string(), "ok");
}

#[tokio::test]
async fn non_200_is_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let health = client_for(&server.uri()).health().check().await.unwrap();
    assert_eq!(health, ApiHealth::Unhealthy);
    assert!(!health.is_ok());
}

#[tokio::test]
async fn unreachable_is_unhealthy() {
    let health = client_for("http://127.0.0.1:1").health().check().await.unwrap();
    assert_eq!(health, ApiHealth::Unhealthy);
}

#[tokio::test]
async fn missing_base_is_error() {
    let err = client_for("").health().check().await.unwrap_err();
    assert!(matches!(err, MediaToolsError::Config(_)));
}
