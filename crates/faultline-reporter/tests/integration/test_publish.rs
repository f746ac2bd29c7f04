//! Manual publish and self-test integration tests

use faultline_core::config::keys;
use faultline_core::{ExceptionInfo, Settings};
use faultline_reporter::Reporter;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_publish_reports_without_request_context() {
    let server = common::accepting_server().await;

    Reporter::publish(
        common::production_settings(&server),
        ExceptionInfo::new("JobError", "queue worker died"),
    )
    .await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let payload: Value = serde_json::from_slice(&common::inflate(&requests[0].body)).unwrap();
    assert_eq!(payload["exception"]["exception_class"], "JobError");
    assert!(payload["request"].is_null());

    // The environment snapshot is still present: application settings
    // plus the process environment under the os. prefix.
    let env = payload["application_environment"]["env"].as_object().unwrap();
    assert!(env.contains_key("API_KEY"));
    assert!(env.keys().any(|key| key.starts_with("os.")));
}

#[tokio::test]
async fn test_publish_respects_debug_skip() {
    let server = common::accepting_server().await;

    let settings = common::production_settings(&server).with(keys::DEBUG, true);
    Reporter::publish(settings, ExceptionInfo::new("JobError", "boom")).await;

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_selftest_succeeds_against_healthy_endpoint() {
    let server = common::accepting_server().await;

    Reporter::test(common::production_settings(&server))
        .await
        .expect("self-test should succeed");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let payload: Value = serde_json::from_slice(&common::inflate(&requests[0].body)).unwrap();
    assert_eq!(payload["exception"]["exception_class"], "ConfigurationTest");
}

#[tokio::test]
async fn test_selftest_bypasses_debug_skip() {
    let server = common::accepting_server().await;

    // Debug mode with no override URL drops capture events, but the
    // self-test always transmits.
    let settings = common::production_settings(&server).with(keys::DEBUG, true);
    Reporter::test(settings).await.expect("self-test should send");

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_selftest_surfaces_endpoint_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/errors"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = Reporter::test(common::production_settings(&server)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_selftest_surfaces_unreachable_endpoint() {
    let settings = Settings::new()
        .with(keys::API_KEY, common::TEST_API_KEY)
        .with(keys::API_URL, "http://127.0.0.1:9/api/errors");

    let result = Reporter::test(settings).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_selftest_requires_api_key() {
    let result = Reporter::test(Settings::new()).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("API_KEY"));
}
