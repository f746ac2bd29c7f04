//! Shared test helpers for reporter integration tests
//!
//! Provides wiremock-based mock tracking-service setup plus helpers for
//! building settings pointed at a mock server and inspecting captured
//! request bodies.

use std::io::Read;

use faultline_core::config::keys;
use faultline_core::{RequestSnapshot, Settings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";

/// Settings with the production endpoint pointed at a mock server.
pub fn production_settings(server: &MockServer) -> Settings {
    Settings::new()
        .with(keys::API_KEY, TEST_API_KEY)
        .with(keys::API_URL, format!("{}/api/errors", server.uri()))
}

/// Start a mock server accepting every POST to `/api/errors`.
pub async fn accepting_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/errors"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    server
}

/// A representative request snapshot for capture tests.
pub fn checkout_snapshot() -> RequestSnapshot {
    RequestSnapshot::builder("POST", "https://shop.example/checkout")
        .remote_ip("203.0.113.7")
        .action("checkout")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Cookie", "session=abc123; theme=dark")
        .form_field("password", "hunter2")
        .form_field("quantity", "2")
        .session_value("user_id", 91)
        .build()
}

/// Inflate a deflate-compressed request body.
pub fn inflate(body: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::read::ZlibDecoder::new(body);
    let mut output = Vec::new();
    decoder.read_to_end(&mut output).expect("valid zlib body");
    output
}
