//! Test helper utilities for proxy-probe integration tests
//!
//! A `wiremock::MockServer` stands in for the proxy. These helpers build a
//! client pointed at it and mount the canned endpoint responses most tests
//! need.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use proxy_probe::{ProxyClient, ProxyConfig};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ADMIN_KEY: &str = "sk-1234";
pub const GENERATED_KEY: &str = "sk-generated-key";
pub const USER_KEY: &str = "sk-new-user-key";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("proxy_probe=debug")
        .with_test_writer()
        .try_init();
}

pub fn bearer(key: &str) -> String {
    format!("Bearer {key}")
}

/// Defaults pointed at the mock server, with a short timeout
pub fn create_test_config(server: &MockServer) -> ProxyConfig {
    ProxyConfig {
        request_timeout: Duration::from_secs(5),
        ..ProxyConfig::for_base_url(server.uri())
    }
}

pub fn create_test_client(server: &MockServer) -> ProxyClient {
    init_tracing();
    ProxyClient::new(create_test_config(server)).unwrap()
}

/// Mount `/key/generate` and `/user/new`, each issuing a fixed key to the admin
pub async fn mount_key_issuance(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/key/generate"))
        .and(header("authorization", bearer(ADMIN_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(issued_key_body(GENERATED_KEY)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/user/new"))
        .and(header("authorization", bearer(ADMIN_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(issued_key_body(USER_KEY)))
        .mount(server)
        .await;
}

pub fn issued_key_body(key: &str) -> Value {
    json!({
        "key": key,
        "expires": null,
        "user_id": "default_user_id"
    })
}

pub fn chat_response() -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello! How can I help?"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 19, "completion_tokens": 7, "total_tokens": 26}
    })
}

pub fn completion_response() -> Value {
    json!({
        "id": "cmpl-123",
        "object": "text_completion",
        "created": 1_700_000_000u64,
        "model": "gpt-4",
        "choices": [{"text": "This is a test", "index": 0, "finish_reason": "length"}],
        "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
    })
}

pub fn embedding_response() -> Value {
    json!({
        "object": "list",
        "data": [{"object": "embedding", "index": 0, "embedding": [0.0023, -0.0093, 0.0157]}],
        "model": "text-embedding-ada-002",
        "usage": {"prompt_tokens": 2, "total_tokens": 2}
    })
}

pub fn image_response() -> Value {
    json!({
        "created": 1_700_000_000u64,
        "data": [{"url": "https://images.example.com/otter.png"}]
    })
}

/// Body the proxy returns when it cannot reach the upstream image provider
pub fn upstream_connection_error_body() -> Value {
    json!({
        "error": {
            "message": "OpenAIException - Connection error.",
            "type": null,
            "code": 500
        }
    })
}
