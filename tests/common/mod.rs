//! Shared fixtures for the integration tests.
//!
//! HTTP-facing tests run against a `wiremock` server; real-time tests use the
//! in-crate `MockTransport` so connection failures can be scripted.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alphabase_console::adapters::mock::{MockTransport, RecordingNotifier};
use alphabase_console::adapters::ReqwestHttpClient;
use alphabase_console::api::ApiClient;
use alphabase_console::config::{DiscoveryConfig, RealtimeConfig};
use alphabase_console::realtime::{ChannelState, RealtimeChannel};
use alphabase_console::session::{BearerToken, Session};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-access-token-12345";
pub const TEST_USER: &str = "alice";

/// Session carrying [`TEST_TOKEN`].
pub fn test_session() -> Session {
    Session::authenticated(BearerToken::new(TEST_TOKEN), TEST_USER)
}

/// `ApiClient` over reqwest, pointed at `server`.
pub fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri(), Arc::new(ReqwestHttpClient::new()))
}

/// Base URL of a local port with no listener.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// `ApiClient` pointed at a port nothing listens on.
pub fn unreachable_api() -> ApiClient {
    ApiClient::new(closed_port_url(), Arc::new(ReqwestHttpClient::new()))
}

/// Discovery settings probing exactly `seeds`.
pub fn seeds(names: &[&str]) -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_seed_collections(names.iter().copied())
        .with_concurrency(4)
}

/// Mount a successful `/auth/login` for any credentials.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TEST_TOKEN,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

/// Mount `/data/collections` reporting `names`.
pub async fn mount_collections(server: &MockServer, names: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/data/collections"))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "collections": names
        })))
        .mount(server)
        .await;
}

/// Mount `/data/list/{name}` returning `items`.
pub async fn mount_list(server: &MockServer, name: &str, items: Value) {
    let count = items.as_object().map_or(0, |m| m.len());
    Mock::given(method("GET"))
        .and(path(format!("/data/list/{}", name)))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "collection": name,
            "count": count,
            "items": items
        })))
        .mount(server)
        .await;
}

/// Mount `/data/list/{name}` answering with `status`.
pub async fn mount_list_status(server: &MockServer, name: &str, status: u16, detail: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/data/list/{}", name)))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "detail": detail })))
        .mount(server)
        .await;
}

/// Fast reconnect policy for tests.
pub fn fast_realtime(attempts: u32) -> RealtimeConfig {
    RealtimeConfig::default()
        .with_max_reconnect_attempts(attempts)
        .with_reconnect_delay(Duration::from_millis(20))
}

/// Channel over a scriptable transport.
pub fn mock_channel(
    transport: &MockTransport,
    realtime: RealtimeConfig,
) -> (RealtimeChannel, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let channel = RealtimeChannel::new(
        "ws://ab.test/ws",
        realtime,
        Arc::new(transport.clone()),
        Arc::new(notifier.clone()),
    );
    (channel, notifier)
}

/// Wait until the channel reports `wanted`.
pub async fn wait_for_state(channel: &RealtimeChannel, wanted: ChannelState) {
    let mut rx = channel.state_receiver();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == wanted))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", wanted))
        .expect("state channel closed");
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}
