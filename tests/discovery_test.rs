//! Collection discovery against a wiremock backend.

mod common;

use alphabase_console::discovery::{CollectionDiscovery, SkipReason};
use alphabase_console::error::ConsoleError;
use alphabase_console::session::Session;
use common::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Every unmatched list probe answers with an empty collection.
async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "items": {}
        })))
        .with_priority(10)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_discover_with_no_data_is_empty() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_collections(&server, &[]).await;
    mount_empty_fallback(&server).await;

    let api = api_for(&server);
    let session = api.login("alice", "pw").await.unwrap();
    let discovery = CollectionDiscovery::new(api, seeds(&["sensors", "todos", "presses"]));

    let snapshot = discovery.discover_all(&session).await.unwrap();
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_reported_and_seeded_collections_merge() {
    let server = MockServer::start().await;
    mount_collections(&server, &["sensors"]).await;
    mount_list(
        &server,
        "sensors",
        json!({"s1": {"temp": 20}, "s2": {"temp": 21}, "s3": {"temp": 22}}),
    )
    .await;
    mount_list(&server, "todos", json!({})).await;

    let discovery = CollectionDiscovery::new(api_for(&server), seeds(&["todos"]));
    let snapshot = discovery.discover_all(&test_session()).await.unwrap();

    assert_eq!(snapshot.names(), vec!["sensors"]);
    assert_eq!(snapshot.get("sensors").unwrap().len(), 3);
    assert!(!snapshot.contains("todos"));
}

#[tokio::test]
async fn test_failed_probes_are_skipped() {
    let server = MockServer::start().await;
    mount_collections(&server, &["sensors", "secrets", "flaky"]).await;
    mount_list(&server, "sensors", json!({"s1": 1})).await;
    mount_list_status(&server, "secrets", 403, "Access denied").await;
    mount_list_status(&server, "flaky", 500, "boom").await;
    mount_list_status(&server, "missing", 404, "Collection not found").await;

    let discovery = CollectionDiscovery::new(api_for(&server), seeds(&["missing"]));
    let report = discovery.discover(&test_session()).await.unwrap();

    assert_eq!(report.collections.names(), vec!["sensors"]);
    assert_eq!(report.probed(), 4);
    assert_eq!(report.skipped.get("secrets"), Some(&SkipReason::Denied));
    assert_eq!(
        report.skipped.get("flaky"),
        Some(&SkipReason::Failed { status: 500 })
    );
    assert_eq!(report.skipped.get("missing"), Some(&SkipReason::NotFound));
    assert_eq!(report.denied(), vec!["secrets"]);
    assert_eq!(report.server_names, vec!["sensors", "secrets", "flaky"]);
}

#[tokio::test]
async fn test_missing_collection_listing_falls_back_to_seeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/collections"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .mount(&server)
        .await;
    mount_list(&server, "presses", json!({"p1": {"timestamp": 1}})).await;

    let discovery = CollectionDiscovery::new(api_for(&server), seeds(&["presses"]));
    let snapshot = discovery.discover_all(&test_session()).await.unwrap();
    assert_eq!(snapshot.names(), vec!["presses"]);
}

#[tokio::test]
async fn test_repeated_passes_are_identical() {
    let server = MockServer::start().await;
    mount_collections(&server, &["sensors", "devices"]).await;
    mount_list(&server, "sensors", json!({"s1": 1, "s2": 2})).await;
    mount_list(&server, "devices", json!({"d1": {"online": true}})).await;
    mount_empty_fallback(&server).await;

    let discovery = CollectionDiscovery::new(api_for(&server), seeds(&["todos", "sensors"]));
    let session = test_session();
    let first = discovery.discover_all(&session).await.unwrap();
    let second = discovery.discover_all(&session).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total_items(), 3);
}

#[tokio::test]
async fn test_rejected_credential_fails_the_pass() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;

    let discovery = CollectionDiscovery::new(api_for(&server), seeds(&["sensors", "todos"]));
    let err = discovery.discover_all(&test_session()).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Unauthenticated));
}

#[tokio::test]
async fn test_unreachable_backend_fails_the_pass() {
    let discovery = CollectionDiscovery::new(unreachable_api(), seeds(&["sensors", "todos"]));
    let err = discovery.discover_all(&test_session()).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_signed_out_discovery_is_refused() {
    let server = MockServer::start().await;
    let discovery = CollectionDiscovery::new(api_for(&server), seeds(&["sensors"]));
    assert!(matches!(
        discovery.discover_all(&Session::anonymous()).await,
        Err(ConsoleError::Unauthenticated)
    ));
}
