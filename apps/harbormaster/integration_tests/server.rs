use harbormaster::routes::api_routes;

use coord_core::identity::Identity;
use coord_core::lockstore::LockStore;
use coord_core::orchestrator::Coordinator;
use coord_core::probe::ProbeClient;
use coord_core::{API_SERVER_BASE_URL, API_SERVER_HOSTNAME, APP_NAME};

use models::CoordinationScope;

use std::sync::Arc;

use serde_json::Value;
use serial_test::serial;
use tempfile::TempDir;
use tokio::net::TcpListener;

// ============================================================================
// Integration tests for the binary's real wiring
// The same route factory and detected identity main() uses, driven through
// a real coordinator onto a real socket
// ============================================================================

async fn free_port() -> u16 {
    let listener = TcpListener::bind((API_SERVER_HOSTNAME, 0))
        .await
        .expect("ephemeral bind should succeed");
    let port = listener
        .local_addr()
        .expect("bound socket has an address")
        .port();
    drop(listener);
    port
}

async fn ensure_app_server(data_dir: &TempDir, mode: CoordinationScope) -> u16 {
    let identity = Identity::detect(APP_NAME, "1");
    let locks = LockStore::new(data_dir.path(), &identity);
    let coordinator = Coordinator::new(identity, locks, ProbeClient::new(), Arc::new(api_routes));

    let handle = coordinator
        .ensure_server(free_port().await, API_SERVER_HOSTNAME, mode)
        .await
        .expect("ensure should launch the app server");
    handle.port
}

async fn get_json(port: u16, path: &str) -> (u16, Value) {
    let response = reqwest::get(format!("{API_SERVER_BASE_URL}:{port}{path}"))
        .await
        .expect("request should reach the app server");
    let status = response.status().as_u16();
    let body = response.json().await.expect("body should be JSON");
    (status, body)
}

/// **VALUE**: Verifies the binary's route factory serves beside the boundary.
///
/// **WHY THIS MATTERS**: main() hands `api_routes` to the coordinator and
/// trusts the merge. This is the one place that proves the business route,
/// the liveness route, and the identity route all answer on one socket.
///
/// **BUG THIS CATCHES**: Would catch the factory claiming a boundary path
/// or installing its own fallback, either of which would shadow the
/// endpoints the whole protocol probes.
#[tokio::test]
#[serial]
async fn given_app_server_when_requesting_status_then_launch_metadata_served() {
    // GIVEN: A server ensured exactly the way main() does it
    let data_dir = TempDir::new().unwrap();
    let port = ensure_app_server(&data_dir, CoordinationScope::Shared).await;

    // WHEN: Hitting the business route
    let (status, body) = get_json(port, "/api/status").await;

    // THEN: Launch metadata flowed from the coordinator into the factory
    assert_eq!(status, 200);
    assert_eq!(body["app"], serde_json::json!(APP_NAME));
    assert_eq!(body["scope"], serde_json::json!("shared"));
    assert!(
        body["startedAt"].as_str().is_some(),
        "a launched server should report its start time"
    );

    // AND: The boundary routes answer on the same socket
    let (status, body) = get_json(port, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], serde_json::json!(true));

    let (status, body) = get_json(port, "/whoami").await;
    assert_eq!(status, 200);
    let signature = body["appSignature"].as_str().unwrap_or_default();
    assert!(
        signature.starts_with("harbormaster-"),
        "detected identity should flow through to /whoami, got {signature}"
    );
}

/// **VALUE**: Verifies the configured scope flows through to the routes.
#[tokio::test]
#[serial]
async fn given_isolated_scope_when_requesting_status_then_scope_reported() {
    let data_dir = TempDir::new().unwrap();
    let port = ensure_app_server(&data_dir, CoordinationScope::Isolated).await;

    let (status, body) = get_json(port, "/api/status").await;

    assert_eq!(status, 200);
    assert_eq!(body["scope"], serde_json::json!("isolated"));
}
