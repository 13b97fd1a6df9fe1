use coord_core::identity::Identity;
use coord_core::probe::ProbeClient;
use coord_core::server::app::{ServerMeta, build_app};
use coord_core::server::launcher::{ListeningServer, listen};
use coord_core::{API_SERVER_BASE_URL, API_SERVER_HOSTNAME};

use models::{AppSignature, CoordinationScope};

use axum::Router;
use axum::response::Json;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;

// ============================================================================
// End-to-end tests for the assembled HTTP application
// A real server on a real socket, hit with a real HTTP client
// ============================================================================

const STARTED_AT: &str = "2026-08-23T08:00:00Z";

fn synthetic_identity() -> Identity {
    Identity::new(AppSignature::new("testapp", "deadbeef"), "9")
}

async fn echo() -> Json<Value> {
    Json(json!({ "echo": true }))
}

async fn panicking() -> Json<Value> {
    panic!("boom")
}

fn demo_routes(_meta: &ServerMeta) -> Router {
    Router::new()
        .route("/api/echo", get(echo))
        .route("/api/panic", get(panicking))
}

async fn start_test_server() -> ListeningServer {
    let identity = synthetic_identity();
    let meta = ServerMeta {
        started_at: Some(STARTED_AT.to_string()),
        mode: CoordinationScope::Shared,
    };
    let app = build_app(&identity, &meta, &demo_routes, false);

    listen(app, 0, API_SERVER_HOSTNAME)
        .await
        .expect("test server should bind an ephemeral port")
}

async fn get_json(port: u16, path: &str) -> (u16, Value) {
    let response = reqwest::get(format!("{API_SERVER_BASE_URL}:{port}{path}"))
        .await
        .expect("request should reach the test server");
    let status = response.status().as_u16();
    let body = response.json().await.expect("body should be JSON");
    (status, body)
}

// ----------------------------------------------------------------------------
// Boundary endpoints
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies `/health` reports liveness with the serving pid.
#[tokio::test]
async fn given_running_server_when_probing_health_then_ok_with_own_pid() {
    // GIVEN: A freshly launched server
    let server = start_test_server().await;

    // WHEN
    let (status, body) = get_json(server.port(), "/health").await;

    // THEN: ok, pid of this process, and a wall-clock timestamp
    assert_eq!(status, 200);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["pid"].as_u64(), Some(u64::from(std::process::id())));
    assert!(body["ts"].as_u64().unwrap_or(0) > 0);

    server.stop().await;
}

/// **VALUE**: Verifies `/whoami` echoes the full launch identity.
///
/// **WHY THIS MATTERS**: `/whoami` is the wire contract the whole reuse
/// decision rests on. A renamed field here silently turns every probe
/// into "foreign server" and kills reuse across the board.
///
/// **BUG THIS CATCHES**: Would catch a serde rename that breaks the
/// camelCase field names (`appSignature`, `apiVersion`, `startedAt`).
#[tokio::test]
async fn given_running_server_when_asking_whoami_then_identity_echoed() {
    // GIVEN
    let server = start_test_server().await;

    // WHEN
    let (status, body) = get_json(server.port(), "/whoami").await;

    // THEN: Every identity claim matches what the server was launched with
    assert_eq!(status, 200);
    assert_eq!(body["pid"].as_u64(), Some(u64::from(std::process::id())));
    assert_eq!(body["appSignature"], json!("testapp-deadbeef"));
    assert_eq!(body["apiVersion"], json!("9"));
    assert_eq!(body["startedAt"], json!(STARTED_AT));
    assert_eq!(body["mode"], json!("shared"));

    server.stop().await;
}

/// **VALUE**: Verifies the warmup endpoint answers without state.
#[tokio::test]
async fn given_running_server_when_probing_warmup_then_ok() {
    let server = start_test_server().await;

    let (status, body) = get_json(server.port(), "/api/healthz").await;

    assert_eq!(status, 200);
    assert_eq!(body["ok"], json!(true));
    assert!(body["ts"].as_u64().unwrap_or(0) > 0);

    server.stop().await;
}

/// **VALUE**: Verifies the prober and the server agree on wire shapes.
///
/// **WHY THIS MATTERS**: The probe tests elsewhere run against mocks that
/// encode our ASSUMPTIONS about the payloads. This one closes the loop
/// against the real server, so a drift between the two sides cannot hide
/// behind matching mocks.
#[tokio::test]
async fn given_real_server_when_probing_with_client_then_alive_and_identified() {
    // GIVEN: A real server and the real probe client
    let server = start_test_server().await;
    let probe = ProbeClient::new();

    // WHEN / THEN: Liveness and identity both round-trip
    assert!(probe.is_alive(server.port(), API_SERVER_HOSTNAME).await);

    let who = probe
        .who_am_i(server.port(), API_SERVER_HOSTNAME)
        .await
        .expect("real server should identify itself");
    assert_eq!(who.app_signature, "testapp-deadbeef");
    assert_eq!(who.api_version, "9");
    assert_eq!(who.mode, CoordinationScope::Shared);
    assert_eq!(who.started_at.as_deref(), Some(STARTED_AT));

    server.stop().await;
}

// ----------------------------------------------------------------------------
// Factory routes and failure fences
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies factory routes are mounted beside the boundary.
#[tokio::test]
async fn given_factory_route_when_requesting_then_served() {
    let server = start_test_server().await;

    let (status, body) = get_json(server.port(), "/api/echo").await;

    assert_eq!(status, 200);
    assert_eq!(body["echo"], json!(true));

    server.stop().await;
}

/// **VALUE**: Verifies unmatched paths answer as structured JSON 404s.
#[tokio::test]
async fn given_unmatched_path_when_requesting_then_json_not_found() {
    let server = start_test_server().await;

    let (status, body) = get_json(server.port(), "/definitely/not/mounted").await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], json!("NotFound"));
    assert_eq!(body["path"], json!("/definitely/not/mounted"));

    server.stop().await;
}

/// **VALUE**: Verifies a panicking handler cannot take the server down.
///
/// **WHY THIS MATTERS**: This server may be shared by several host
/// processes that did nothing wrong. One buggy route in one request must
/// cost exactly that request a 500, never the whole coordination point.
///
/// **BUG THIS CATCHES**: Would catch a missing panic fence, where the
/// first handler panic kills the serve task and strands every adopter.
#[tokio::test]
async fn given_panicking_route_when_requesting_then_500_and_server_survives() {
    // GIVEN
    let server = start_test_server().await;

    // WHEN: Hitting the route that panics
    let (status, body) = get_json(server.port(), "/api/panic").await;

    // THEN: The request fails as a structured 500...
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("InternalError"));
    assert_eq!(body["detail"], json!("boom"));

    // ...and the server keeps serving
    let (status, body) = get_json(server.port(), "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], json!(true));

    server.stop().await;
}

// ----------------------------------------------------------------------------
// Bind and shutdown behavior
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies port 0 reports the concrete port the OS picked.
#[tokio::test]
async fn given_port_zero_when_listening_then_concrete_port_reported() {
    let server = start_test_server().await;

    assert_ne!(server.port(), 0, "handle should carry the real port");

    server.stop().await;
}

/// **VALUE**: Verifies an occupied port surfaces as a recoverable conflict.
#[tokio::test]
async fn given_occupied_port_when_listening_then_port_conflict() {
    use coord_core::error::serve::ServeError;

    // GIVEN: Someone already holds the port
    let holder = TcpListener::bind((API_SERVER_HOSTNAME, 0)).await.unwrap();
    let port = holder.local_addr().unwrap().port();

    // WHEN
    let identity = synthetic_identity();
    let meta = ServerMeta {
        started_at: None,
        mode: CoordinationScope::Shared,
    };
    let app = build_app(&identity, &meta, &demo_routes, false);
    let result = listen(app, port, API_SERVER_HOSTNAME).await;

    // THEN: The conflict variant, not the fatal bind error
    assert!(matches!(result, Err(ServeError::PortConflict { .. })));
}

/// **VALUE**: Verifies stop() actually releases the socket.
#[tokio::test]
async fn given_stopped_server_when_probing_then_connection_refused() {
    // GIVEN: A server that has been stopped
    let server = start_test_server().await;
    let port = server.port();
    server.stop().await;

    // WHEN / THEN: Nothing answers anymore
    let result = reqwest::get(format!("{API_SERVER_BASE_URL}:{port}/health")).await;
    assert!(result.is_err(), "stopped server should refuse connections");
}

/// **VALUE**: Verifies closures work as route factories, not just fn items.
#[tokio::test]
async fn given_closure_factory_when_building_then_routes_served() {
    // GIVEN: A factory defined inline as a non-capturing closure
    let factory = |_meta: &ServerMeta| Router::new().route("/api/inline", get(echo));

    let identity = synthetic_identity();
    let meta = ServerMeta {
        started_at: None,
        mode: CoordinationScope::Isolated,
    };
    let app = build_app(&identity, &meta, &factory, false);
    let server = listen(app, 0, API_SERVER_HOSTNAME)
        .await
        .expect("test server should bind");

    // WHEN / THEN
    let (status, body) = get_json(server.port(), "/api/inline").await;
    assert_eq!(status, 200);
    assert_eq!(body["echo"], json!(true));

    server.stop().await;
}
