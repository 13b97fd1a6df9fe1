use coord_core::probe::ProbeClient;

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "127.0.0.1";

// ============================================================================
// Public API tests for the HTTP prober
// These exercise ProbeClient against real sockets: mock HTTP servers,
// closed ports, and listeners that never speak HTTP
// ============================================================================

/// **VALUE**: Verifies a healthy server is recognized as alive.
#[tokio::test]
async fn given_healthy_server_when_probing_then_alive() {
    // GIVEN: A server answering /health with {ok: true}
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "pid": 42, "ts": 0 })),
        )
        .mount(&server)
        .await;

    // WHEN / THEN
    let probe = ProbeClient::new();
    assert!(probe.is_alive(server.address().port(), HOST).await);
}

/// **VALUE**: Verifies `ok: false` is NOT treated as alive.
///
/// **WHY THIS MATTERS**: A server can be reachable while telling us it is
/// unhealthy. Reusing it would hand callers a dead-on-arrival address.
/// The probe must read the body, not just the status line.
///
/// **BUG THIS CATCHES**: Would catch an implementation that short-circuits
/// on HTTP 200 without parsing the liveness claim.
#[tokio::test]
async fn given_ok_false_body_when_probing_then_not_alive() {
    // GIVEN: A reachable server that reports itself unhealthy
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": false })))
        .mount(&server)
        .await;

    // WHEN / THEN
    let probe = ProbeClient::new();
    assert!(!probe.is_alive(server.address().port(), HOST).await);
}

/// **VALUE**: Verifies non-JSON 200 responses read as not alive.
///
/// **WHY THIS MATTERS**: Any random local web app could be squatting on
/// the probed port and answer 200 to everything. Without the parse gate it
/// would be adopted as our API server.
#[tokio::test]
async fn given_non_json_body_when_probing_then_not_alive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
        .mount(&server)
        .await;

    let probe = ProbeClient::new();
    assert!(!probe.is_alive(server.address().port(), HOST).await);
}

/// **VALUE**: Verifies error statuses read as not alive.
#[tokio::test]
async fn given_server_error_status_when_probing_then_not_alive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let probe = ProbeClient::new();
    assert!(!probe.is_alive(server.address().port(), HOST).await);
}

/// **VALUE**: Verifies a closed port reads as not alive instead of erroring.
///
/// **WHY THIS MATTERS**: Probing dead lock records is the common case, not
/// the exception. Connection refused must be an answer, not a failure.
#[tokio::test]
async fn given_closed_port_when_probing_then_not_alive() {
    // GIVEN: A port nobody is listening on
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let port = holder.local_addr().unwrap().port();
    drop(holder);

    // WHEN / THEN
    let probe = ProbeClient::new();
    assert!(!probe.is_alive(port, HOST).await);
}

/// **VALUE**: Verifies a listener that never speaks HTTP reads as not alive.
///
/// **WHY THIS MATTERS**: The probed port may belong to a database, an SSH
/// daemon, or a half-started process. The probe must time out quietly
/// rather than hang the whole decision protocol.
///
/// **BUG THIS CATCHES**: Would catch a probe without a request timeout,
/// which would block `ensure_server` forever on a silent socket.
#[tokio::test]
async fn given_silent_tcp_listener_when_probing_then_not_alive() {
    // GIVEN: A socket that accepts connections and says nothing
    let listener = TcpListener::bind((HOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let _ = listener.accept().await;
        }
    });

    // WHEN: Probing with a short timeout to keep the test quick
    let probe = ProbeClient::new().with_timeout(Duration::from_millis(300));
    let alive = probe.is_alive(port, HOST).await;

    // THEN
    assert!(!alive);
}

/// **VALUE**: Verifies a slow responder misses the probe window.
///
/// **WHY THIS MATTERS**: The 800ms default budget is what keeps a whole
/// `ensure_server` pass snappy; a server that cannot answer in time is
/// indistinguishable from a hung one and must be treated as such.
#[tokio::test]
async fn given_slow_responder_when_probing_then_not_alive() {
    // GIVEN: A healthy-looking server that answers too late
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true }))
                .set_delay(Duration::from_millis(900)),
        )
        .mount(&server)
        .await;

    // WHEN / THEN: The default 800ms window expires first
    let probe = ProbeClient::new();
    assert!(!probe.is_alive(server.address().port(), HOST).await);
}

/// **VALUE**: Verifies identity payloads parse into full claims.
#[tokio::test]
async fn given_identity_endpoint_when_asking_whoami_then_claims_returned() {
    // GIVEN: A server with a complete /whoami
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pid": 4242,
            "appSignature": "harbormaster-0a1b2c3d",
            "apiVersion": "3",
            "startedAt": "2026-08-23T08:00:00Z",
            "mode": "shared"
        })))
        .mount(&server)
        .await;

    // WHEN
    let probe = ProbeClient::new();
    let who = probe.who_am_i(server.address().port(), HOST).await;

    // THEN
    let who = who.expect("identity should parse");
    assert_eq!(who.pid, 4242);
    assert_eq!(who.app_signature, "harbormaster-0a1b2c3d");
    assert_eq!(who.api_version, "3");
}

/// **VALUE**: Verifies a 404 on /whoami yields no identity.
///
/// **WHY THIS MATTERS**: Older or foreign servers answer /health but have
/// no identity endpoint. They must read as "no identity" (and therefore
/// never be reused), not as an error.
#[tokio::test]
async fn given_missing_whoami_route_when_asking_then_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = ProbeClient::new();
    assert!(probe.who_am_i(server.address().port(), HOST).await.is_none());
}

/// **VALUE**: Verifies structurally foreign /whoami bodies yield no identity.
#[tokio::test]
async fn given_foreign_whoami_shape_when_asking_then_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "service": "something-else" })),
        )
        .mount(&server)
        .await;

    let probe = ProbeClient::new();
    assert!(probe.who_am_i(server.address().port(), HOST).await.is_none());
}

/// **VALUE**: Verifies wait_ready returns once a server becomes healthy.
///
/// **WHY THIS MATTERS**: This is the conflict-recovery wait: the race
/// winner needs a moment between winning the bind and serving /health.
/// The poll loop must pick up the transition, not just the initial state.
///
/// **BUG THIS CATCHES**: Would catch a wait that probes once and sleeps
/// out the rest of its budget, or one that caches the first failure.
#[tokio::test]
async fn given_server_that_warms_up_when_waiting_then_ready_within_budget() {
    // GIVEN: /health fails twice, then turns healthy
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    // WHEN: Waiting with the standard poll interval
    let probe = ProbeClient::new();
    let ready = probe
        .wait_ready(
            server.address().port(),
            HOST,
            Duration::from_millis(3000),
            Duration::from_millis(150),
        )
        .await;

    // THEN
    assert!(ready, "should observe the flip to healthy");
}

/// **VALUE**: Verifies wait_ready gives up when nothing ever answers.
#[tokio::test]
async fn given_dead_port_when_waiting_then_budget_expires_false() {
    // GIVEN: A port nobody will ever serve
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let port = holder.local_addr().unwrap().port();
    drop(holder);

    // WHEN: Waiting with a deliberately small budget
    let probe = ProbeClient::new();
    let ready = probe
        .wait_ready(
            port,
            HOST,
            Duration::from_millis(500),
            Duration::from_millis(100),
        )
        .await;

    // THEN
    assert!(!ready);
}
