use super::{coordinator, free_port, test_identity, two_free_ports};

use coord_core::API_SERVER_HOSTNAME;
use coord_core::lockstore::LockStore;
use coord_core::probe::ProbeClient;

use models::{CoordinationScope, LockRecord};

use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// ensure_server: the full decision protocol against real sockets
// Launched servers are detached, so each test works on its own ports and
// never assumes a quiet host beyond that
// ============================================================================

/// A pid far above any real pid space on the host.
const DEAD_PID: u32 = u32::MAX - 1;

// ----------------------------------------------------------------------------
// Fresh launch
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies the cold-start path: no lock, no server, launch fresh.
///
/// **WHY THIS MATTERS**: This is the very first run on a machine. The
/// handle must say `reused=false` and the advisory lock must name this
/// process, or every later run loses its trail back to the server.
#[tokio::test]
#[serial]
async fn given_no_server_when_ensuring_then_fresh_launch_on_preferred_port() {
    // GIVEN: An empty data dir and a free preferred port
    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let coord = coordinator(data_dir.path(), &identity);
    let preferred = free_port().await;

    // WHEN
    let handle = coord
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: A fresh server on the preferred port
    assert!(!handle.reused, "cold start should launch, not adopt");
    assert_eq!(handle.port, preferred);
    assert_eq!(handle.mode, CoordinationScope::Shared);
    assert_eq!(handle.base_url(), format!("http://127.0.0.1:{preferred}"));

    // AND: The advisory lock names this process as the owner
    let locks = LockStore::new(data_dir.path(), &identity);
    let record = locks
        .read(CoordinationScope::Shared)
        .await
        .expect("launch should write a lock record");
    assert_eq!(record.port, preferred);
    assert_eq!(record.pid, std::process::id());
    assert_eq!(record.app_signature, "testapp-aaaa1111");
    assert_eq!(record.api_version, "1");
    assert!(record.started_at.is_some());
}

// ----------------------------------------------------------------------------
// Adoption
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies calling ensure twice is safe and converges.
#[tokio::test]
#[serial]
async fn given_own_server_running_when_ensuring_again_then_adopted() {
    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let coord = coordinator(data_dir.path(), &identity);
    let preferred = free_port().await;

    let first = coord
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();
    let second = coord
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    assert!(!first.reused);
    assert!(second.reused, "second call should adopt the first server");
    assert_eq!(second.port, first.port);
}

/// **VALUE**: Verifies a separate coordinator adopts a peer's server.
///
/// **WHY THIS MATTERS**: This is the whole point of the protocol: the
/// second process must find the first one's server through nothing but
/// the lock file and live probing. No shared memory is involved - the
/// two coordinators here only meet on disk and on the wire.
///
/// **BUG THIS CATCHES**: Would catch a lock record the reader cannot
/// parse back (field rename, wrong directory, wrong file name), which
/// would silently turn every process into a fresh launcher.
#[tokio::test]
#[serial]
async fn given_peer_server_when_ensuring_then_adopted_via_lock() {
    // GIVEN: A server launched by one coordinator
    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let preferred = free_port().await;

    let first = coordinator(data_dir.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // WHEN: A brand-new coordinator with the same identity inputs ensures
    let second = coordinator(data_dir.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: It adopts instead of launching
    assert!(second.reused);
    assert_eq!(second.port, first.port);
}

/// **VALUE**: Verifies isolated scope adopts across API versions.
///
/// **WHY THIS MATTERS**: Isolated scope means "one server per install",
/// full stop. A version bump must NOT split an isolated install into two
/// servers; only the installation signature decides.
#[tokio::test]
#[serial]
async fn given_isolated_scope_when_versions_differ_then_still_adopted() {
    // GIVEN: A v1 server from this install, isolated scope
    let data_dir = TempDir::new().unwrap();
    let v1 = test_identity("aaaa1111", "1");
    let v99 = test_identity("aaaa1111", "99");
    let preferred = free_port().await;

    let first = coordinator(data_dir.path(), &v1)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Isolated)
        .await
        .unwrap();

    // WHEN: A much newer version of the same install ensures
    let second = coordinator(data_dir.path(), &v99)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Isolated)
        .await
        .unwrap();

    // THEN: Adopted; version plays no part in isolated scope
    assert!(second.reused);
    assert_eq!(second.port, first.port);
}

// ----------------------------------------------------------------------------
// Coexistence
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies incompatible API versions coexist in shared scope.
///
/// **WHY THIS MATTERS**: During an upgrade, old and new processes overlap
/// on the same machine. The new one must neither reuse the old server
/// (wrong API) nor kill it (other processes still depend on it). Two
/// servers on two ports is the designed outcome.
///
/// **BUG THIS CATCHES**: Would catch an acceptance test that ignores the
/// API version, which would hand v2 callers a v1 server.
#[tokio::test]
#[serial]
async fn given_shared_scope_when_versions_differ_then_coexist_on_separate_ports() {
    // GIVEN: A v1 server on the preferred port
    let data_dir = TempDir::new().unwrap();
    let v1 = test_identity("aaaa1111", "1");
    let v2 = test_identity("aaaa1111", "2");
    let preferred = free_port().await;

    let first = coordinator(data_dir.path(), &v1)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // WHEN: A v2 process ensures against the same preferred port
    let second = coordinator(data_dir.path(), &v2)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: A second, separate server
    assert!(!second.reused, "incompatible server must not be adopted");
    assert_ne!(second.port, first.port);

    // AND: The v1 server was left running
    let probe = ProbeClient::new();
    assert!(probe.is_alive(first.port, API_SERVER_HOSTNAME).await);

    // AND: Each version tracks its own lock file
    let v1_record = LockStore::new(data_dir.path(), &v1)
        .read(CoordinationScope::Shared)
        .await
        .expect("v1 lock should survive");
    let v2_record = LockStore::new(data_dir.path(), &v2)
        .read(CoordinationScope::Shared)
        .await
        .expect("v2 lock should be written");
    assert_eq!(v1_record.port, first.port);
    assert_eq!(v2_record.port, second.port);
}

/// **VALUE**: Verifies different installs coexist in isolated scope.
#[tokio::test]
#[serial]
async fn given_isolated_scope_when_installs_differ_then_coexist() {
    // GIVEN: An isolated server from install A
    let data_dir = TempDir::new().unwrap();
    let install_a = test_identity("aaaa1111", "1");
    let install_b = test_identity("bbbb2222", "1");
    let preferred = free_port().await;

    let first = coordinator(data_dir.path(), &install_a)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Isolated)
        .await
        .unwrap();

    // WHEN: Install B ensures against the same preferred port
    let second = coordinator(data_dir.path(), &install_b)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Isolated)
        .await
        .unwrap();

    // THEN: Separate servers; install A's is untouched
    assert!(!second.reused);
    assert_ne!(second.port, first.port);
    let probe = ProbeClient::new();
    assert!(probe.is_alive(first.port, API_SERVER_HOSTNAME).await);
}

/// **VALUE**: Verifies a listener that will not identify itself is left alone.
///
/// **WHY THIS MATTERS**: The preferred port may be squatted by anything
/// that happens to answer HTTP. Without an identity claim there is no
/// basis for adoption, and tearing the stranger down is never an option.
#[tokio::test]
#[serial]
async fn given_unidentifiable_listener_when_ensuring_then_left_alone() {
    // GIVEN: A healthy-looking listener with no identity endpoint
    let squatter = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&squatter)
        .await;
    let preferred = squatter.address().port();

    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");

    // WHEN: Ensuring with the squatted port as preferred
    let handle = coordinator(data_dir.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: A fresh server somewhere else; the squatter still runs
    assert!(!handle.reused);
    assert_ne!(handle.port, preferred);
    let probe = ProbeClient::new();
    assert!(probe.is_alive(preferred, API_SERVER_HOSTNAME).await);
}

// ----------------------------------------------------------------------------
// Stale lock handling
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies a lock naming a dead pid is ignored and replaced.
///
/// **BUG THIS CATCHES**: Would catch trusting the lock file without the
/// process-liveness gate, which would route every caller to a port
/// nobody serves after a crash.
#[tokio::test]
#[serial]
async fn given_lock_with_dead_pid_when_ensuring_then_ignored_and_overwritten() {
    // GIVEN: A leftover lock from a crashed process
    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let (stale_port, preferred) = two_free_ports().await;

    let locks = LockStore::new(data_dir.path(), &identity);
    locks
        .write(
            CoordinationScope::Shared,
            &LockRecord {
                port: stale_port,
                pid: DEAD_PID,
                app_signature: "testapp-aaaa1111".to_string(),
                api_version: "1".to_string(),
                started_at: None,
            },
        )
        .await;

    // WHEN
    let handle = coordinator(data_dir.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: Fresh launch; the stale record is gone
    assert!(!handle.reused);
    let record = locks.read(CoordinationScope::Shared).await.unwrap();
    assert_eq!(record.port, handle.port);
    assert_eq!(record.pid, std::process::id());
}

/// **VALUE**: Verifies a lock naming a live pid but a dead port is ignored.
///
/// **WHY THIS MATTERS**: The owning process can outlive its server (server
/// crashed inside it, or the port was released). Pid liveness alone is a
/// hint; only a healthy probe response earns adoption.
#[tokio::test]
#[serial]
async fn given_lock_with_live_pid_but_dead_server_when_ensuring_then_relaunched() {
    // GIVEN: A lock naming THIS process but a port nothing serves
    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let (vacated_port, preferred) = two_free_ports().await;

    let locks = LockStore::new(data_dir.path(), &identity);
    locks
        .write(
            CoordinationScope::Shared,
            &LockRecord {
                port: vacated_port,
                pid: std::process::id(),
                app_signature: "testapp-aaaa1111".to_string(),
                api_version: "1".to_string(),
                started_at: None,
            },
        )
        .await;

    // WHEN
    let handle = coordinator(data_dir.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: Launched fresh instead of trusting the vacated port
    assert!(!handle.reused);
    assert_ne!(handle.port, vacated_port);
    let record = locks.read(CoordinationScope::Shared).await.unwrap();
    assert_eq!(record.port, handle.port);
}

// ----------------------------------------------------------------------------
// Lock repair
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies port-probe adoption repairs a missing lock.
///
/// **WHY THIS MATTERS**: A cleared data dir (or a crash before the lock
/// write) leaves a healthy server with no paper trail. The next ensure
/// must find it on the preferred port anyway and restore the lock with
/// the SERVER's identity, so later calls go back to the fast path.
///
/// **BUG THIS CATCHES**: Would catch repairing the lock with the prober's
/// own pid instead of the server's, which would poison the liveness gate
/// as soon as the prober exits.
#[tokio::test]
#[serial]
async fn given_empty_data_dir_when_server_found_by_port_probe_then_lock_repaired() {
    // GIVEN: A server launched with its lock in data dir A
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let preferred = free_port().await;

    let first = coordinator(dir_a.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // WHEN: A coordinator with an empty data dir B probes the same port
    let second = coordinator(dir_b.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: Adopted via the port probe
    assert!(second.reused);
    assert_eq!(second.port, first.port);

    // AND: Dir B now carries a lock naming the real server
    let repaired = LockStore::new(dir_b.path(), &identity)
        .read(CoordinationScope::Shared)
        .await
        .expect("port-probe adoption should repair the lock");
    assert_eq!(repaired.port, first.port);
    assert_eq!(repaired.pid, std::process::id());
}
