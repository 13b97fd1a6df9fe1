use super::{coordinator, free_port, test_identity};

use coord_core::API_SERVER_HOSTNAME;
use coord_core::probe::ProbeClient;

use models::CoordinationScope;

use serial_test::serial;
use tempfile::TempDir;
use tokio::net::TcpListener;

// ============================================================================
// Bind races and occupied ports
// ============================================================================

/// **VALUE**: Verifies two concurrent ensures converge instead of failing.
///
/// **WHY THIS MATTERS**: The protocol's whole job is surviving the moment
/// two processes start at once. Whichever interleaving the scheduler
/// picks, both calls must come back with a healthy server and at most one
/// of them may claim to have launched the port they share.
///
/// **BUG THIS CATCHES**: Would catch conflict recovery erroring out on
/// address-in-use instead of waiting for the race winner, which would
/// fail every second app start on a cold machine.
#[tokio::test]
#[serial]
async fn given_two_concurrent_ensures_when_racing_then_both_succeed_and_converge() {
    // GIVEN: Two coordinators with the same identity but separate data
    // dirs, so the only rendezvous point is the port itself
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");
    let coord_a = coordinator(dir_a.path(), &identity);
    let coord_b = coordinator(dir_b.path(), &identity);
    let preferred = free_port().await;

    // WHEN: Both ensure at once against the same preferred port
    let (a, b) = tokio::join!(
        coord_a.ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared),
        coord_b.ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    // THEN: Converged on one server, or (rarely) two fresh compatible
    // ones when a side re-scanned in the window between losing the port
    // and the winner answering /health
    if a.port == b.port {
        assert_ne!(a.reused, b.reused, "exactly one side should have launched");
    } else {
        assert!(!a.reused && !b.reused);
    }

    // AND: Everything handed out is actually serving
    let probe = ProbeClient::new();
    assert!(probe.is_alive(a.port, API_SERVER_HOSTNAME).await);
    assert!(probe.is_alive(b.port, API_SERVER_HOSTNAME).await);
}

/// **VALUE**: Verifies a silent squatter on the preferred port is routed around.
///
/// **WHY THIS MATTERS**: "Port taken by something that is not an HTTP
/// server" is the everyday case of a developer machine. The probe times
/// out, the scan must notice the port is unusable, and the launch must
/// land nearby without disturbing the squatter.
#[tokio::test]
#[serial]
async fn given_silent_listener_on_preferred_port_when_ensuring_then_nearby_port_used() {
    // GIVEN: The preferred port is held by a socket that never speaks HTTP
    let squatter = TcpListener::bind((API_SERVER_HOSTNAME, 0)).await.unwrap();
    let preferred = squatter.local_addr().unwrap().port();

    let data_dir = TempDir::new().unwrap();
    let identity = test_identity("aaaa1111", "1");

    // WHEN
    let handle = coordinator(data_dir.path(), &identity)
        .ensure_server(preferred, API_SERVER_HOSTNAME, CoordinationScope::Shared)
        .await
        .unwrap();

    // THEN: Launched on a different port, squatter untouched
    assert!(!handle.reused);
    assert_ne!(handle.port, preferred);
    let probe = ProbeClient::new();
    assert!(probe.is_alive(handle.port, API_SERVER_HOSTNAME).await);

    drop(squatter);
}
