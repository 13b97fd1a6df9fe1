// Unit tests for bind-based port probing

use crate::probe::port::{find_free_port, is_port_busy};

use tokio::net::TcpListener;

const HOST: &str = "127.0.0.1";

/// **VALUE**: Verifies a held listener makes its port read as busy.
///
/// **WHY THIS MATTERS**: The transient-bind check is the protocol's only
/// ground truth for availability. If it reported a held port as free, two
/// processes would both pick it and one would always crash into a
/// bind conflict it could have avoided.
#[tokio::test]
async fn given_held_listener_when_checking_then_port_is_busy() {
    // GIVEN: A port held by a live listener
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let port = holder.local_addr().unwrap().port();

    // WHEN / THEN: The probe sees it as busy
    assert!(is_port_busy(port, HOST).await);
}

/// **VALUE**: Verifies releasing a listener frees its port.
///
/// **BUG THIS CATCHES**: Would catch the probe failing to drop its own
/// transient listener, which would make every probed port read busy
/// forever after.
#[tokio::test]
async fn given_released_listener_when_checking_then_port_is_free() {
    // GIVEN: A port that was just released
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let port = holder.local_addr().unwrap().port();
    drop(holder);

    // WHEN / THEN: The probe sees it as free
    assert!(!is_port_busy(port, HOST).await);
}

/// **VALUE**: Verifies a free preferred port is returned unchanged.
///
/// **WHY THIS MATTERS**: The preferred port is the cross-process
/// rendezvous point; scanning away from it when it is available would
/// scatter processes that should have found each other.
#[tokio::test]
async fn given_free_preferred_port_when_finding_then_preferred_returned() {
    // GIVEN: A port known to be free (just released by us)
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let port = holder.local_addr().unwrap().port();
    drop(holder);

    // WHEN
    let found = find_free_port(port, HOST).await.unwrap();

    // THEN
    assert_eq!(found, port);
}

/// **VALUE**: Verifies the scan skips an occupied preferred port.
///
/// **WHY THIS MATTERS**: This is the coexistence path in miniature: when
/// the rendezvous port belongs to someone we cannot reuse, the launcher
/// must end up close by but never on top of them.
///
/// **BUG THIS CATCHES**: Would catch a scan that returns the busy
/// preferred port, or one that wanders outside its bounded window.
#[tokio::test]
async fn given_occupied_preferred_port_when_finding_then_nearby_port_returned() {
    // GIVEN: The preferred port is held
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let preferred = holder.local_addr().unwrap().port();

    // WHEN
    let found = find_free_port(preferred, HOST).await.unwrap();

    // THEN: A different port, and one we can really bind
    assert_ne!(found, preferred);
    assert!(!is_port_busy(found, HOST).await);
}

/// **VALUE**: Verifies the scan walks past a run of occupied ports.
///
/// **WHY THIS MATTERS**: Several processes launched in a burst each take
/// the next port up; the scan must keep walking rather than give up after
/// the first occupied candidate.
#[tokio::test]
async fn given_run_of_occupied_ports_when_finding_then_scan_walks_past_them() {
    // GIVEN: The preferred port and (where possible) the next two are held
    let holder = TcpListener::bind((HOST, 0)).await.unwrap();
    let preferred = holder.local_addr().unwrap().port();
    let _next = TcpListener::bind((HOST, preferred.saturating_add(1))).await;
    let _after = TcpListener::bind((HOST, preferred.saturating_add(2))).await;

    // WHEN
    let found = find_free_port(preferred, HOST).await.unwrap();

    // THEN: Whatever came back is genuinely bindable and not one we hold
    assert_ne!(found, preferred);
    assert!(!is_port_busy(found, HOST).await);
}
