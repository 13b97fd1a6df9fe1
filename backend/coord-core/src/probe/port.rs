use std::io::{Error as IoError, ErrorKind};

use log::{debug, trace};
use tokio::net::TcpListener;

const FREE_PORT_SCAN_SPAN: u16 = 49;

/// Bind failures that mean "someone else holds this port".
///
/// Anything else (bad host, fd exhaustion) says nothing about the port
/// being claimed and must not be mistaken for a conflict.
pub(crate) fn is_conflict_kind(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::AddrInUse | ErrorKind::PermissionDenied)
}

/// Whether `host:port` is currently unbindable.
///
/// Attempts a transient bind and drops the listener immediately. The bind
/// table is the only ground truth for availability; lock files never are.
pub async fn is_port_busy(port: u16, host: &str) -> bool {
    match TcpListener::bind(format!("{host}:{port}")).await {
        Ok(_) => false,
        Err(e) if is_conflict_kind(e.kind()) => {
            trace!("Port {port} on {host} is busy: {e}");
            true
        }
        Err(e) => {
            debug!("Bind probe on {host}:{port} failed for a non-conflict reason: {e}");
            false
        }
    }
}

/// Find a bindable port, preferring `preferred`.
///
/// Falls back to a bounded upward scan, then to an OS-assigned ephemeral
/// port. Always terminates with a concrete port unless binding itself is
/// broken on the host.
pub async fn find_free_port(preferred: u16, host: &str) -> Result<u16, IoError> {
    if !is_port_busy(preferred, host).await {
        return Ok(preferred);
    }

    debug!("Preferred port {preferred} on {host} is busy, scanning upward");

    let scan_end = preferred.saturating_add(FREE_PORT_SCAN_SPAN);
    for candidate in preferred.saturating_add(1)..=scan_end {
        if !is_port_busy(candidate, host).await {
            debug!("Found free port {candidate} after scanning from {preferred}");
            return Ok(candidate);
        }
    }

    // The whole scan window is taken; let the OS pick.
    let listener = TcpListener::bind(format!("{host}:0")).await?;
    let port = listener.local_addr()?.port();
    debug!("Scan window above {preferred} exhausted, OS assigned ephemeral port {port}");
    Ok(port)
}
