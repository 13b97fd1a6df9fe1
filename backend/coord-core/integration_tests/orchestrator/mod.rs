mod conflict;
mod ensure;

use coord_core::API_SERVER_HOSTNAME;
use coord_core::identity::Identity;
use coord_core::lockstore::LockStore;
use coord_core::orchestrator::Coordinator;
use coord_core::probe::ProbeClient;
use coord_core::server::app::ServerMeta;

use models::AppSignature;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

// Shared scaffolding for the orchestrator tests. Every test builds its own
// fleet of coordinators from synthetic identities and throwaway data dirs,
// so nothing leaks between tests beyond the detached servers themselves.

/// A factory that mounts nothing; the boundary routes are all these tests need.
fn no_routes(_meta: &ServerMeta) -> Router {
    Router::new()
}

fn test_identity(digest: &str, api_version: &str) -> Identity {
    Identity::new(AppSignature::new("testapp", digest), api_version)
}

fn coordinator(data_dir: &Path, identity: &Identity) -> Coordinator {
    let locks = LockStore::new(data_dir, identity);
    Coordinator::new(
        identity.clone(),
        locks,
        ProbeClient::new(),
        Arc::new(no_routes),
    )
}

/// Pick a port that is free right now.
///
/// Racy by nature: the port is released before the caller uses it. The
/// orchestrator tests run serially to keep that window harmless.
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

/// Two distinct free ports, held together so the OS cannot hand out the
/// same one twice.
async fn two_free_ports() -> (u16, u16) {
    let first = TcpListener::bind((API_SERVER_HOSTNAME, 0))
        .await
        .expect("ephemeral bind should succeed");
    let second = TcpListener::bind((API_SERVER_HOSTNAME, 0))
        .await
        .expect("ephemeral bind should succeed");

    (
        first
            .local_addr()
            .expect("bound socket has an address")
            .port(),
        second
            .local_addr()
            .expect("bound socket has an address")
            .port(),
    )
}
