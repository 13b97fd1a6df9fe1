use crate::error::serve::ServeError;
use crate::probe::port::is_conflict_kind;

use common::ErrorLocation;

use std::future::pending;
use std::panic::Location;

use axum::Router;
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A live HTTP server bound to a concrete port.
///
/// The serve task is detached: dropping this handle leaves the server
/// running, exactly as if some other process owned it. `stop` exists for
/// hosts and tests that want an orderly shutdown.
pub struct ListeningServer {
    port: u16,
    host: String,
    shutdown_tx: mpsc::Sender<()>,
    serve_task: JoinHandle<()>,
}

impl ListeningServer {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn stop(self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Server on {}:{} already shut down", self.host, self.port);
        }
        if let Err(e) = self.serve_task.await {
            warn!("Serve task for {}:{} ended abnormally: {e}", self.host, self.port);
        }
    }
}

/// Bind `host:port` and serve `app` on a detached task.
///
/// Port 0 asks the OS to pick; the returned handle always carries the
/// concrete port read back from the listener. Address-in-use and
/// permission failures come back as [`ServeError::PortConflict`] so the
/// orchestrator can run conflict recovery; any other failure is fatal.
pub async fn listen(app: Router, port: u16, host: &str) -> Result<ListeningServer, ServeError> {
    let addr = format!("{host}:{port}");

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) if is_conflict_kind(e.kind()) => {
            debug!("Bind on {addr} lost to another listener: {e}");
            return Err(ServeError::PortConflict {
                message: format!("Address {addr} is already claimed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Err(e) => {
            error!("Bind on {addr} failed fatally: {e}");
            return Err(ServeError::Bind {
                message: format!("Could not bind {addr}: {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(e),
            });
        }
    };

    let actual_port = listener
        .local_addr()
        .map_err(|e| ServeError::Bind {
            message: format!("Bound {addr} but could not read the local address back: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?
        .port();

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let serve_task = TokioSpawn(async move {
        let shutdown = async move {
            if shutdown_rx.recv().await.is_none() {
                // Every sender is gone without an explicit stop, meaning the
                // handle was discarded. The server outlives it.
                pending::<()>().await;
            }
        };

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            warn!("API server stopped serving: {e}");
        }
    });

    info!("API server listening on {host}:{actual_port}");

    Ok(ListeningServer {
        port: actual_port,
        host: host.to_string(),
        shutdown_tx,
        serve_task,
    })
}
