//! The decision protocol: ensure one usable API server per scope.
//!
//! Multiple independent processes run this same protocol with no shared
//! memory; they meet only through the advisory lock file and the OS bind
//! table. The protocol is optimistic: every hint is re-verified by live
//! probing, and the atomic bind-or-fail on a TCP port is the one true
//! tie-breaker when processes race.

use crate::error::serve::ServeError;
use crate::identity::Identity;
use crate::lockstore::LockStore;
use crate::probe::health::{ProbeClient, READY_POLL_INTERVAL};
use crate::probe::port::find_free_port;
use crate::server::app::{RouteFactory, ServerMeta, build_app};
use crate::server::launcher::listen;

use common::ErrorLocation;
use models::{CoordinationScope, LockRecord, ServerHandle, ServerHandleBuilder, ServerIdentity};

use std::panic::Location;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use humantime::format_rfc3339_seconds;
use log::{debug, error, info};
use sysinfo::{Pid, ProcessesToUpdate, System};

/// How long a bind-race loser waits for the winner to come up healthy.
pub const CONFLICT_WAIT_BUDGET: Duration = Duration::from_millis(2500);

/// Pid recorded when adopting a server whose owner we never identified.
const UNKNOWN_OWNER_PID: u32 = 0;

/// Sequences lock probing, port probing, and launching into one
/// idempotent "ensure a usable server exists" operation.
///
/// Identity is injected at construction so tests can run whole fleets of
/// synthetic installations against each other.
pub struct Coordinator {
    identity: Identity,
    locks: LockStore,
    probe: ProbeClient,
    factory: Arc<dyn RouteFactory>,
    dump_routes: bool,
}

impl Coordinator {
    pub fn new(
        identity: Identity,
        locks: LockStore,
        probe: ProbeClient,
        factory: Arc<dyn RouteFactory>,
    ) -> Self {
        Self {
            identity,
            locks,
            probe,
            factory,
            dump_routes: false,
        }
    }

    /// Enable the one-time route dump logged when a server is launched.
    pub fn with_route_dump(mut self, enabled: bool) -> Self {
        self.dump_routes = enabled;
        self
    }

    /// Ensure a live, compatible API server exists for `mode` and return
    /// its address.
    ///
    /// Tries, in order: the server named by the advisory lock, then
    /// whatever answers on the preferred port, then launching fresh. A
    /// live server that fails the identity test is never reused and never
    /// torn down - incompatible versions and installs deliberately coexist
    /// on different ports.
    ///
    /// # Returns
    ///
    /// * `Ok(ServerHandle)` with `reused=true` when an existing server was adopted
    /// * `Ok(ServerHandle)` with `reused=false` when this call bound a new one
    /// * `Err(ServeError)` when binding failed fatally (see [`ServeError`])
    pub async fn ensure_server(
        &self,
        preferred_port: u16,
        host: &str,
        mode: CoordinationScope,
    ) -> Result<ServerHandle, ServeError> {
        debug!("Ensuring local API server (preferred={preferred_port}, host={host}, mode={mode})");

        if let Some(handle) = self.adopt_from_lock(host, mode).await? {
            return Ok(handle);
        }

        if let Some(handle) = self.adopt_from_port(preferred_port, host, mode).await? {
            return Ok(handle);
        }

        self.launch(preferred_port, host, mode).await
    }

    /// Follow the advisory lock, trusting nothing it claims until the
    /// recorded pid is alive, the recorded port answers `/health`, and the
    /// server's own identity passes the acceptance test.
    async fn adopt_from_lock(
        &self,
        host: &str,
        mode: CoordinationScope,
    ) -> Result<Option<ServerHandle>, ServeError> {
        let Some(record) = self.locks.read(mode).await else {
            return Ok(None);
        };

        if !process_alive(record.pid) {
            debug!("Lock for {mode} scope names dead pid {}, ignoring", record.pid);
            return Ok(None);
        }

        if !self.probe.is_alive(record.port, host).await {
            debug!(
                "Lock for {mode} scope points at {host}:{} but nothing healthy answers",
                record.port
            );
            return Ok(None);
        }

        let Some(who) = self.probe.who_am_i(record.port, host).await else {
            debug!(
                "Server at {host}:{} will not identify itself, treating as foreign",
                record.port
            );
            return Ok(None);
        };

        if !self.accepts(&who, mode) {
            info!(
                "Server at {host}:{} is live but incompatible ({} v{}), coexisting",
                record.port, who.app_signature, who.api_version
            );
            return Ok(None);
        }

        info!(
            "Reusing server at {host}:{} via {mode} lock (pid {})",
            record.port, who.pid
        );

        let handle = ServerHandleBuilder::default()
            .with_port(record.port)
            .with_host(host)
            .with_mode(mode)
            .with_reused(true)
            .build()?;
        Ok(Some(handle))
    }

    /// Somebody might serve on the preferred port without having written a
    /// matching lock (crashed writer, cleared data dir). Probe it directly
    /// and, if it is one of ours, repair the lock to point at it.
    async fn adopt_from_port(
        &self,
        preferred_port: u16,
        host: &str,
        mode: CoordinationScope,
    ) -> Result<Option<ServerHandle>, ServeError> {
        if !self.probe.is_alive(preferred_port, host).await {
            return Ok(None);
        }

        let Some(who) = self.probe.who_am_i(preferred_port, host).await else {
            debug!("Listener on preferred port {preferred_port} will not identify itself, leaving it alone");
            return Ok(None);
        };

        if !self.accepts(&who, mode) {
            info!(
                "Listener on preferred port {preferred_port} is incompatible ({} v{}), coexisting",
                who.app_signature, who.api_version
            );
            return Ok(None);
        }

        let repaired = LockRecord {
            port: preferred_port,
            pid: who.pid,
            app_signature: who.app_signature.clone(),
            api_version: who.api_version.clone(),
            started_at: who.started_at.clone(),
        };
        self.locks.write(mode, &repaired).await;

        info!(
            "Reusing server at {host}:{preferred_port} found by port probe (pid {}), lock repaired",
            who.pid
        );

        let handle = ServerHandleBuilder::default()
            .with_port(preferred_port)
            .with_host(host)
            .with_mode(mode)
            .with_reused(true)
            .build()?;
        Ok(Some(handle))
    }

    /// No compatible server anywhere; bind one ourselves.
    async fn launch(
        &self,
        preferred_port: u16,
        host: &str,
        mode: CoordinationScope,
    ) -> Result<ServerHandle, ServeError> {
        let port = self.pick_port(preferred_port, host).await?;

        let meta = ServerMeta {
            started_at: Some(now_rfc3339()),
            mode,
        };
        let app = build_app(&self.identity, &meta, self.factory.as_ref(), self.dump_routes);

        match listen(app, port, host).await {
            Ok(server) => {
                let bound_port = server.port();
                self.record_own_launch(bound_port, mode, meta.started_at.clone())
                    .await;

                info!("Launched API server on {host}:{bound_port} ({mode} scope)");

                // The serve task is detached; the handle we hand out is an
                // address, not ownership of the socket.
                let handle = ServerHandleBuilder::default()
                    .with_port(bound_port)
                    .with_host(host)
                    .with_mode(mode)
                    .with_reused(false)
                    .build()?;
                Ok(handle)
            }
            Err(ServeError::PortConflict { .. }) => {
                info!("Lost the bind race on {host}:{port}, entering conflict recovery");
                self.recover_from_conflict(port, host, mode).await
            }
            Err(e) => Err(e),
        }
    }

    /// Bind-conflict recovery: another process claimed our port between
    /// the availability probe and the bind.
    ///
    /// Wait for the race winner to come up healthy and adopt it; if it
    /// never does, fall back to a fresh port and retry the bind exactly
    /// once. A second conflict means the host is churning too fast for
    /// coordination and is reported as fatal.
    async fn recover_from_conflict(
        &self,
        conflict_port: u16,
        host: &str,
        mode: CoordinationScope,
    ) -> Result<ServerHandle, ServeError> {
        if self
            .probe
            .wait_ready(conflict_port, host, CONFLICT_WAIT_BUDGET, READY_POLL_INTERVAL)
            .await
        {
            info!("Bind-race winner on {host}:{conflict_port} is healthy, adopting it");

            let record = LockRecord {
                port: conflict_port,
                pid: UNKNOWN_OWNER_PID,
                app_signature: self.identity.signature().to_string(),
                api_version: self.identity.api_version().to_string(),
                started_at: None,
            };
            self.locks.write(mode, &record).await;

            let handle = ServerHandleBuilder::default()
                .with_port(conflict_port)
                .with_host(host)
                .with_mode(mode)
                .with_reused(true)
                .build()?;
            return Ok(handle);
        }

        debug!("Nothing healthy appeared on {host}:{conflict_port}, falling back to a fresh port");

        let fallback_port = self
            .pick_port(conflict_port.saturating_add(1), host)
            .await?;

        let meta = ServerMeta {
            started_at: Some(now_rfc3339()),
            mode,
        };
        let app = build_app(&self.identity, &meta, self.factory.as_ref(), self.dump_routes);

        match listen(app, fallback_port, host).await {
            Ok(server) => {
                let bound_port = server.port();
                self.record_own_launch(bound_port, mode, meta.started_at.clone())
                    .await;

                info!(
                    "Launched API server on {host}:{bound_port} after conflict recovery ({mode} scope)"
                );

                let handle = ServerHandleBuilder::default()
                    .with_port(bound_port)
                    .with_host(host)
                    .with_mode(mode)
                    .with_reused(false)
                    .build()?;
                Ok(handle)
            }
            Err(ServeError::PortConflict { message, .. }) => {
                error!("Conflict recovery exhausted: lost a second bind race on {host}:{fallback_port}");
                Err(ServeError::Exhausted {
                    message: format!(
                        "Lost a second bind race on {host}:{fallback_port} during recovery: {message}"
                    ),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Acceptance test for reuse: exact signature match always; in shared
    /// scope the API version must match too.
    fn accepts(&self, who: &ServerIdentity, mode: CoordinationScope) -> bool {
        who.app_signature == self.identity.signature().to_string()
            && (mode == CoordinationScope::Isolated
                || who.api_version == self.identity.api_version())
    }

    async fn pick_port(&self, starting_at: u16, host: &str) -> Result<u16, ServeError> {
        find_free_port(starting_at, host)
            .await
            .map_err(|e| ServeError::Bind {
                message: format!(
                    "Could not find a bindable port starting at {starting_at} on {host}: {e}"
                ),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(e),
            })
    }

    async fn record_own_launch(
        &self,
        port: u16,
        mode: CoordinationScope,
        started_at: Option<String>,
    ) {
        let record = LockRecord {
            port,
            pid: std::process::id(),
            app_signature: self.identity.signature().to_string(),
            api_version: self.identity.api_version().to_string(),
            started_at,
        };
        self.locks.write(mode, &record).await;
    }
}

/// Whether `pid` is a live process on this host.
///
/// Pid 0 marks an unknown owner in adoption breadcrumbs and is never
/// treated as alive.
fn process_alive(pid: u32) -> bool {
    if pid == UNKNOWN_OWNER_PID {
        return false;
    }

    let mut sys = System::new_all();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    sys.process(Pid::from_u32(pid)).is_some()
}

fn now_rfc3339() -> String {
    format_rfc3339_seconds(SystemTime::now()).to_string()
}
