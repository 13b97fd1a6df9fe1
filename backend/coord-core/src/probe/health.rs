use common::HttpStatusCode;
use models::ServerIdentity;

use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace};
use reqwest::Client;
use tokio::time::sleep as TokioSleep;

pub const PROBE_TIMEOUT: Duration = Duration::from_millis(800);
pub const READY_WAIT_BUDGET: Duration = Duration::from_millis(3000);
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(150);

const HEALTH_ENDPOINT: &str = "/health";
const WHOAMI_ENDPOINT: &str = "/whoami";

/// Short-timeout HTTP prober for candidate servers.
///
/// All methods collapse every failure mode - refused connection, timeout,
/// wrong status, unparseable body - into "not alive" or "no identity".
/// Nothing in here ever propagates an error to the caller.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    client: Client,
    timeout: Duration,
}

impl Default for ProbeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Same prober with a different per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET `/health`; true iff the listener answers `{ok: true}` in time.
    pub async fn is_alive(&self, port: u16, host: &str) -> bool {
        let url = format!("http://{host}:{port}{HEALTH_ENDPOINT}");

        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<serde_json::Value>().await {
                    Ok(body) => {
                        let alive = body
                            .get("ok")
                            .and_then(|value| value.as_bool())
                            .unwrap_or(false);
                        trace!("Health probe at {url}: ok={alive}");
                        alive
                    }
                    Err(e) => {
                        debug!("Health probe at {url} returned an unparseable body: {e}");
                        false
                    }
                }
            }
            Ok(resp) => {
                let status = HttpStatusCode::from(resp.status().as_u16());
                if status.is_retryable() {
                    debug!("Health probe at {url} got {status}, listener not ready yet");
                } else {
                    debug!("Health probe at {url} got {status}, not a healthy server");
                }
                false
            }
            Err(e) => {
                trace!("Health probe at {url} failed: {e}");
                false
            }
        }
    }

    /// GET `/whoami`; the identity claims of whatever is listening, or
    /// `None` when the listener is unreachable or does not speak the
    /// coordination protocol.
    pub async fn who_am_i(&self, port: u16, host: &str) -> Option<ServerIdentity> {
        let url = format!("http://{host}:{port}{WHOAMI_ENDPOINT}");

        let resp = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(resp) => resp,
            Err(e) => {
                trace!("Identity probe at {url} failed: {e}");
                return None;
            }
        };

        if !resp.status().is_success() {
            let status = HttpStatusCode::from(resp.status().as_u16());
            if status.is_client_error() {
                debug!("Identity probe at {url} answered {status}, foreign listener");
            } else {
                debug!("Identity probe at {url} answered {status}");
            }
            return None;
        }

        match resp.json::<ServerIdentity>().await {
            Ok(identity) => {
                debug!(
                    "Listener at {url} identifies as {} v{} (pid {})",
                    identity.app_signature, identity.api_version, identity.pid
                );
                Some(identity)
            }
            Err(e) => {
                debug!("Identity probe at {url} returned a foreign shape: {e}");
                None
            }
        }
    }

    /// Poll `/health` at a fixed interval until it reports healthy or the
    /// budget elapses. Used during bind-conflict recovery, never during the
    /// initial decision phase.
    pub async fn wait_ready(
        &self,
        port: u16,
        host: &str,
        budget: Duration,
        interval: Duration,
    ) -> bool {
        let mut backoff = ExponentialBackoff {
            current_interval: interval,
            initial_interval: interval,
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: interval,
            max_elapsed_time: Some(budget),
            ..Default::default()
        };

        debug!("Waiting up to {budget:?} for {host}:{port} to become healthy");

        loop {
            if self.is_alive(port, host).await {
                return true;
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("{host}:{port} not ready, retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => {
                    debug!("{host}:{port} never became healthy within {budget:?}");
                    return false;
                }
            }
        }
    }
}
