pub mod builder;

use crate::scope::CoordinationScope;

use serde::Serialize;

/// What the caller of `ensure_server` gets back: where the server is and
/// whether this process started it.
///
/// A handle carries no liveness guarantee past the moment it was issued;
/// it is an address, not a lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHandle {
    pub port: u16,
    pub host: String,
    pub mode: CoordinationScope,
    /// `true` when an already-running instance was adopted, `false` when
    /// this process launched a fresh one.
    pub reused: bool,
}

impl ServerHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
