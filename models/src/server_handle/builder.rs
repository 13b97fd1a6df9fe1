use crate::error::model_error::ModelError;
use crate::scope::CoordinationScope;
use crate::server_handle::ServerHandle;
use common::ErrorLocation;

use std::panic::Location;

/// Builder for creating validated ServerHandle instances.
///
/// Coordination code assembles handles from several sources (lock files,
/// probe responses, freshly bound listeners); the builder keeps the
/// "never hand out an unreachable address" checks in one place.
#[derive(Debug, Default)]
pub struct ServerHandleBuilder {
    port: Option<u16>,
    host: Option<String>,
    mode: Option<CoordinationScope>,
    reused: Option<bool>,
}

impl ServerHandleBuilder {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_mode(mut self, mode: CoordinationScope) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_reused(mut self, reused: bool) -> Self {
        self.reused = Some(reused);
        self
    }

    /// Validate and assemble the handle.
    #[track_caller]
    pub fn build(self) -> Result<ServerHandle, ModelError> {
        let port = self.port.ok_or_else(|| missing("port"))?;
        if port == 0 {
            return Err(invalid("port", "must be non-zero"));
        }

        let host = self.host.ok_or_else(|| missing("host"))?;
        if host.is_empty() {
            return Err(invalid("host", "must not be empty"));
        }

        let mode = self.mode.ok_or_else(|| missing("mode"))?;
        let reused = self.reused.ok_or_else(|| missing("reused"))?;

        Ok(ServerHandle {
            port,
            host,
            mode,
            reused,
        })
    }
}

#[track_caller]
fn missing(field: &'static str) -> ModelError {
    ModelError::MissingField {
        field,
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn invalid(what: &'static str, reason: &str) -> ModelError {
    ModelError::InvalidValue {
        what,
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
