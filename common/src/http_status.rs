//! HTTP status classification for probe and retry decisions.

use std::fmt;

/// Status code of a probe response.
///
/// Probes deal in raw `u16` codes from whatever is answering on a port;
/// the classification here decides whether that answer means "not our
/// server" or "ours, still warming up".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    /// 4xx: a live listener that does not recognize the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self.0, 400..=499)
    }

    /// Codes worth polling again: the listener exists but is not ready.
    pub fn is_retryable(&self) -> bool {
        matches!(self.0, 429 | 502..=504)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.0)
    }
}
