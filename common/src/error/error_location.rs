use serde::Serialize;

use std::fmt;
use std::panic::Location as PanicLocation;

/// Source position attached to every error variant in the workspace.
///
/// Captured at the raise site via `#[track_caller]` so log lines point at
/// the caller that hit the failure, not at the error constructor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl From<&'static PanicLocation<'static>> for ErrorLocation {
    fn from(location: &'static PanicLocation<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{}:{})", self.file, self.line, self.column)
    }
}
