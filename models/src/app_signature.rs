use std::fmt::{Display, Formatter, Result as FormatResult};

/// Identity of one installed copy of the application.
///
/// Two processes launched from the same binary in the same install
/// directory carry the same signature; the same app installed somewhere
/// else carries a different one. Rendered as `<name>-<digest>` everywhere
/// the signature crosses a boundary (lock files, `/whoami` payloads).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSignature {
    name: String,
    digest: String,
}

impl AppSignature {
    pub fn new(name: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            digest: digest.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl Display for AppSignature {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}-{}", self.name, self.digest)
    }
}
