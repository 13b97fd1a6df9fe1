//! Installation identity of the running process.
//!
//! Two processes launched from the same install share a signature; moving
//! or reinstalling the binary yields a different one. The signature and the
//! API version together decide which live servers this process may reuse.

use models::AppSignature;

use std::env::{current_dir, current_exe};

use log::debug;
use sha2::{Digest, Sha256};

const SIGNATURE_DIGEST_LEN: usize = 8;
const FALLBACK_APP_NAME: &str = "app";

/// Immutable identity handed to the orchestrator at construction.
///
/// Computed once per process start; injected rather than read from a
/// global so tests can coordinate with synthetic identities.
#[derive(Debug, Clone)]
pub struct Identity {
    signature: AppSignature,
    api_version: String,
}

impl Identity {
    pub fn new(signature: AppSignature, api_version: impl Into<String>) -> Self {
        Self {
            signature,
            api_version: api_version.into(),
        }
    }

    /// Derive the identity of this process from its environment.
    ///
    /// The signature digest covers the resolved executable path, falling
    /// back to the working directory when the executable cannot be
    /// resolved. Never fails; every lookup degrades to a fallback.
    pub fn detect(app_name: &str, api_version: &str) -> Self {
        let signature = detect_signature(app_name);
        debug!("Resolved app signature: {signature}");
        Self::new(signature, api_version)
    }

    pub fn signature(&self) -> &AppSignature {
        &self.signature
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

fn detect_signature(app_name: &str) -> AppSignature {
    let name = if app_name.is_empty() {
        FALLBACK_APP_NAME
    } else {
        app_name
    };

    let install_path = current_exe()
        .or_else(|_| current_dir())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| String::from(FALLBACK_APP_NAME));

    AppSignature::new(name, truncated_digest(&install_path))
}

fn truncated_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(SIGNATURE_DIGEST_LEN);
    encoded
}
