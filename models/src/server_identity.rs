use crate::scope::CoordinationScope;

use serde::{Deserialize, Serialize};

/// The `/whoami` payload a running server uses to introduce itself.
///
/// This is the only information a prospective client has when deciding
/// whether a live listener is ours, a sibling install, or a stranger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdentity {
    pub pid: u32,
    pub app_signature: String,
    pub api_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    pub mode: CoordinationScope,
}
