use serde::{Deserialize, Serialize};

/// One advisory lock file, as written to disk.
///
/// A lock record is a hint left behind by whichever process last won a
/// launch, never an authority. Readers must re-verify every claim in it
/// (process liveness, HTTP liveness, identity) before acting on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    pub port: u16,
    pub pid: u32,
    pub app_signature: String,
    pub api_version: String,
    /// RFC 3339 timestamp of the recorded launch. Absent in records written
    /// by a process that adopted a server it did not start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl LockRecord {
    /// Whether the record points at something worth probing.
    ///
    /// Records with a zero port or zero pid are breadcrumbs from adoption
    /// paths; they never short-circuit discovery.
    pub fn is_usable(&self) -> bool {
        self.port != 0 && self.pid != 0
    }
}
