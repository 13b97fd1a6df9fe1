//! Advisory lock-file bookkeeping.
//!
//! One JSON record per coordination scope, stored in the application data
//! directory. The file is a hint, never an authority: readers must
//! re-verify everything it claims by probing, and writers race without
//! any filesystem locking. All I/O failure degrades to "no lock" on read
//! and a logged no-op on write.

use crate::identity::Identity;

use models::{CoordinationScope, LockRecord};

use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, warn};
use tokio::fs;

const LOCK_FILE_PREFIX: &str = "server";
const LOCK_FILE_SUFFIX: &str = "lock";

pub struct LockStore {
    data_dir: PathBuf,
    app_signature: String,
    api_version: String,
}

impl LockStore {
    pub fn new(data_dir: impl Into<PathBuf>, identity: &Identity) -> Self {
        Self {
            data_dir: data_dir.into(),
            app_signature: identity.signature().to_string(),
            api_version: identity.api_version().to_string(),
        }
    }

    /// Resolve the lock file path for a scope.
    ///
    /// Isolated scopes key the file by installation signature so separate
    /// installs never collide; shared scopes key it by API version so only
    /// version-compatible processes compete for the same file.
    pub fn lock_file_path(&self, scope: CoordinationScope) -> PathBuf {
        let file_name = match scope {
            CoordinationScope::Isolated => {
                format!("{LOCK_FILE_PREFIX}.{}.{LOCK_FILE_SUFFIX}", self.app_signature)
            }
            CoordinationScope::Shared => {
                format!(
                    "{LOCK_FILE_PREFIX}.shared.v{}.{LOCK_FILE_SUFFIX}",
                    self.api_version
                )
            }
        };

        self.data_dir.join(file_name)
    }

    /// Read the advisory record for a scope.
    ///
    /// Missing files, unreadable files, malformed JSON, and records without
    /// a usable port/pid all come back as `None`.
    pub async fn read(&self, scope: CoordinationScope) -> Option<LockRecord> {
        let path = self.lock_file_path(scope);

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No lock file at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read lock at {}: {e}", path.display());
                return None;
            }
        };

        let record: LockRecord = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring malformed lock at {}: {e}", path.display());
                return None;
            }
        };

        if !record.is_usable() {
            debug!(
                "Ignoring breadcrumb lock at {} (port={}, pid={})",
                path.display(),
                record.port,
                record.pid
            );
            return None;
        }

        Some(record)
    }

    /// Best-effort write of the advisory record for a scope.
    ///
    /// Creates the data directory if absent. The write is a plain
    /// overwrite, not atomic and not locked; since every reader re-probes
    /// before trusting the record, a torn or lost write costs one extra
    /// probe, nothing more.
    pub async fn write(&self, scope: CoordinationScope, record: &LockRecord) {
        if let Err(e) = fs::create_dir_all(&self.data_dir).await {
            warn!(
                "Could not create lock directory {}: {e}",
                self.data_dir.display()
            );
            return;
        }

        let body = match serde_json::to_string_pretty(record) {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not serialize lock record: {e}");
                return;
            }
        };

        let path = self.lock_file_path(scope);
        if let Err(e) = fs::write(&path, body).await {
            warn!("Could not write lock at {}: {e}", path.display());
            return;
        }

        debug!(
            "Lock written at {} (port={}, pid={})",
            path.display(),
            record.port,
            record.pid
        );
    }
}
