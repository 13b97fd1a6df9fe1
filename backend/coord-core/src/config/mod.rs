use crate::error::config::SettingsError;
use crate::{API_SERVER_HOSTNAME, APP_NAME, DEFAULT_PREFERRED_PORT};

use common::ErrorLocation;

use models::CoordinationScope;

use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE_NAME: &str = "harbormaster.json";
const SETTINGS_VERSION: u32 = 1;

// ============================================
// SETTINGS SECTIONS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_preferred_port")]
    pub preferred_port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub mode: CoordinationScope,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            preferred_port: default_preferred_port(),
            host: default_host(),
            mode: CoordinationScope::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            api_version: default_api_version(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsSettings {
    #[serde(default)]
    pub dump_routes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub identity: IdentitySettings,

    #[serde(default)]
    pub diagnostics: DiagnosticsSettings,

    /// Where lock files live. Defaults to the platform-local data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for CoordSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            server: ServerSettings::default(),
            identity: IdentitySettings::default(),
            diagnostics: DiagnosticsSettings::default(),
            data_dir: None,
        }
    }
}

// ============================================
// DEFAULTS
// ============================================

fn default_version() -> u32 {
    SETTINGS_VERSION
}
fn default_preferred_port() -> u16 {
    DEFAULT_PREFERRED_PORT
}
fn default_host() -> String {
    API_SERVER_HOSTNAME.to_string()
}
fn default_app_name() -> String {
    APP_NAME.to_string()
}
fn default_api_version() -> String {
    "1".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl CoordSettings {
    /// Load settings from {config_dir}/harbormaster.json.
    ///
    /// A missing file is not an error: defaults are returned. A file that
    /// exists but cannot be read, parsed, or validated is.
    pub fn load(config_dir: &Path) -> Result<Self, SettingsError> {
        let settings_path = config_dir.join(SETTINGS_FILE_NAME);

        let contents = match std::fs::read_to_string(&settings_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", settings_path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                warn!(
                    "Settings file at {} is unreadable: {e}",
                    settings_path.display()
                );
                return Err(SettingsError::Read {
                    location: ErrorLocation::from(Location::caller()),
                    path: settings_path,
                    source: e,
                });
            }
        };

        let settings: CoordSettings = serde_json::from_str(&contents).map_err(|e| {
            warn!(
                "Settings file at {} did not parse: {e}",
                settings_path.display()
            );
            SettingsError::Parse {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                reason: e.to_string(),
            }
        })?;

        settings.validate()?;

        info!("Settings loaded from {}", settings_path.display());
        Ok(settings)
    }

    /// Save settings to {config_dir}/harbormaster.json.
    ///
    /// Unlike lock records, settings survive restarts and hold user intent,
    /// so they get the temp file + rename treatment.
    pub fn save(&self, config_dir: &Path) -> Result<(), SettingsError> {
        self.validate()?;

        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::create_dir_all(config_dir).map_err(write_error(config_dir.to_path_buf()))?;

        let settings_path = config_dir.join(SETTINGS_FILE_NAME);
        let temp_path = settings_path.with_extension("json.tmp");

        // Write the whole document to a sibling, then rename over the real
        // file; readers never observe a half-written settings file.
        std::fs::write(&temp_path, json).map_err(write_error(temp_path.clone()))?;
        std::fs::rename(&temp_path, &settings_path).map_err(write_error(settings_path.clone()))?;

        info!("Settings saved to {}", settings_path.display());
        Ok(())
    }

    /// Check settings values against protocol constraints.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.version == 0 || self.version > SETTINGS_VERSION {
            return Err(invalid(format!(
                "version {} out of range (expected 1-{SETTINGS_VERSION})",
                self.version
            )));
        }

        if self.server.preferred_port == 0 {
            return Err(invalid(String::from(
                "preferred_port cannot be 0; the OS-assigned fallback is chosen by the prober, not by configuration",
            )));
        }

        if self.server.host.is_empty() {
            return Err(invalid(String::from("host cannot be empty")));
        }

        if self.identity.api_version.is_empty() {
            return Err(invalid(String::from(
                "api_version cannot be empty; it keys shared-scope lock files",
            )));
        }

        Ok(())
    }

    /// The directory holding lock files, resolved against platform
    /// defaults when not configured.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}"))),
        }
    }
}

#[track_caller]
fn write_error(path: PathBuf) -> impl FnOnce(std::io::Error) -> SettingsError {
    let location = ErrorLocation::from(Location::caller());
    move |source| SettingsError::Write {
        location,
        path,
        source,
    }
}

#[track_caller]
fn invalid(reason: String) -> SettingsError {
    SettingsError::Validation {
        location: ErrorLocation::from(Location::caller()),
        reason,
    }
}
