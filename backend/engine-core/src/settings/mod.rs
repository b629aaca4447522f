//! User settings for an engine session, persisted as `engine.json`.

use crate::error::settings::SettingsError;
use crate::{DEFAULT_INTERNAL_HOST, PROXY_API_KEY_ENV, PROXY_BINARY};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE_NAME: &str = "engine.json";
const SETTINGS_VERSION: u32 = 1;

// ============================================
// SETTINGS STRUCTS
// ============================================

/// Public listen target as written in the settings file.
///
/// `port` is kept as text so a named pipe path can be given in its place,
/// exactly as a caller could at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenSettings {
    pub port: Option<String>,
    pub pipe_path: Option<String>,
    pub host: Option<String>,
}

/// How to run the proxy process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LauncherSettings {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub log_level: Option<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: Vec::new(),
            api_key_env: default_api_key_env(),
            log_level: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Paths the proxy treats as GraphQL; `/graphql` when unset.
    pub graphql_paths: Option<Vec<String>>,

    /// Loopback host the embedding server binds its ephemeral port on.
    #[serde(default = "default_internal_host")]
    pub internal_host: String,

    #[serde(default)]
    pub listen: ListenSettings,

    #[serde(default)]
    pub launcher: LauncherSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            graphql_paths: None,
            internal_host: default_internal_host(),
            listen: ListenSettings::default(),
            launcher: LauncherSettings::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    SETTINGS_VERSION
}
fn default_internal_host() -> String {
    DEFAULT_INTERNAL_HOST.to_string()
}
fn default_binary() -> String {
    PROXY_BINARY.to_string()
}
fn default_api_key_env() -> String {
    PROXY_API_KEY_ENV.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl EngineSettings {
    /// Per-user settings directory for the named application.
    #[track_caller]
    pub fn default_dir(app_name: &str) -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(app_name))
            .ok_or_else(|| SettingsError::NoConfigDirectory {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("platform reports no configuration directory"),
            })
    }

    /// Load settings from `{dir}/engine.json`.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read,
    /// parsed or validated is an error: silently ignoring it would start the
    /// proxy with settings the operator did not ask for.
    pub fn load(dir: &Path) -> Result<Self, SettingsError> {
        let settings_path = dir.join(SETTINGS_FILE_NAME);

        if !settings_path.exists() {
            info!(
                "Settings file not found at {}, using defaults",
                settings_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
            warn!("Failed to read settings file: {e}");
            SettingsError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                source: e,
            }
        })?;

        let settings: EngineSettings = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse settings JSON: {e}");
            SettingsError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                reason: e.to_string(),
            }
        })?;

        settings.validate()?;

        info!("Settings loaded from {}", settings_path.display());
        Ok(settings)
    }

    /// Save settings to `{dir}/engine.json` via temp file + rename.
    pub fn save(&self, dir: &Path) -> Result<(), SettingsError> {
        self.validate()?;

        std::fs::create_dir_all(dir).map_err(|e| SettingsError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: dir.to_path_buf(),
            source: e,
        })?;

        let settings_path = dir.join(SETTINGS_FILE_NAME);
        let temp_path = dir.join(format!("{SETTINGS_FILE_NAME}.tmp"));

        let json =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::SerializeError {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })?;

        std::fs::write(&temp_path, json).map_err(|e| SettingsError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &settings_path).map_err(|e| SettingsError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: settings_path.clone(),
            source: e,
        })?;

        info!("Settings saved to {}", settings_path.display());
        Ok(())
    }

    /// Validate settings values.
    ///
    /// Listen targets are not checked here; they go through the same
    /// normalizer as runtime arguments when a session listens.
    #[track_caller]
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.version == 0 || self.version > SETTINGS_VERSION {
            return Err(SettingsError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{SETTINGS_VERSION})",
                    self.version
                ),
            });
        }

        if self.internal_host.trim().is_empty() {
            return Err(SettingsError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("internal_host cannot be empty"),
            });
        }

        if let Some(ref paths) = self.graphql_paths {
            if paths.is_empty() {
                return Err(SettingsError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: String::from("graphql_paths cannot be an empty list"),
                });
            }

            if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
                return Err(SettingsError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("GraphQL path must start with '/': {bad}"),
                });
            }
        }

        if self.launcher.binary.is_empty() {
            return Err(SettingsError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("launcher.binary cannot be empty"),
            });
        }

        Ok(())
    }
}
