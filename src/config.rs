//! Configuration constants and runtime settings
//!
//! The constants are the compiled-in defaults. `Settings` can override them
//! from `<config dir>/colorprobe/config.toml`, and command-line flags
//! override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::picker::BackendKind;

/// Interval between two samples (in milliseconds)
/// 50 ms = 20 updates per second
pub const DEFAULT_TICK_MS: u64 = 50;

/// Maximum time one sampler call may take (in milliseconds)
/// Temps maximum d'un appel à l'échantillonneur (en millisecondes)
pub const DEFAULT_SAMPLER_TIMEOUT_MS: u64 = 200;

/// Number of captured colors kept in history
/// The oldest entry is evicted once this is reached
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Upper bound accepted for the sampler timeout
pub const MAX_SAMPLER_TIMEOUT_MS: u64 = 5_000;

/// Consecutive failures after which a warning is logged
/// Échecs consécutifs avant d'émettre un avertissement
pub const FAILURE_STREAK_WARNING: u32 = 20;

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "colorprobe";

/// Settings file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// PARAMÈTRES
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tick_ms: u64,
    pub sampler_timeout_ms: u64,
    pub history_capacity: usize,
    /// Forces a backend instead of the one detected for the platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            sampler_timeout_ms: DEFAULT_SAMPLER_TIMEOUT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            backend: None,
        }
    }
}

impl Settings {
    /// Chemin du fichier de configuration, s'il existe un dossier de config
    /// Settings file path, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), ?settings, "Loaded settings");
        Ok(settings)
    }

    /// Loads from the default location, or the defaults when there is none.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Writes through a temporary file then renames it over `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, content).map_err(io_error)?;
        fs::rename(&temp_path, path).map_err(io_error)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.sampler_timeout_ms == 0 || self.sampler_timeout_ms > MAX_SAMPLER_TIMEOUT_MS {
            return Err(ConfigError::Invalid {
                field: "sampler_timeout_ms",
                reason: format!("must be between 1 and {MAX_SAMPLER_TIMEOUT_MS}"),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "history_capacity",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn sampler_timeout(&self) -> Duration {
        Duration::from_millis(self.sampler_timeout_ms)
    }

    /// Backend forcé ou détecté
    /// Forced or detected backend
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.or_else(BackendKind::detect)
    }
}
