// =============================================================================
// error.rs - Types d'erreur de la bibliothèque
// error.rs - Library error types
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Erreurs du moteur de conversion
/// Conversion engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    /// A component lies outside the valid domain of its model.
    #[error("Invalid {model} value: {component} = {value} (expected {expected})")]
    InvalidColorValue {
        model: &'static str,
        component: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("Invalid hex color: {0:?} (expected #RRGGBB)")]
    InvalidHex(String),
}

impl ColorError {
    pub(crate) fn invalid(
        model: &'static str,
        component: &'static str,
        value: f64,
        expected: &'static str,
    ) -> Self {
        ColorError::InvalidColorValue {
            model,
            component,
            value,
            expected,
        }
    }
}

/// Erreurs de la couche d'échantillonnage
/// Sampling layer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerError {
    /// Capture blocked by an OS privacy or accessibility policy.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A required capture facility (utility, display server) is missing.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Sampler timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend ran but returned something unusable.
    #[error("Capture failed: {0}")]
    Capture(String),
}

/// Erreurs de lecture/écriture des palettes
/// Palette read/write errors
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Palette format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Palette color error: {0}")]
    Color(#[from] ColorError),
}

/// Erreurs de configuration
/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Returned by `SamplingHandle` once the sampling loop has exited.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Sampling loop is not running")]
    Stopped,

    #[error("Cannot start sampling loop: {0}")]
    Spawn(String),
}
