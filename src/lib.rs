// =============================================================================
// lib.rs - Pipette d'écran : échantillonnage et conversion des couleurs
// lib.rs - Screen color probe: sampling and color conversion
// =============================================================================

// =============================================================================
// MODULES
// =============================================================================

/// Conversion entre modèles de couleur
/// Conversion between color models
pub mod color;

/// Configuration partagée (constantes et paramètres)
/// Shared configuration (constants and settings)
pub mod config;

/// Machine à états Active / Frozen
/// Active / Frozen state machine
pub mod controller;

/// Types d'erreur
/// Error types
pub mod error;

/// Lecture et écriture des palettes JSON
/// JSON palette read and write
pub mod palette;

/// Échantillonnage du pixel sous le curseur, un backend par plateforme
/// Sampling the pixel under the cursor, one backend per platform
pub mod picker;

/// Boucle d'échantillonnage et poignée de commande
/// Sampling loop and command handle
pub mod service;

/// Historique borné des couleurs capturées
/// Bounded history of captured colors
pub mod store;

pub use color::{ColorModel, ColorModelSet, Rgb};
pub use controller::{Reading, SamplerStatus, SamplingController, SamplingState};
pub use error::{ColorError, ConfigError, PaletteError, SamplerError, ServiceError};
pub use picker::{BackendKind, CursorPosition, PixelSampler, TimedSampler};
pub use service::{SamplingHandle, SamplingService, Snapshot};
pub use store::{CaptureOutcome, HistoryEntry, HistoryStore};
