// =============================================================================
// picker/mod.rs - Échantillonnage du pixel sous le curseur
// picker/mod.rs - Sampling the pixel under the cursor
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::color::Rgb;
use crate::error::SamplerError;

/// Code commun entre plateformes (processus, décodage de pixels)
/// Common code between platforms (processes, pixel decoding)
pub mod common;

/// Échantillonneur scripté pour les tests
/// Scripted sampler for tests
pub mod scripted;

/// Implémentation macOS
/// macOS implementation
#[cfg(target_os = "macos")]
pub mod macos;

/// Implémentation Windows
/// Windows implementation
#[cfg(target_os = "windows")]
pub mod windows;

/// Implémentation Linux (xdotool + ImageMagick)
/// Linux implementation (xdotool + ImageMagick)
#[cfg(target_os = "linux")]
pub mod linux;

// =============================================================================
// TYPES
// =============================================================================

/// Position du curseur en coordonnées écran
/// Cursor position in screen coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: i32,
    pub y: i32,
}

impl CursorPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One pointer position and the color found there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub position: CursorPosition,
    pub rgb: Rgb,
}

/// Capacité d'échantillonnage, une implémentation par plateforme
/// Sampling capability, one implementation per platform
///
/// Both operations are synchronous. They must not change display state,
/// the clipboard or input focus.
pub trait PixelSampler: Send {
    fn name(&self) -> &'static str;

    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError>;

    fn pixel_color_at(&mut self, position: CursorPosition) -> Result<Rgb, SamplerError>;

    /// Position then color, as one sampling step.
    fn sample(&mut self) -> Result<Sample, SamplerError> {
        let position = self.cursor_position()?;
        let rgb = self.pixel_color_at(position)?;
        Ok(Sample { position, rgb })
    }
}

impl<T: PixelSampler + ?Sized> PixelSampler for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError> {
        (**self).cursor_position()
    }

    fn pixel_color_at(&mut self, position: CursorPosition) -> Result<Rgb, SamplerError> {
        (**self).pixel_color_at(position)
    }

    fn sample(&mut self) -> Result<Sample, SamplerError> {
        (**self).sample()
    }
}

// =============================================================================
// SÉLECTION DU BACKEND
// BACKEND SELECTION
// =============================================================================

/// Variantes de backend
/// Backend variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Windows,
    #[serde(rename = "macos")]
    #[value(name = "macos")]
    Mac,
    Linux,
}

impl BackendKind {
    /// Backend pour la plateforme de compilation
    /// Backend for the compile target
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(BackendKind::Windows)
        } else if cfg!(target_os = "macos") {
            Some(BackendKind::Mac)
        } else if cfg!(target_os = "linux") {
            Some(BackendKind::Linux)
        } else {
            None
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Windows => "windows",
            BackendKind::Mac => "macos",
            BackendKind::Linux => "linux",
        })
    }
}

/// Construit le backend demandé. Le choix est fait une fois au démarrage.
/// Builds the requested backend. The choice is made once at startup.
///
/// `timeout` bounds each external process a backend may launch.
pub fn open(
    kind: BackendKind,
    #[cfg_attr(not(target_os = "linux"), allow(unused_variables))] timeout: Duration,
) -> Result<Box<dyn PixelSampler>, SamplerError> {
    match kind {
        #[cfg(target_os = "windows")]
        BackendKind::Windows => Ok(Box::new(windows::WindowsBackend::new())),

        #[cfg(target_os = "macos")]
        BackendKind::Mac => Ok(Box::new(macos::MacBackend::new())),

        #[cfg(target_os = "linux")]
        BackendKind::Linux => Ok(Box::new(linux::LinuxBackend::new(timeout)?)),

        #[allow(unreachable_patterns)]
        other => Err(SamplerError::BackendUnavailable(format!(
            "the {other} backend is not built for this platform"
        ))),
    }
}

/// Vérifie les prérequis de la plateforme sans échantillonner
/// Checks platform requirements without sampling
///
/// Returns one human-readable line per problem; empty when ready.
pub fn missing_requirements(kind: BackendKind) -> Vec<String> {
    match kind {
        #[cfg(target_os = "windows")]
        BackendKind::Windows => Vec::new(),

        #[cfg(target_os = "macos")]
        BackendKind::Mac => macos::missing_requirements(),

        #[cfg(target_os = "linux")]
        BackendKind::Linux => linux::missing_requirements(),

        #[allow(unreachable_patterns)]
        other => vec![format!("the {other} backend is not built for this platform")],
    }
}

// =============================================================================
// ÉCHANTILLONNEUR BORNÉ DANS LE TEMPS
// TIME-BOUNDED SAMPLER
// =============================================================================

enum Request {
    Cursor,
    Pixel(CursorPosition),
    Sample,
}

enum Reply {
    Cursor(Result<CursorPosition, SamplerError>),
    Pixel(Result<Rgb, SamplerError>),
    Sample(Result<Sample, SamplerError>),
}

/// Runs a backend on its own worker thread and bounds every call.
///
/// At most one request is outstanding. When a call times out, the worker is
/// left to finish it; until it does, further calls fail fast with
/// `SamplerError::Timeout` instead of queueing behind it. A late reply is
/// discarded.
pub struct TimedSampler {
    name: &'static str,
    timeout: Duration,
    requests: Option<mpsc::Sender<Request>>,
    replies: mpsc::Receiver<Reply>,
    outstanding: bool,
}

impl TimedSampler {
    pub fn spawn(mut backend: Box<dyn PixelSampler>, timeout: Duration) -> Self {
        let name = backend.name();
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        let spawned = thread::Builder::new()
            .name(format!("sampler-{name}"))
            .spawn(move || {
                // Se termine quand l'émetteur est libéré
                // Ends when the sender is dropped
                while let Ok(request) = request_rx.recv() {
                    let reply = match request {
                        Request::Cursor => Reply::Cursor(backend.cursor_position()),
                        Request::Pixel(position) => Reply::Pixel(backend.pixel_color_at(position)),
                        Request::Sample => Reply::Sample(backend.sample()),
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                tracing::debug!(backend = name, "Sampler worker stopped");
            });
        // Sans worker, chaque appel échoue avec BackendUnavailable
        // Without a worker, every call fails with BackendUnavailable
        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to spawn sampler worker");
        }

        Self {
            name,
            timeout,
            requests: Some(request_tx),
            replies: reply_rx,
            outstanding: false,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn worker_gone() -> SamplerError {
        SamplerError::BackendUnavailable("sampler worker is not running".to_string())
    }

    fn call(&mut self, request: Request) -> Result<Reply, SamplerError> {
        if self.outstanding {
            match self.replies.try_recv() {
                Ok(_) => {
                    tracing::debug!(backend = self.name, "Discarding late sampler reply");
                    self.outstanding = false;
                }
                Err(TryRecvError::Empty) => return Err(SamplerError::Timeout(self.timeout)),
                Err(TryRecvError::Disconnected) => return Err(Self::worker_gone()),
            }
        }

        let requests = self.requests.as_ref().ok_or_else(Self::worker_gone)?;
        requests.send(request).map_err(|_| Self::worker_gone())?;
        self.outstanding = true;

        match self.replies.recv_timeout(self.timeout) {
            Ok(reply) => {
                self.outstanding = false;
                Ok(reply)
            }
            Err(RecvTimeoutError::Timeout) => Err(SamplerError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                self.outstanding = false;
                Err(Self::worker_gone())
            }
        }
    }

    fn mismatched() -> SamplerError {
        SamplerError::Capture("sampler worker answered a different request".to_string())
    }
}

impl PixelSampler for TimedSampler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError> {
        match self.call(Request::Cursor)? {
            Reply::Cursor(result) => result,
            _ => Err(Self::mismatched()),
        }
    }

    fn pixel_color_at(&mut self, position: CursorPosition) -> Result<Rgb, SamplerError> {
        match self.call(Request::Pixel(position))? {
            Reply::Pixel(result) => result,
            _ => Err(Self::mismatched()),
        }
    }

    fn sample(&mut self) -> Result<Sample, SamplerError> {
        match self.call(Request::Sample)? {
            Reply::Sample(result) => result,
            _ => Err(Self::mismatched()),
        }
    }
}

impl Drop for TimedSampler {
    fn drop(&mut self) {
        // Libère l'émetteur : le worker sort de sa boucle sans être attendu
        // Drop the sender: the worker leaves its loop without being joined
        self.requests.take();
    }
}

// =============================================================================
// TESTS
// =============================================================================
