// =============================================================================
// COLOR PICKER - BACKEND macOS
// COLOR PICKER - macOS BACKEND
// =============================================================================
// Position du curseur via CGEvent, pixel via une capture 1x1 de CGDisplay
// Cursor position via CGEvent, pixel via a 1x1 CGDisplay capture
// =============================================================================

use core_graphics::access::ScreenCaptureAccess;
use core_graphics::display::CGDisplay;
use core_graphics::event::CGEvent;
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{kCGNullWindowID, kCGWindowImageDefault, kCGWindowListOptionOnScreenOnly};

use super::common::pixel_from_bgra;
use super::{CursorPosition, PixelSampler};
use crate::color::Rgb;
use crate::error::SamplerError;

/// Message affiché quand l'autorisation d'enregistrement d'écran manque
/// Message shown when Screen Recording permission is missing
const SCREEN_RECORDING_HINT: &str =
    "Screen Recording access is required (System Settings > Privacy & Security > Screen Recording)";

pub struct MacBackend;

impl MacBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MacBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Sans autorisation, macOS renvoie le fond d'écran au lieu des fenêtres :
/// on refuse plutôt que de publier une couleur fausse.
/// Without permission macOS returns the wallpaper instead of the windows:
/// refuse rather than publish a wrong color.
fn ensure_capture_access() -> Result<(), SamplerError> {
    if ScreenCaptureAccess.preflight() {
        Ok(())
    } else {
        Err(SamplerError::PermissionDenied(SCREEN_RECORDING_HINT.to_string()))
    }
}

impl PixelSampler for MacBackend {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError> {
        // CGEvent.location() retourne des coordonnées globales en POINTS, origine en haut à gauche
        // CGEvent.location() returns global coordinates in POINTS, origin at top-left
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| SamplerError::Capture("cannot create CGEventSource".to_string()))?;
        let event = CGEvent::new(source)
            .map_err(|_| SamplerError::Capture("cannot create CGEvent".to_string()))?;
        let point = event.location();
        Ok(CursorPosition::new(point.x.floor() as i32, point.y.floor() as i32))
    }

    fn pixel_color_at(&mut self, position: CursorPosition) -> Result<Rgb, SamplerError> {
        ensure_capture_access()?;

        // Rectangle 1x1 point autour du pixel cible
        // 1x1 point rect on the target pixel
        let rect = CGRect::new(
            &CGPoint::new(f64::from(position.x), f64::from(position.y)),
            &CGSize::new(1.0, 1.0),
        );
        let image = CGDisplay::screenshot(
            rect,
            kCGWindowListOptionOnScreenOnly,
            kCGNullWindowID,
            kCGWindowImageDefault,
        )
        .ok_or_else(|| SamplerError::Capture(format!("no screen image at {position}")))?;

        // Sur Retina l'image fait 2x2 pixels ; le premier pixel suffit
        // On Retina the image is 2x2 pixels; the first pixel is enough
        let data = image.data();
        pixel_from_bgra(&data, 0)
            .ok_or_else(|| SamplerError::Capture(format!("empty screen image at {position}")))
    }
}

pub fn missing_requirements() -> Vec<String> {
    if ScreenCaptureAccess.preflight() {
        Vec::new()
    } else {
        vec![SCREEN_RECORDING_HINT.to_string()]
    }
}
