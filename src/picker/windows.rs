// =============================================================================
// COLOR PICKER - BACKEND WINDOWS
// COLOR PICKER - WINDOWS BACKEND
// =============================================================================
// GetCursorPos pour la position, GetPixel sur le DC de l'écran pour la couleur
// GetCursorPos for the position, GetPixel on the screen DC for the color
// =============================================================================

use windows::Win32::{
    Foundation::{ERROR_ACCESS_DENIED, HWND, POINT}, // Types de base / Basic types
    Graphics::Gdi::{GetDC, GetPixel, ReleaseDC},     // DC écran / Screen DC
    UI::WindowsAndMessaging::GetCursorPos,           // Position du curseur / Cursor position
};

use super::common::rgb_from_colorref;
use super::{CursorPosition, PixelSampler};
use crate::color::Rgb;
use crate::error::SamplerError;

/// Valeur renvoyée par GetPixel en cas d'échec
/// Value returned by GetPixel on failure
const CLR_INVALID: u32 = 0xFFFF_FFFF;

pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelSampler for WindowsBackend {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError> {
        let mut pt = POINT::default();
        // SAFETY: `pt` is a valid, writable POINT for the duration of the call.
        unsafe { GetCursorPos(&mut pt) }.map_err(|e| {
            // Bureau sécurisé (UAC, écran verrouillé) / Secure desktop (UAC, lock screen)
            if e.code() == ERROR_ACCESS_DENIED.to_hresult() {
                SamplerError::PermissionDenied("cursor is on a secure desktop".to_string())
            } else {
                SamplerError::Capture(format!("GetCursorPos failed: {e}"))
            }
        })?;
        Ok(CursorPosition::new(pt.x, pt.y))
    }

    fn pixel_color_at(&mut self, position: CursorPosition) -> Result<Rgb, SamplerError> {
        // SAFETY: the screen DC is acquired and released within this block and
        // never escapes it.
        let color = unsafe {
            let hdc = GetDC(HWND::default()); // DC de l'écran / Screen DC
            if hdc.is_invalid() {
                return Err(SamplerError::BackendUnavailable("GetDC returned no screen DC".to_string()));
            }
            let color = GetPixel(hdc, position.x, position.y);
            let _ = ReleaseDC(HWND::default(), hdc); // Libère le DC / Release the DC
            color
        };

        if color.0 == CLR_INVALID {
            return Err(SamplerError::Capture(format!("GetPixel failed at {position}")));
        }
        Ok(rgb_from_colorref(color.0))
    }
}
