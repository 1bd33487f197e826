// =============================================================================
// ycbcr.rs - Luma/chroma ITU-R BT.601 (pleine échelle)
// ycbcr.rs - ITU-R BT.601 luma/chroma (full range)
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ColorModel, Rgb};
use crate::error::ColorError;

/// Décalage des composantes de chrominance
/// Chroma component offset
const CHROMA_OFFSET: f64 = 128.0;

/// Full-range (JFIF) BT.601 YCbCr, quantized to 8 bits per component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YCbCr {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
}

impl YCbCr {
    pub const fn new(y: u8, cb: u8, cr: u8) -> Self {
        Self { y, cb, cr }
    }
}

/// Rounds half away from zero, then saturates (Cb/Cr peak at 255.5).
#[inline]
fn quantize(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl ColorModel for YCbCr {
    const LABEL: &'static str = "YCbCr";

    fn from_rgb(rgb: Rgb) -> Self {
        let (r, g, b) = (f64::from(rgb.r), f64::from(rgb.g), f64::from(rgb.b));
        Self {
            y: quantize(0.299 * r + 0.587 * g + 0.114 * b),
            cb: quantize(CHROMA_OFFSET - 0.168_736 * r - 0.331_264 * g + 0.5 * b),
            cr: quantize(CHROMA_OFFSET + 0.5 * r - 0.418_688 * g - 0.081_312 * b),
        }
    }

    /// Every 8-bit triple is in domain; combinations outside the RGB cube
    /// saturate per channel.
    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        let y = f64::from(self.y);
        let cb = f64::from(self.cb) - CHROMA_OFFSET;
        let cr = f64::from(self.cr) - CHROMA_OFFSET;
        Ok(Rgb::new(
            quantize(y + 1.402 * cr),
            quantize(y - 0.344_136 * cb - 0.714_136 * cr),
            quantize(y + 1.772 * cb),
        ))
    }
}

impl fmt::Display for YCbCr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YCbCr({}, {}, {})", self.y, self.cb, self.cr)
    }
}
