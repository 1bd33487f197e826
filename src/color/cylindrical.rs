// =============================================================================
// cylindrical.rs - HSL, HSV et HSI
// cylindrical.rs - HSL, HSV and HSI
// =============================================================================

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use super::{check_hue, check_unit, degrees, normalize_hue, percent, ColorModel, Rgb};
use crate::error::ColorError;

/// Teinte, saturation, luminosité
/// Hue, saturation, lightness
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Degrees in [0, 360)
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// Teinte, saturation, valeur
/// Hue, saturation, value
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// Teinte, saturation, intensité
/// Hue, saturation, intensity
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsi {
    pub h: f64,
    pub s: f64,
    pub i: f64,
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64) -> Result<Self, ColorError> {
        let hsl = Self { h, s, l };
        hsl.validate()?;
        Ok(hsl)
    }

    fn validate(&self) -> Result<(), ColorError> {
        check_hue(Self::LABEL, self.h)?;
        check_unit(Self::LABEL, "saturation", self.s)?;
        check_unit(Self::LABEL, "lightness", self.l)
    }
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Result<Self, ColorError> {
        let hsv = Self { h, s, v };
        hsv.validate()?;
        Ok(hsv)
    }

    fn validate(&self) -> Result<(), ColorError> {
        check_hue(Self::LABEL, self.h)?;
        check_unit(Self::LABEL, "saturation", self.s)?;
        check_unit(Self::LABEL, "value", self.v)
    }
}

impl Hsi {
    pub fn new(h: f64, s: f64, i: f64) -> Result<Self, ColorError> {
        let hsi = Self { h, s, i };
        hsi.validate()?;
        Ok(hsi)
    }

    fn validate(&self) -> Result<(), ColorError> {
        check_hue(Self::LABEL, self.h)?;
        check_unit(Self::LABEL, "saturation", self.s)?;
        check_unit(Self::LABEL, "intensity", self.i)
    }
}

// =============================================================================
// DÉCOMPOSITION MAX/MIN
// MAX/MIN DECOMPOSITION
// =============================================================================

/// Max, min and chroma of unit channels.
fn extremes([r, g, b]: [f64; 3]) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    (max, min, max - min)
}

/// 60° sector hue; 0 for achromatic input.
fn sector_hue([r, g, b]: [f64; 3], max: f64, delta: f64) -> f64 {
    if delta == 0.0 {
        return 0.0;
    }
    let sector = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    normalize_hue(sector * 60.0)
}

/// Inverse of the sector decomposition: the (r, g, b) offsets for a hue and
/// chroma, before the lightness/value shift is added.
fn sector_channels(hue: f64, chroma: f64) -> (f64, f64, f64) {
    let h = hue / 60.0;
    let x = chroma * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    match h as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    }
}

// =============================================================================
// HSL
// =============================================================================

impl ColorModel for Hsl {
    const LABEL: &'static str = "HSL";

    fn from_rgb(rgb: Rgb) -> Self {
        let unit = rgb.to_unit();
        let (max, min, delta) = extremes(unit);
        let l = (max + min) / 2.0;
        let s = if delta == 0.0 {
            0.0
        } else {
            (delta / (1.0 - (2.0 * l - 1.0).abs())).clamp(0.0, 1.0)
        };
        Self {
            h: sector_hue(unit, max, delta),
            s,
            l,
        }
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        let chroma = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let (r, g, b) = sector_channels(self.h, chroma);
        let m = self.l - chroma / 2.0;
        Ok(Rgb::from_unit(r + m, g + m, b + m))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HSL({}°, {}%, {}%)", degrees(self.h), percent(self.s), percent(self.l))
    }
}

// =============================================================================
// HSV
// =============================================================================

impl ColorModel for Hsv {
    const LABEL: &'static str = "HSV";

    fn from_rgb(rgb: Rgb) -> Self {
        let unit = rgb.to_unit();
        let (max, _, delta) = extremes(unit);
        Self {
            h: sector_hue(unit, max, delta),
            s: if max == 0.0 { 0.0 } else { delta / max },
            v: max,
        }
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        let chroma = self.v * self.s;
        let (r, g, b) = sector_channels(self.h, chroma);
        let m = self.v - chroma;
        Ok(Rgb::from_unit(r + m, g + m, b + m))
    }
}

impl fmt::Display for Hsv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HSV({}°, {}%, {}%)", degrees(self.h), percent(self.s), percent(self.v))
    }
}

// =============================================================================
// HSI
// =============================================================================

impl ColorModel for Hsi {
    const LABEL: &'static str = "HSI";

    fn from_rgb(rgb: Rgb) -> Self {
        let [r, g, b] = rgb.to_unit();
        let i = (r + g + b) / 3.0;
        let min = r.min(g).min(b);
        let s = if i == 0.0 { 0.0 } else { (1.0 - min / i).clamp(0.0, 1.0) };

        let num = 0.5 * ((r - g) + (r - b));
        let den = ((r - g).powi(2) + (r - b) * (g - b)).sqrt();
        let h = if den == 0.0 {
            0.0
        } else {
            // Borne le ratio contre les erreurs d'arrondi / Bound the ratio against rounding error
            let theta = (num / den).clamp(-1.0, 1.0).acos();
            let radians = if b <= g { theta } else { 2.0 * PI - theta };
            normalize_hue(radians.to_degrees())
        };

        Self { h, s, i: i.clamp(0.0, 1.0) }
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        let (i, s) = (self.i, self.s);

        // Composante dominante d'un secteur de 120°
        // Dominant component within a 120° sector
        let lead = |h: f64| {
            let h = h.to_radians();
            i * (1.0 + s * h.cos() / (PI / 3.0 - h).cos())
        };
        let low = i * (1.0 - s);

        let (r, g, b) = if self.h < 120.0 {
            let r = lead(self.h);
            (r, 3.0 * i - (r + low), low)
        } else if self.h < 240.0 {
            let g = lead(self.h - 120.0);
            (low, g, 3.0 * i - (low + g))
        } else {
            let b = lead(self.h - 240.0);
            (3.0 * i - (low + b), low, b)
        };
        Ok(Rgb::from_unit(r, g, b))
    }
}

impl fmt::Display for Hsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HSI({}°, {}%, {}%)", degrees(self.h), percent(self.s), percent(self.i))
    }
}

// =============================================================================
// TESTS
// =============================================================================
