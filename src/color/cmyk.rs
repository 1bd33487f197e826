// =============================================================================
// cmyk.rs - Modèle soustractif CMJN
// cmyk.rs - Subtractive CMYK model
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{check_unit, percent, ColorModel, Rgb};
use crate::error::ColorError;

/// Cyan, magenta, jaune, noir (0.0..=1.0)
/// Cyan, magenta, yellow, key (0.0..=1.0)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

impl Cmyk {
    pub fn new(c: f64, m: f64, y: f64, k: f64) -> Result<Self, ColorError> {
        let cmyk = Self { c, m, y, k };
        cmyk.validate()?;
        Ok(cmyk)
    }

    fn validate(&self) -> Result<(), ColorError> {
        check_unit(Self::LABEL, "cyan", self.c)?;
        check_unit(Self::LABEL, "magenta", self.m)?;
        check_unit(Self::LABEL, "yellow", self.y)?;
        check_unit(Self::LABEL, "key", self.k)
    }
}

impl ColorModel for Cmyk {
    const LABEL: &'static str = "CMYK";

    fn from_rgb(rgb: Rgb) -> Self {
        let [r, g, b] = rgb.to_unit();
        let k = 1.0 - r.max(g).max(b);

        // Noir pur : évite la division par zéro
        // Pure black: avoid division by zero
        if k == 1.0 {
            return Self { c: 0.0, m: 0.0, y: 0.0, k };
        }

        let ink = |channel: f64| ((1.0 - channel - k) / (1.0 - k)).clamp(0.0, 1.0);
        Self {
            c: ink(r),
            m: ink(g),
            y: ink(b),
            k,
        }
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        let white = 1.0 - self.k;
        Ok(Rgb::from_unit(
            (1.0 - self.c) * white,
            (1.0 - self.m) * white,
            (1.0 - self.y) * white,
        ))
    }
}

impl fmt::Display for Cmyk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CMYK({}%, {}%, {}%, {}%)",
            percent(self.c),
            percent(self.m),
            percent(self.y),
            percent(self.k)
        )
    }
}
