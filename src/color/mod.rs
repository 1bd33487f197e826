//! =============================================================================
//! color - Moteur de conversion entre modèles de couleur
//! color - Conversion engine between color models
//! =============================================================================
//!
//! Toutes les conversions partent d'une valeur `Rgb` 8 bits et y reviennent.
//! Every conversion starts from an 8-bit `Rgb` value and maps back to it.
//!
//! Forward conversions (`X::from(rgb)`) never fail. Inverse conversions
//! (`Rgb::try_from(x)`) reject components outside the model's domain with
//! [`ColorError::InvalidColorValue`] instead of clamping them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ColorError;

mod cie;
mod cmyk;
mod cylindrical;
mod ycbcr;

pub use cie::{Lab, Lch, Xyz, D65_WHITE};
pub use cmyk::Cmyk;
pub use cylindrical::{Hsi, Hsl, Hsv};
pub use ycbcr::YCbCr;

// =============================================================================
// RGB
// =============================================================================

/// Couleur RGB 8 bits par canal
/// 8-bit per channel RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from wider integers, rejecting channels outside 0..=255.
    pub fn from_channels(r: i64, g: i64, b: i64) -> Result<Self, ColorError> {
        let channel = |name: &'static str, value: i64| {
            u8::try_from(value)
                .map_err(|_| ColorError::invalid("RGB", name, value as f64, "0..=255"))
        };
        Ok(Self::new(channel("red", r)?, channel("green", g)?, channel("blue", b)?))
    }

    /// Channels normalized to 0.0..=1.0.
    pub fn to_unit(self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }

    /// Quantizes derived unit channels. Derived values slightly outside the
    /// gamut are brought back in; this is never applied to caller input.
    pub(crate) fn from_unit(r: f64, g: f64, b: f64) -> Self {
        Self::new(unit_to_channel(r), unit_to_channel(g), unit_to_channel(b))
    }

    /// Formate en "#RRGGBB"
    /// Formats as "#RRGGBB"
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Luminance BT.601 entre 0.0 (noir) et 255.0 (blanc)
    /// BT.601 luminance between 0.0 (black) and 255.0 (white)
    pub fn luminance(self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }

    /// `true` si un texte noir est plus lisible sur cette couleur
    /// `true` if black text reads better on this color
    pub fn prefers_dark_text(self) -> bool {
        self.luminance() > 128.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    /// Parses `#RRGGBB` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError::InvalidHex(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

// =============================================================================
// TRAIT COMMUN
// COMMON TRAIT
// =============================================================================

/// A color model with a forward mapping from RGB and a checked inverse.
pub trait ColorModel: Copy + fmt::Display {
    /// Libellé affiché (ex. "HSL", "CIE LAB")
    /// Display label (e.g. "HSL", "CIE LAB")
    const LABEL: &'static str;

    fn from_rgb(rgb: Rgb) -> Self;

    /// Fails with `InvalidColorValue` when a component is out of domain.
    fn to_rgb(&self) -> Result<Rgb, ColorError>;
}

/// Implements `From<Rgb>` and `TryFrom<Model> for Rgb` on top of `ColorModel`.
macro_rules! impl_rgb_conversions {
    ($($model:ty),+ $(,)?) => {
        $(
            impl From<Rgb> for $model {
                fn from(rgb: Rgb) -> Self {
                    <$model as ColorModel>::from_rgb(rgb)
                }
            }

            impl TryFrom<$model> for Rgb {
                type Error = ColorError;

                fn try_from(value: $model) -> Result<Self, Self::Error> {
                    value.to_rgb()
                }
            }
        )+
    };
}

impl_rgb_conversions!(Hsl, Hsv, Hsi, Cmyk, Xyz, Lab, Lch, YCbCr);

// =============================================================================
// ENSEMBLE DES MODÈLES
// MODEL SET
// =============================================================================

/// One reading in every supported representation, derived from one `Rgb`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorModelSet {
    pub rgb: Rgb,
    pub hsl: Hsl,
    pub hsv: Hsv,
    pub hsi: Hsi,
    pub cmyk: Cmyk,
    pub lab: Lab,
    pub lch: Lch,
    pub xyz: Xyz,
    pub ycbcr: YCbCr,
}

impl From<Rgb> for ColorModelSet {
    fn from(rgb: Rgb) -> Self {
        let xyz = Xyz::from(rgb);
        let lab = Lab::from(xyz);
        Self {
            rgb,
            hsl: Hsl::from(rgb),
            hsv: Hsv::from(rgb),
            hsi: Hsi::from(rgb),
            cmyk: Cmyk::from(rgb),
            lab,
            lch: Lch::from(lab),
            xyz,
            ycbcr: YCbCr::from(rgb),
        }
    }
}

impl ColorModelSet {
    pub fn hex(&self) -> String {
        self.rgb.to_hex()
    }

    /// Paires (libellé, texte) dans l'ordre d'affichage
    /// (label, text) pairs in display order
    pub fn labeled_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("HEX/HTML", self.hex()),
            ("RGB", self.rgb.to_string()),
            (Hsl::LABEL, self.hsl.to_string()),
            (Hsv::LABEL, self.hsv.to_string()),
            (Hsi::LABEL, self.hsi.to_string()),
            (Cmyk::LABEL, self.cmyk.to_string()),
            (Lab::LABEL, self.lab.to_string()),
            (Lch::LABEL, self.lch.to_string()),
            (YCbCr::LABEL, self.ycbcr.to_string()),
            (Xyz::LABEL, self.xyz.to_string()),
        ]
    }
}

// =============================================================================
// FONCTIONS UTILITAIRES
// UTILITY FUNCTIONS
// =============================================================================

#[inline]
pub(crate) fn unit_to_channel(value: f64) -> u8 {
    // f64::round arrondit à l'écart de zéro / f64::round rounds half away from zero
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rounds half away from zero for display; `i64` avoids printing "-0".
#[inline]
pub(crate) fn rounded(value: f64) -> i64 {
    value.round() as i64
}

#[inline]
pub(crate) fn percent(value: f64) -> i64 {
    rounded(value * 100.0)
}

/// Hue rounded for display, with 360° folded back to 0°.
#[inline]
pub(crate) fn degrees(value: f64) -> i64 {
    rounded(value).rem_euclid(360)
}

/// Brings a computed hue into [0, 360).
pub(crate) fn normalize_hue(hue: f64) -> f64 {
    let hue = hue.rem_euclid(360.0);
    if hue >= 360.0 {
        0.0
    } else {
        hue
    }
}

pub(crate) fn check_unit(model: &'static str, component: &'static str, value: f64) -> Result<(), ColorError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ColorError::invalid(model, component, value, "0..=1"))
    }
}

pub(crate) fn check_hue(model: &'static str, value: f64) -> Result<(), ColorError> {
    if value.is_finite() && (0.0..360.0).contains(&value) {
        Ok(())
    } else {
        Err(ColorError::invalid(model, "hue", value, "0..360"))
    }
}

pub(crate) fn check_range(
    model: &'static str,
    component: &'static str,
    value: f64,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<(), ColorError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ColorError::invalid(model, component, value, expected))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Grid over the RGB cube, stepping 5 so 255 is always included.
    pub(crate) fn rgb_grid() -> impl Iterator<Item = Rgb> {
        (0..=255u8).step_by(5).flat_map(|r| {
            (0..=255u8)
                .step_by(5)
                .flat_map(move |g| (0..=255u8).step_by(5).map(move |b| Rgb::new(r, g, b)))
        })
    }

    fn assert_round_trip<M: ColorModel>() {
        let extra = [
            Rgb::new(1, 2, 3),
            Rgb::new(254, 1, 128),
            Rgb::new(17, 200, 99),
            Rgb::new(128, 128, 127),
        ];
        for rgb in rgb_grid().chain(extra) {
            let model = M::from_rgb(rgb);
            let back = model
                .to_rgb()
                .unwrap_or_else(|e| panic!("{} rejected its own output for {rgb}: {e}", M::LABEL));
            let close = |a: u8, b: u8| (i16::from(a) - i16::from(b)).abs() <= 1;
            assert!(
                close(rgb.r, back.r) && close(rgb.g, back.g) && close(rgb.b, back.b),
                "{} round trip drifted: {rgb} -> {model} -> {back}",
                M::LABEL
            );
        }
    }

    /// Every color on the six faces of the RGB cube (where a channel is 0 or
    /// 255), then the interior stepping 3.
    fn dense_rgb_cube() -> impl Iterator<Item = Rgb> {
        let all = || 0..=255u8;
        let faces = [0u8, 255].into_iter().flat_map(move |edge| {
            all().flat_map(move |a| {
                all().flat_map(move |b| {
                    [
                        Rgb::new(edge, a, b),
                        Rgb::new(a, edge, b),
                        Rgb::new(a, b, edge),
                    ]
                })
            })
        });
        let interior = (1..=254u8).step_by(3).flat_map(|r| {
            (1..=254u8)
                .step_by(3)
                .flat_map(move |g| (1..=254u8).step_by(3).map(move |b| Rgb::new(r, g, b)))
        });
        faces.chain(interior)
    }

    fn assert_accepts_own_output<M: ColorModel>() {
        for rgb in dense_rgb_cube() {
            let model = M::from_rgb(rgb);
            if let Err(e) = model.to_rgb() {
                panic!("{} rejected its own output for {rgb} ({model}): {e}", M::LABEL);
            }
        }
    }

    #[test]
    fn test_every_model_accepts_its_own_output() {
        assert_accepts_own_output::<Hsl>();
        assert_accepts_own_output::<Hsv>();
        assert_accepts_own_output::<Hsi>();
        assert_accepts_own_output::<Cmyk>();
        assert_accepts_own_output::<Xyz>();
        assert_accepts_own_output::<Lab>();
        assert_accepts_own_output::<Lch>();
        assert_accepts_own_output::<YCbCr>();
    }

    #[test]
    fn test_white_round_trips_in_every_model() {
        let set = ColorModelSet::from(Rgb::WHITE);
        assert_eq!(Rgb::try_from(set.hsl), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.hsv), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.hsi), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.cmyk), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.xyz), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.lab), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.lch), Ok(Rgb::WHITE));
        assert_eq!(Rgb::try_from(set.ycbcr), Ok(Rgb::WHITE));
    }

    #[test]
    fn test_round_trip_hsl() {
        assert_round_trip::<Hsl>();
    }

    #[test]
    fn test_round_trip_hsv() {
        assert_round_trip::<Hsv>();
    }

    #[test]
    fn test_round_trip_hsi() {
        assert_round_trip::<Hsi>();
    }

    #[test]
    fn test_round_trip_cmyk() {
        assert_round_trip::<Cmyk>();
    }

    #[test]
    fn test_round_trip_xyz() {
        assert_round_trip::<Xyz>();
    }

    #[test]
    fn test_round_trip_lab() {
        assert_round_trip::<Lab>();
    }

    #[test]
    fn test_round_trip_lch() {
        assert_round_trip::<Lch>();
    }

    #[test]
    fn test_round_trip_ycbcr() {
        assert_round_trip::<YCbCr>();
    }

    #[test]
    fn test_achromatic_hue_is_zero() {
        for v in [0u8, 1, 64, 128, 200, 255] {
            let set = ColorModelSet::from(Rgb::new(v, v, v));
            assert_eq!(set.hsl.h, 0.0, "HSL hue for gray {v}");
            assert_eq!(set.hsv.h, 0.0, "HSV hue for gray {v}");
            assert_eq!(set.hsi.h, 0.0, "HSI hue for gray {v}");
            assert_eq!(set.lch.h, 0.0, "LCh hue for gray {v}");
        }
    }

    #[test]
    fn test_black_is_zero_everywhere() {
        let set = ColorModelSet::from(Rgb::BLACK);
        assert_eq!((set.hsl.h, set.hsl.s, set.hsl.l), (0.0, 0.0, 0.0));
        assert_eq!((set.hsv.h, set.hsv.s, set.hsv.v), (0.0, 0.0, 0.0));
        assert_eq!((set.hsi.h, set.hsi.s, set.hsi.i), (0.0, 0.0, 0.0));
        assert_eq!((set.cmyk.c, set.cmyk.m, set.cmyk.y, set.cmyk.k), (0.0, 0.0, 0.0, 1.0));
        assert_eq!((set.xyz.x, set.xyz.y, set.xyz.z), (0.0, 0.0, 0.0));
        assert!(set.lab.l.abs() < 1e-9);
        assert!(set.lab.a.abs() < 1e-9 && set.lab.b.abs() < 1e-9);
        assert!(set.lch.c.abs() < 1e-9);
        assert_eq!((set.ycbcr.y, set.ycbcr.cb, set.ycbcr.cr), (0, 128, 128));
    }

    #[test]
    fn test_white_boundaries() {
        let set = ColorModelSet::from(Rgb::WHITE);
        assert_eq!((set.hsl.h, set.hsl.s, set.hsl.l), (0.0, 0.0, 1.0));
        assert_eq!((set.hsv.h, set.hsv.s, set.hsv.v), (0.0, 0.0, 1.0));
        assert_eq!(set.cmyk.k, 0.0);
        assert!((set.lab.l - 100.0).abs() < 1e-6);
        assert_eq!((set.ycbcr.y, set.ycbcr.cb, set.ycbcr.cr), (255, 128, 128));
    }

    #[test]
    fn test_from_channels_rejects_out_of_range() {
        assert_eq!(Rgb::from_channels(1, 2, 3), Ok(Rgb::new(1, 2, 3)));
        assert!(matches!(
            Rgb::from_channels(256, 0, 0),
            Err(ColorError::InvalidColorValue { component: "red", .. })
        ));
        assert!(matches!(
            Rgb::from_channels(0, 0, -1),
            Err(ColorError::InvalidColorValue { component: "blue", .. })
        ));
    }

    #[test]
    fn test_hex_parse_and_format() {
        assert_eq!("#FF0080".parse::<Rgb>(), Ok(Rgb::new(255, 0, 128)));
        assert_eq!("00ff7f".parse::<Rgb>(), Ok(Rgb::new(0, 255, 127)));
        assert!("#FFF".parse::<Rgb>().is_err());
        assert!("#GG0000".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(255, 0, 128).to_hex(), "#FF0080");
        assert_eq!(Rgb::BLACK.to_hex(), "#000000");
    }

    #[test]
    fn test_luminance() {
        // Noir / Black
        assert!((Rgb::BLACK.luminance() - 0.0).abs() < 0.001);
        // Blanc / White
        assert!((Rgb::WHITE.luminance() - 255.0).abs() < 0.001);
        // Rouge pur / Pure red
        assert!((Rgb::new(255, 0, 0).luminance() - 76.245).abs() < 0.001);
    }

    #[test]
    fn test_dark_text() {
        assert!(Rgb::WHITE.prefers_dark_text());
        assert!(!Rgb::BLACK.prefers_dark_text());
    }

    #[test]
    fn test_labeled_values_for_red() {
        let values = ColorModelSet::from(Rgb::new(255, 0, 0)).labeled_values();
        let labels: Vec<&str> = values.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            ["HEX/HTML", "RGB", "HSL", "HSV", "HSI", "CMYK", "CIE LAB", "CIELCh", "YCbCr", "CIE XYZ"]
        );
        let text: Vec<&str> = values.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(text[0], "#FF0000");
        assert_eq!(text[1], "RGB(255, 0, 0)");
        assert_eq!(text[2], "HSL(0°, 100%, 50%)");
        assert_eq!(text[3], "HSV(0°, 100%, 100%)");
        assert_eq!(text[4], "HSI(0°, 100%, 33%)");
        assert_eq!(text[5], "CMYK(0%, 100%, 100%, 0%)");
        assert_eq!(text[6], "CIE LAB(53, 80, 67)");
        assert_eq!(text[7], "CIELCh(53, 105, 40°)");
        assert_eq!(text[8], "YCbCr(76, 85, 255)");
        assert_eq!(text[9], "CIE XYZ(41, 21, 2)");
    }

    #[test]
    fn test_normalize_hue() {
        assert_eq!(normalize_hue(360.0), 0.0);
        assert_eq!(normalize_hue(-30.0), 330.0);
        assert_eq!(normalize_hue(45.0), 45.0);
        assert_eq!(degrees(359.6), 0);
    }
}
