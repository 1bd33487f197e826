//! CIE XYZ, LAB and LCh relative to the D65 white point.
//!
//! XYZ is scaled so that the reference white has Y = 100. LAB derives from
//! XYZ and LCh is the polar form of LAB.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{check_hue, check_range, degrees, normalize_hue, rounded, ColorModel, Rgb};
use crate::error::ColorError;

/// Linear sRGB to XYZ (D65), rows are X, Y, Z.
const SRGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175_0],
    [0.019_333_9, 0.119_192_0, 0.950_304_1],
];

/// Blanc de référence D65 (Y = 100), pris sur la matrice elle-même
/// D65 reference white (Y = 100), taken from the matrix itself
///
/// `Xyz::from(Rgb::WHITE)` lands on this value up to float rounding, so the
/// white passes `Xyz::validate`. The Y row sums to 1.0000001, not 1.
pub const D65_WHITE: Xyz = Xyz {
    x: (SRGB_TO_XYZ[0][0] + SRGB_TO_XYZ[0][1] + SRGB_TO_XYZ[0][2]) * 100.0,
    y: (SRGB_TO_XYZ[1][0] + SRGB_TO_XYZ[1][1] + SRGB_TO_XYZ[1][2]) * 100.0,
    z: (SRGB_TO_XYZ[2][0] + SRGB_TO_XYZ[2][1] + SRGB_TO_XYZ[2][2]) * 100.0,
};

const XYZ_TO_SRGB: [[f64; 3]; 3] = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266_0, 1.876_010_8, 0.041_556_0],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// Slack for XYZ values typed in by hand around the white point.
const XYZ_TOLERANCE: f64 = 1e-6;

/// Below this chroma the LCh hue is meaningless and reported as 0.
const ACHROMATIC_CHROMA: f64 = 1e-4;

/// δ = 6/29 from the CIE LAB definition.
const DELTA: f64 = 6.0 / 29.0;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    /// Lightness in [0, 100]
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lch {
    pub l: f64,
    /// Chroma, never negative
    pub c: f64,
    /// Hue in degrees, [0, 360)
    pub h: f64,
}

// =============================================================================
// GAMMA sRGB
// sRGB GAMMA
// =============================================================================

fn linearize(channel: f64) -> f64 {
    if channel <= 0.040_45 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

fn delinearize(linear: f64) -> f64 {
    let linear = linear.clamp(0.0, 1.0);
    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

fn multiply(matrix: &[[f64; 3]; 3], [a, b, c]: [f64; 3]) -> [f64; 3] {
    matrix.map(|row| row[0] * a + row[1] * b + row[2] * c)
}

/// XYZ (Y = 100 scale) to RGB, clamping the derived color into the sRGB gamut.
fn xyz_to_rgb(xyz: [f64; 3]) -> Rgb {
    let [r, g, b] = multiply(&XYZ_TO_SRGB, xyz.map(|v| v / 100.0));
    Rgb::from_unit(delinearize(r), delinearize(g), delinearize(b))
}

fn lab_f(t: f64) -> f64 {
    if t > DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inverse(t: f64) -> f64 {
    if t > DELTA {
        t.powi(3)
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

// =============================================================================
// XYZ
// =============================================================================

impl Xyz {
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, ColorError> {
        let xyz = Self { x, y, z };
        xyz.validate()?;
        Ok(xyz)
    }

    fn validate(&self) -> Result<(), ColorError> {
        let bound = |component, value, max, expected| {
            check_range(Self::LABEL, component, value, 0.0, max + XYZ_TOLERANCE, expected)
        };
        bound("X", self.x, D65_WHITE.x, "0..=95.047")?;
        bound("Y", self.y, D65_WHITE.y, "0..=100.00001")?;
        bound("Z", self.z, D65_WHITE.z, "0..=108.883")
    }
}

impl ColorModel for Xyz {
    const LABEL: &'static str = "CIE XYZ";

    fn from_rgb(rgb: Rgb) -> Self {
        let [x, y, z] = multiply(&SRGB_TO_XYZ, rgb.to_unit().map(linearize));
        Self {
            x: x * 100.0,
            y: y * 100.0,
            z: z * 100.0,
        }
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        Ok(xyz_to_rgb([self.x, self.y, self.z]))
    }
}

impl fmt::Display for Xyz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CIE XYZ({}, {}, {})", rounded(self.x), rounded(self.y), rounded(self.z))
    }
}

// =============================================================================
// LAB
// =============================================================================

impl Lab {
    pub fn new(l: f64, a: f64, b: f64) -> Result<Self, ColorError> {
        let lab = Self { l, a, b };
        lab.validate()?;
        Ok(lab)
    }

    fn validate(&self) -> Result<(), ColorError> {
        check_range(Self::LABEL, "L", self.l, 0.0, 100.0, "0..=100")?;
        check_range(Self::LABEL, "a", self.a, f64::MIN, f64::MAX, "a finite number")?;
        check_range(Self::LABEL, "b", self.b, f64::MIN, f64::MAX, "a finite number")
    }

    fn to_xyz_components(self) -> [f64; 3] {
        let fy = (self.l + 16.0) / 116.0;
        let fx = fy + self.a / 500.0;
        let fz = fy - self.b / 200.0;
        [
            D65_WHITE.x * lab_f_inverse(fx),
            D65_WHITE.y * lab_f_inverse(fy),
            D65_WHITE.z * lab_f_inverse(fz),
        ]
    }
}

impl From<Xyz> for Lab {
    fn from(xyz: Xyz) -> Self {
        let fx = lab_f(xyz.x / D65_WHITE.x);
        let fy = lab_f(xyz.y / D65_WHITE.y);
        let fz = lab_f(xyz.z / D65_WHITE.z);
        Self {
            // Le résultat dérivé peut déborder d'un ulp / The derived value may overshoot by an ulp
            l: (116.0 * fy - 16.0).clamp(0.0, 100.0),
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

impl ColorModel for Lab {
    const LABEL: &'static str = "CIE LAB";

    fn from_rgb(rgb: Rgb) -> Self {
        Lab::from(Xyz::from(rgb))
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        // Pas de passage par Xyz::validate : un LAB hors gamut reste valide
        // Skip Xyz::validate: an out-of-gamut LAB is still a valid LAB
        Ok(xyz_to_rgb(self.to_xyz_components()))
    }
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CIE LAB({}, {}, {})", rounded(self.l), rounded(self.a), rounded(self.b))
    }
}

// =============================================================================
// LCh
// =============================================================================

impl Lch {
    pub fn new(l: f64, c: f64, h: f64) -> Result<Self, ColorError> {
        let lch = Self { l, c, h };
        lch.validate()?;
        Ok(lch)
    }

    fn validate(&self) -> Result<(), ColorError> {
        check_range(Self::LABEL, "L", self.l, 0.0, 100.0, "0..=100")?;
        check_range(Self::LABEL, "chroma", self.c, 0.0, f64::MAX, ">= 0")?;
        check_hue(Self::LABEL, self.h)
    }
}

impl From<Lab> for Lch {
    fn from(lab: Lab) -> Self {
        let c = lab.a.hypot(lab.b);
        let h = if c < ACHROMATIC_CHROMA {
            0.0
        } else {
            normalize_hue(lab.b.atan2(lab.a).to_degrees())
        };
        Self { l: lab.l, c, h }
    }
}

impl From<Lch> for Lab {
    fn from(lch: Lch) -> Self {
        let h = lch.h.to_radians();
        Self {
            l: lch.l,
            a: lch.c * h.cos(),
            b: lch.c * h.sin(),
        }
    }
}

impl ColorModel for Lch {
    const LABEL: &'static str = "CIELCh";

    fn from_rgb(rgb: Rgb) -> Self {
        Lch::from(Lab::from_rgb(rgb))
    }

    fn to_rgb(&self) -> Result<Rgb, ColorError> {
        self.validate()?;
        Lab::from(*self).to_rgb()
    }
}

impl fmt::Display for Lch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CIELCh({}, {}, {}°)", rounded(self.l), rounded(self.c), degrees(self.h))
    }
}

// =============================================================================
// TESTS
// =============================================================================
