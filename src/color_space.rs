//! Conversions between RGB, HSL and hex strings, plus the single distance
//! metric shared by clustering, family exclusion and spotlight masking.

use std::fmt;

use palette::{Hsl as PaletteHsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::{PaletteError, Result};

/// Largest possible [`color_distance`] (black to white).
pub const MAX_DISTANCE: f64 = 441.672_955_930_063_7;

/// 8-bit sRGB color.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
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

    /// Uppercase `#RRGGBB`.
    pub fn to_hex(self) -> String {
        rgb_to_hex(self)
    }

    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for Srgb<u8> {
    fn from(c: Rgb) -> Self {
        Srgb::new(c.r, c.g, c.b)
    }
}

impl From<Srgb<u8>> for Rgb {
    fn from(c: Srgb<u8>) -> Self {
        Self::new(c.red, c.green, c.blue)
    }
}

/// Hue in degrees `[0, 360)`, saturation and lightness as fractions `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }
}

/// Text color giving the best legibility on top of a swatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    Black,
    White,
}

impl Contrast {
    pub fn as_str(self) -> &'static str {
        match self {
            Contrast::Black => "black",
            Contrast::White => "white",
        }
    }
}

pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb.r, rgb.g, rgb.b)
}

/// Parse `RRGGBB` or `#RRGGBB` (either case).
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PaletteError::InvalidFormat(hex.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| PaletteError::InvalidFormat(hex.to_string()))
    };
    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let srgb: Srgb<f32> = Srgb::<u8>::from(rgb).into_format();
    let hsl: PaletteHsl = srgb.into_color();
    let mut h = hsl.hue.into_positive_degrees();
    if !(0.0..360.0).contains(&h) {
        h = 0.0;
    }
    Hsl {
        h,
        s: hsl.saturation.clamp(0.0, 1.0),
        l: hsl.lightness.clamp(0.0, 1.0),
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0);
    let source: PaletteHsl = PaletteHsl::new(h, hsl.s.clamp(0.0, 1.0), hsl.l.clamp(0.0, 1.0));
    let srgb: Srgb<f32> = source.into_color();
    let (r, g, b) = srgb.into_components();
    Rgb::new(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b))
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Euclidean distance in RGB space.
#[inline]
pub fn color_distance(a: Rgb, b: Rgb) -> f64 {
    squared_distance(a, b).sqrt()
}

#[inline]
pub(crate) fn squared_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    dr * dr + dg * dg + db * db
}

/// Perceptual luminance on a `[0, 1]` scale.
pub fn luminance(rgb: Rgb) -> f64 {
    (0.299 * rgb.r as f64 + 0.587 * rgb.g as f64 + 0.114 * rgb.b as f64) / 255.0
}

pub fn contrast_color(rgb: Rgb) -> Contrast {
    if luminance(rgb) > 0.5 {
        Contrast::Black
    } else {
        Contrast::White
    }
}

/// True when every channel sits within `threshold` of pure black, or every
/// channel within `threshold` of pure white.
pub fn is_black_or_white(rgb: Rgb, threshold: u8) -> bool {
    let near_black = rgb.r < threshold && rgb.g < threshold && rgb.b < threshold;
    let ceiling = 255 - threshold;
    let near_white = rgb.r > ceiling && rgb.g > ceiling && rgb.b > ceiling;
    near_black || near_white
}
