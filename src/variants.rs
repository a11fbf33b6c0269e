//! Brightness and hue derivatives of palette colors.
//!
//! Both adjustments round-trip through HSL, so applying a delta twice is not
//! the same as applying twice the delta once.

use serde::{Deserialize, Serialize};

use crate::color_space::{Rgb, hsl_to_rgb, rgb_to_hsl};

/// Brightness multipliers and hue shifts (degrees) of the variant grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationSpec {
    pub brightness_factors: Vec<f64>,
    pub hue_shifts: Vec<f64>,
}

impl Default for VariationSpec {
    fn default() -> Self {
        Self {
            brightness_factors: vec![0.5, 0.75, 1.0, 1.25, 1.5],
            hue_shifts: vec![0.0, 10.0, 20.0, 30.0],
        }
    }
}

/// Lightness change in percentage points for a multiplicative factor:
/// 1.5 → +25, 0.5 → −25, 1.0 → 0.
pub fn brightness_delta(factor: f64) -> f64 {
    (factor - 1.0) * 50.0
}

/// Add `delta_percent` lightness points, clamped to the valid range.
pub fn adjust_brightness(rgb: Rgb, delta_percent: f64) -> Rgb {
    if delta_percent == 0.0 {
        return rgb;
    }
    let mut hsl = rgb_to_hsl(rgb);
    hsl.l = (hsl.l as f64 + delta_percent / 100.0).clamp(0.0, 1.0) as f32;
    hsl_to_rgb(hsl)
}

/// Rotate the hue by `delta_degrees`, wrapping around 360.
pub fn adjust_hue(rgb: Rgb, delta_degrees: f64) -> Rgb {
    let mut hsl = rgb_to_hsl(rgb);
    hsl.h = (hsl.h as f64 + delta_degrees).rem_euclid(360.0) as f32;
    hsl_to_rgb(hsl)
}

/// One color per brightness factor, in the given order.
pub fn brightness_row(rgb: Rgb, spec: &VariationSpec) -> Vec<Rgb> {
    spec.brightness_factors
        .iter()
        .map(|&f| adjust_brightness(rgb, brightness_delta(f)))
        .collect()
}

/// One color per hue shift, in the given order.
pub fn hue_row(rgb: Rgb, spec: &VariationSpec) -> Vec<Rgb> {
    spec.hue_shifts.iter().map(|&s| adjust_hue(rgb, s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r as i16 - b.r as i16).abs() <= 1
            && (a.g as i16 - b.g as i16).abs() <= 1
            && (a.b as i16 - b.b as i16).abs() <= 1
    }

    const SAMPLES: [Rgb; 5] = [
        Rgb::new(200, 40, 40),
        Rgb::new(12, 180, 220),
        Rgb::new(128, 128, 128),
        Rgb::new(250, 250, 10),
        Rgb::new(90, 10, 140),
    ];

    #[test]
    fn zero_deltas_are_identity() {
        for c in SAMPLES {
            assert_eq!(adjust_brightness(c, 0.0), c);
            assert!(close(adjust_hue(c, 0.0), c));
            assert_eq!(adjust_brightness(c, brightness_delta(1.0)), c);
        }
    }

    #[test]
    fn hue_wraps() {
        for c in SAMPLES {
            assert!(close(adjust_hue(c, 360.0), c));
            assert!(close(adjust_hue(c, -360.0), c));
            assert!(close(adjust_hue(c, 370.0), adjust_hue(c, 10.0)));
        }
        assert!(close(adjust_hue(Rgb::new(255, 0, 0), 120.0), Rgb::new(0, 255, 0)));
    }

    #[test]
    fn brightness_moves_lightness_and_clamps() {
        let base = Rgb::new(200, 40, 40);
        let lighter = adjust_brightness(base, brightness_delta(1.5));
        let darker = adjust_brightness(base, brightness_delta(0.5));
        assert!((lighter.to_hsl().l - base.to_hsl().l - 0.25).abs() < 0.01);
        assert!((base.to_hsl().l - darker.to_hsl().l - 0.25).abs() < 0.01);

        assert_eq!(adjust_brightness(base, 500.0), Rgb::WHITE);
        assert_eq!(adjust_brightness(base, -500.0), Rgb::BLACK);
    }

    #[test]
    fn rows_follow_the_spec() {
        let spec = VariationSpec::default();
        let base = Rgb::new(12, 180, 220);
        let brightness = brightness_row(base, &spec);
        assert_eq!(brightness.len(), 5);
        assert_eq!(brightness[2], base);
        let hues = hue_row(base, &spec);
        assert_eq!(hues.len(), 4);
        assert!(close(hues[0], base));
    }
}
