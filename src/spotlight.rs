//! Spotlight highlighting of pixels that match palette colors.

use image::{Rgba, RgbaImage};

use crate::color_space::{Rgb, squared_distance};
use crate::pixel_buffer::{PixelBuffer, Position};

pub const DEFAULT_THRESHOLD: f64 = 30.0;

/// Overlay opacity applied to non-matching pixels (~70 %).
const OVERLAY_ALPHA: u32 = 178;

/// Brightness kept by non-matching pixels in [`spotlight_image`].
const DIM_FACTOR: f32 = 0.3;

/// Per-pixel alpha, 255 = highlighted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y as usize) * (self.width as usize) + x as usize).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn highlighted(&self) -> usize {
        self.data.iter().filter(|&&a| a == 255).count()
    }
}

#[inline]
fn matches_any(rgb: Rgb, targets: &[Rgb], threshold: f64) -> bool {
    // Compare squared distances; a negative threshold matches nothing.
    if threshold < 0.0 {
        return false;
    }
    let limit = threshold * threshold;
    targets.iter().any(|&t| squared_distance(rgb, t) <= limit)
}

/// Hard-edged mask of pixels within `threshold` of `target`.
pub fn create_mask(buffer: &PixelBuffer, target: Rgb, threshold: f64) -> AlphaBuffer {
    create_multi_mask(buffer, &[target], threshold)
}

/// Mask of pixels within `threshold` of any of `targets`.
pub fn create_multi_mask(buffer: &PixelBuffer, targets: &[Rgb], threshold: f64) -> AlphaBuffer {
    let data = buffer
        .as_image()
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            if matches_any(Rgb::new(r, g, b), targets, threshold) { 255 } else { 0 }
        })
        .collect();
    AlphaBuffer {
        width: buffer.width(),
        height: buffer.height(),
        data,
    }
}

/// Coordinates of every pixel within `threshold` of `target`, raster order.
pub fn matching_pixels(buffer: &PixelBuffer, target: Rgb, threshold: f64) -> Vec<Position> {
    buffer
        .as_image()
        .enumerate_pixels()
        .filter(|(_, _, p)| {
            let [r, g, b, _] = p.0;
            matches_any(Rgb::new(r, g, b), &[target], threshold)
        })
        .map(|(x, y, _)| Position::new(x, y))
        .collect()
}

/// Black dimming layer to draw over the source image: clear where a pixel
/// matches (or the source is fully transparent), ~70 % opaque elsewhere,
/// scaled by the source alpha.
pub fn create_overlay(buffer: &PixelBuffer, targets: &[Rgb], threshold: f64) -> RgbaImage {
    let src = buffer.as_image();
    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b, a] = src.get_pixel(x, y).0;
        if a == 0 || matches_any(Rgb::new(r, g, b), targets, threshold) {
            return Rgba([0, 0, 0, 0]);
        }
        let alpha = ((OVERLAY_ALPHA * a as u32) as f32 / 255.0).round() as u8;
        Rgba([0, 0, 0, alpha])
    })
}

/// The source image with every non-matching opaque pixel dimmed.
pub fn spotlight_image(buffer: &PixelBuffer, targets: &[Rgb], threshold: f64) -> RgbaImage {
    let mut out = buffer.as_image().clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a == 0 || matches_any(Rgb::new(r, g, b), targets, threshold) {
            continue;
        }
        let dim = |c: u8| (c as f32 * DIM_FACTOR).round() as u8;
        *pixel = Rgba([dim(r), dim(g), dim(b), a]);
    }
    out
}
