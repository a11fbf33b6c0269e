//! Dominant and family palette extraction.
//!
//! Every palette entry is pinned to a real sampled pixel: the member of its
//! cluster closest to the centroid. The swatch therefore always shows a color
//! that exists in the image.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::color_space::{Contrast, Hsl, Rgb, color_distance, contrast_color, squared_distance};
use crate::error::{PaletteError, Result};
use crate::kmeans::{self, KMeansOptions};
use crate::pixel_buffer::{PixelBuffer, Position};
use crate::sampler::{self, DEFAULT_BW_THRESHOLD, Sample, SampleOptions};

/// Family colors must be at least this far from every dominant color.
pub const DEFAULT_FAMILY_DISTANCE: f64 = 50.0;

pub const DEFAULT_COLOR_COUNT: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub k: usize,
    pub filter_black_white: bool,
    pub bw_threshold: u8,
    pub stride: Option<u32>,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_COLOR_COUNT,
            filter_black_white: true,
            bw_threshold: DEFAULT_BW_THRESHOLD,
            stride: None,
            max_iterations: kmeans::DEFAULT_MAX_ITERATIONS,
            seed: kmeans::DEFAULT_SEED,
        }
    }
}

impl ExtractOptions {
    pub fn with_k(k: usize) -> Self {
        Self { k, ..Self::default() }
    }

    pub fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            stride: self.stride,
            exclude_near_black_white: self.filter_black_white,
            bw_threshold: self.bw_threshold,
        }
    }

    pub fn kmeans_options(&self) -> KMeansOptions {
        KMeansOptions {
            max_iterations: self.max_iterations,
            seed: self.seed,
        }
    }
}

/// One palette entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedColor {
    pub hex: String,
    pub rgb: Rgb,
    pub hsl: Hsl,
    pub position: Position,
    /// Share of the sampled pixels in this color's cluster, in percent.
    pub prevalence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ExtractedColor {
    pub fn new(rgb: Rgb, position: Position) -> Self {
        Self {
            hex: rgb.to_hex(),
            rgb,
            hsl: rgb.to_hsl(),
            position,
            prevalence: 0,
            name: None,
        }
    }

    /// Move the entry onto the pixel at `(x, y)` (clamped into the image) and
    /// take that pixel's color. Returns `false` for an empty buffer.
    pub fn repin(&mut self, buffer: &PixelBuffer, x: i64, y: i64) -> bool {
        let Some((position, rgb)) = buffer.get_clamped(x, y) else {
            return false;
        };
        self.position = position;
        self.rgb = rgb;
        self.hex = rgb.to_hex();
        self.hsl = rgb.to_hsl();
        true
    }

    pub fn contrast(&self) -> Contrast {
        contrast_color(self.rgb)
    }
}

/// Cluster the whole (filtered) image into at most `opts.k` colors, most
/// populous first.
pub fn extract_dominant(
    buffer: &PixelBuffer,
    opts: &ExtractOptions,
) -> Result<Vec<ExtractedColor>> {
    let samples = sampler::sample(buffer, &opts.sample_options())?;
    let colors = cluster_samples(&samples, opts)?;
    info!("extracted {} dominant colors", colors.len());
    Ok(colors)
}

/// Cluster only the pixels at least `min_distance` away from every dominant
/// color. A short or empty result is valid.
pub fn extract_family(
    buffer: &PixelBuffer,
    dominant: &[ExtractedColor],
    opts: &ExtractOptions,
    min_distance: f64,
) -> Result<Vec<ExtractedColor>> {
    if opts.k == 0 {
        return Err(PaletteError::InvalidK { k: 0, samples: 0 });
    }
    let samples = sampler::collect(buffer, &opts.sample_options(), |rgb| {
        dominant
            .iter()
            .all(|d| color_distance(rgb, d.rgb) >= min_distance)
    })?;
    if samples.is_empty() {
        debug!("no family-eligible pixels beyond distance {min_distance}");
        return Ok(Vec::new());
    }
    let colors = cluster_samples(&samples, opts)?;
    info!("extracted {} family colors", colors.len());
    Ok(colors)
}

fn cluster_samples(samples: &[Sample], opts: &ExtractOptions) -> Result<Vec<ExtractedColor>> {
    if opts.k == 0 {
        return Err(PaletteError::InvalidK { k: 0, samples: samples.len() });
    }
    let rgbs: Vec<Rgb> = samples.iter().map(|s| s.rgb).collect();
    let distinct = rgbs.iter().collect::<HashSet<_>>().len();
    let k = opts.k.min(distinct);
    if k < opts.k {
        warn!("requested {} colors but only {distinct} distinct colors were sampled", opts.k);
    }

    let state = kmeans::cluster_with_state(&rgbs, k, &opts.kmeans_options())?;

    // Per cluster: closest member to the centroid, and the earliest member.
    let mut representative: Vec<Option<(usize, f64)>> = vec![None; k];
    let mut first_member = vec![usize::MAX; k];
    for (i, (rgb, &cluster)) in rgbs.iter().zip(&state.assignments).enumerate() {
        first_member[cluster] = first_member[cluster].min(i);
        let d = squared_distance(*rgb, state.centroids[cluster]);
        if representative[cluster].is_none_or(|(_, best)| d < best) {
            representative[cluster] = Some((i, d));
        }
    }

    let mut order: Vec<usize> = (0..k).filter(|&c| state.populations[c] > 0).collect();
    order.sort_by(|&a, &b| {
        state.populations[b]
            .cmp(&state.populations[a])
            .then(first_member[a].cmp(&first_member[b]))
    });

    let total = samples.len() as f64;
    let colors = order
        .into_iter()
        .filter_map(|c| {
            let (idx, _) = representative[c]?;
            let sample = samples[idx];
            let mut color = ExtractedColor::new(sample.rgb, sample.position);
            color.prevalence = (state.populations[c] as f64 * 100.0 / total).round() as u8;
            Some(color)
        })
        .collect();
    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn stripes(colors: &[[u8; 3]], stripe: u32) -> PixelBuffer {
        let width = stripe * colors.len() as u32;
        PixelBuffer::new(RgbaImage::from_fn(width, 8, |x, _| {
            let [r, g, b] = colors[(x / stripe) as usize];
            Rgba([r, g, b, 255])
        }))
    }

    #[test]
    fn dominant_colors_are_real_pixels_ordered_by_population() {
        // Widths 6, 3, 1: green dominates.
        let buffer = PixelBuffer::new(RgbaImage::from_fn(10, 4, |x, _| match x {
            0..=5 => Rgba([30, 200, 40, 255]),
            6..=8 => Rgba([200, 30, 40, 255]),
            _ => Rgba([40, 30, 200, 255]),
        }));
        let colors = extract_dominant(&buffer, &ExtractOptions::with_k(3)).unwrap();
        let hexes: Vec<_> = colors.iter().map(|c| c.hex.as_str()).collect();
        assert_eq!(hexes, vec!["#1EC828", "#C81E28", "#281EC8"]);
        assert_eq!(colors[0].prevalence, 60);
        for c in &colors {
            assert_eq!(buffer.get(c.position.x, c.position.y), Some(c.rgb));
            assert_eq!(c.hsl, c.rgb.to_hsl());
        }
    }

    #[test]
    fn never_returns_more_colors_than_exist() {
        let buffer = stripes(&[[250, 0, 0], [0, 0, 250]], 4);
        let opts = ExtractOptions { k: 6, filter_black_white: false, ..ExtractOptions::default() };
        let colors = extract_dominant(&buffer, &opts).unwrap();
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn zero_k_is_rejected() {
        let buffer = stripes(&[[250, 0, 0]], 4);
        assert!(matches!(
            extract_dominant(&buffer, &ExtractOptions::with_k(0)),
            Err(PaletteError::InvalidK { k: 0, .. })
        ));
        assert!(matches!(
            extract_family(&buffer, &[], &ExtractOptions::with_k(0), 50.0),
            Err(PaletteError::InvalidK { .. })
        ));
    }

    #[test]
    fn family_colors_keep_their_distance() {
        let buffer = stripes(
            &[[200, 40, 40], [205, 45, 40], [40, 200, 40], [40, 40, 200], [200, 200, 40]],
            3,
        );
        let dominant = vec![ExtractedColor::new(Rgb::new(200, 40, 40), Position::new(0, 0))];
        let family = extract_family(&buffer, &dominant, &ExtractOptions::with_k(4), 50.0).unwrap();
        assert_eq!(family.len(), 3);
        for f in &family {
            assert!(color_distance(f.rgb, dominant[0].rgb) >= 50.0);
        }
    }

    #[test]
    fn family_shortfall_is_not_an_error() {
        let buffer = stripes(&[[200, 40, 40]], 4);
        let dominant = extract_dominant(&buffer, &ExtractOptions::default()).unwrap();
        let family = extract_family(&buffer, &dominant, &ExtractOptions::default(), 50.0).unwrap();
        assert!(family.is_empty());

        let empty = PixelBuffer::new(RgbaImage::new(0, 0));
        assert!(extract_family(&empty, &[], &ExtractOptions::default(), 50.0).unwrap().is_empty());
    }

    #[test]
    fn repin_takes_the_new_pixel_color() {
        let buffer = stripes(&[[200, 40, 40], [40, 200, 40]], 2);
        let mut color = ExtractedColor::new(Rgb::new(200, 40, 40), Position::new(0, 0));
        assert!(color.repin(&buffer, 3, 100));
        assert_eq!(color.position, Position::new(3, 7));
        assert_eq!(color.rgb, Rgb::new(40, 200, 40));
        assert_eq!(color.hex, "#28C828");
        assert_eq!(color.hsl, Rgb::new(40, 200, 40).to_hsl());
    }
}
