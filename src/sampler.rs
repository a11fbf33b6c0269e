//! Strided pixel sampling.
//!
//! Clustering cost grows with `samples × k × iterations`, so the sampler keeps
//! the sample count near [`SAMPLE_CAP`] regardless of image resolution.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::color_space::{Rgb, is_black_or_white};
use crate::error::{PaletteError, Result};
use crate::pixel_buffer::{PixelBuffer, Position};

/// Upper bound on the number of grid points visited with the default stride.
pub const SAMPLE_CAP: u64 = 10_000;

/// Pixels with alpha below this are treated as background.
pub const OPAQUE_ALPHA: u8 = 128;

pub const DEFAULT_BW_THRESHOLD: u8 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleOptions {
    /// Visit every `stride`-th pixel on both axes. `None` picks a stride that
    /// respects [`SAMPLE_CAP`].
    pub stride: Option<u32>,
    pub exclude_near_black_white: bool,
    pub bw_threshold: u8,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            stride: None,
            exclude_near_black_white: true,
            bw_threshold: DEFAULT_BW_THRESHOLD,
        }
    }
}

/// One sampled pixel and where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub rgb: Rgb,
    pub position: Position,
}

/// Smallest stride whose sampling grid stays within [`SAMPLE_CAP`] points.
pub fn default_stride(width: u32, height: u32) -> u32 {
    let (w, h) = (width as u64, height as u64);
    if w * h <= SAMPLE_CAP {
        return 1;
    }
    let mut stride = ((w * h) as f64 / SAMPLE_CAP as f64).sqrt().floor().max(1.0) as u64;
    while w.div_ceil(stride) * h.div_ceil(stride) > SAMPLE_CAP {
        stride += 1;
    }
    stride as u32
}

/// Collect opaque samples on the stride grid, in raster order.
pub fn sample(buffer: &PixelBuffer, opts: &SampleOptions) -> Result<Vec<Sample>> {
    let samples = collect(buffer, opts, |_| true)?;
    if samples.is_empty() {
        return Err(PaletteError::EmptyImage);
    }
    Ok(samples)
}

/// Sampling core: additionally keeps only colors accepted by `keep`, and
/// reports an empty result as an empty vector.
pub(crate) fn collect<F>(buffer: &PixelBuffer, opts: &SampleOptions, keep: F) -> Result<Vec<Sample>>
where
    F: Fn(Rgb) -> bool,
{
    let stride = match opts.stride {
        Some(0) => return Err(PaletteError::InvalidStride),
        Some(s) => s,
        None => default_stride(buffer.width(), buffer.height()),
    };

    let mut samples = Vec::new();
    for y in (0..buffer.height()).step_by(stride as usize) {
        for x in (0..buffer.width()).step_by(stride as usize) {
            let Some([r, g, b, a]) = buffer.rgba(x, y) else {
                continue;
            };
            if a < OPAQUE_ALPHA {
                continue;
            }
            let rgb = Rgb::new(r, g, b);
            if opts.exclude_near_black_white && is_black_or_white(rgb, opts.bw_threshold) {
                continue;
            }
            if keep(rgb) {
                samples.push(Sample { rgb, position: Position::new(x, y) });
            }
        }
    }
    debug!(
        "sampled {} pixels from {}x{} (stride {stride})",
        samples.len(),
        buffer.width(),
        buffer.height()
    );
    Ok(samples)
}
