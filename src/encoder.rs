//! Export formats: Adobe Color Swatch (ACO v2), Clip Studio color set (CLS)
//! and the palette-grid raster.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color_space::Rgb;
use crate::error::{PaletteError, Result};
use crate::extractor::ExtractedColor;
use crate::variants::{VariationSpec, brightness_row, hue_row};

/// Side length of one palette-grid section, in pixels.
pub const SECTION_SIZE: u32 = 1000;

const ACO_VERSION: u16 = 2;
const ACO_RGB_SPACE: u16 = 0;

const CLS_MAGIC: &[u8; 4] = b"SLCC";
const CLS_VERSION: u16 = 1;
const CLS_HEADER_SIZE: usize = 64;
// magic + version + count + name length, plus the name's NUL.
const CLS_MAX_NAME: usize = CLS_HEADER_SIZE - 4 - 2 - 4 - 2 - 1;

/// A swatch as written to palette files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColor {
    pub rgb: Rgb,
    pub name: String,
}

impl NamedColor {
    pub fn new(rgb: Rgb, name: impl Into<String>) -> Self {
        Self { rgb, name: name.into() }
    }
}

/// Serialize swatches as ACO version 2.
///
/// Layout, all big-endian `u16`: version, count; then per color: color space
/// (0 = RGB), red, green, blue scaled to 0..=65535, a reserved zero, the name
/// length in UTF-16 units including the terminator, the UTF-16 units, and a
/// NUL unit. De-duplication is the caller's job.
pub fn to_aco(colors: &[NamedColor]) -> Result<Vec<u8>> {
    let count = u16::try_from(colors.len()).map_err(|_| PaletteError::TooManyColors {
        count: colors.len(),
        max: u16::MAX as usize,
    })?;

    let mut out = Vec::with_capacity(4 + colors.len() * 24);
    out.extend_from_slice(&ACO_VERSION.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());

    for color in colors {
        let Rgb { r, g, b } = color.rgb;
        for word in [ACO_RGB_SPACE, r as u16 * 257, g as u16 * 257, b as u16 * 257, 0] {
            out.extend_from_slice(&word.to_be_bytes());
        }

        let units = name_units(&color.name);
        out.extend_from_slice(&(units.len() as u16 + 1).to_be_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out.extend_from_slice(&0u16.to_be_bytes());
    }
    Ok(out)
}

/// UTF-16 units of `name`, cut on a char boundary so the length word (which
/// counts the terminator) still fits in a `u16`.
fn name_units(name: &str) -> Vec<u16> {
    let limit = u16::MAX as usize - 1;
    let mut units = Vec::new();
    let mut buf = [0u16; 2];
    for ch in name.chars() {
        let encoded = ch.encode_utf16(&mut buf);
        if units.len() + encoded.len() > limit {
            break;
        }
        units.extend_from_slice(encoded);
    }
    units
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Serialize swatches as an unnamed-color Clip Studio Paint color set.
pub fn to_cls(colors: &[NamedColor], set_name: &str) -> Vec<u8> {
    let name = truncate_utf8(set_name, CLS_MAX_NAME).as_bytes();

    let mut out = Vec::with_capacity(CLS_HEADER_SIZE + colors.len() * 12);
    out.extend_from_slice(CLS_MAGIC);
    out.extend_from_slice(&CLS_VERSION.to_le_bytes());
    out.extend_from_slice(&(colors.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(name);
    out.push(0);
    out.resize(CLS_HEADER_SIZE, 0);

    for color in colors {
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&[color.rgb.r, color.rgb.g, color.rgb.b, 0xFF]);
        out.extend_from_slice(&[0; 4]);
    }
    out
}

/// Render the exportable palette sheet.
///
/// For each non-empty set (dominant first, then family) three
/// `SECTION_SIZE`-square sections are stacked: the color strip, the
/// brightness grid and the hue grid. Within a section swatch #1 is the
/// bottom row.
pub fn palette_grid(
    dominant: &[ExtractedColor],
    family: &[ExtractedColor],
    spec: &VariationSpec,
) -> Result<RgbaImage> {
    let sets: Vec<&[ExtractedColor]> = [dominant, family]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if sets.is_empty() {
        return Err(PaletteError::EmptyPalette);
    }

    let mut canvas = RgbaImage::new(SECTION_SIZE, SECTION_SIZE * 3 * sets.len() as u32);
    let mut top = 0;
    for colors in sets {
        let strip: Vec<Vec<Rgb>> = colors.iter().map(|c| vec![c.rgb]).collect();
        let brightness: Vec<Vec<Rgb>> =
            colors.iter().map(|c| brightness_row(c.rgb, spec)).collect();
        let hues: Vec<Vec<Rgb>> = colors.iter().map(|c| hue_row(c.rgb, spec)).collect();
        for rows in [strip, brightness, hues] {
            draw_section(&mut canvas, top, &rows);
            top += SECTION_SIZE;
        }
    }
    Ok(canvas)
}

/// Edge of band `i` out of `n` across one section, rounded so bands tile it.
#[inline]
fn band_edge(i: usize, n: usize) -> u32 {
    ((i as f64) * SECTION_SIZE as f64 / n as f64).round() as u32
}

fn draw_section(canvas: &mut RgbaImage, top: u32, rows: &[Vec<Rgb>]) {
    let n = rows.len();
    for (i, row) in rows.iter().rev().enumerate() {
        let (y0, y1) = (top + band_edge(i, n), top + band_edge(i + 1, n));
        let m = row.len();
        for (j, &rgb) in row.iter().enumerate() {
            let (x0, x1) = (band_edge(j, m), band_edge(j + 1, m));
            let pixel = Rgba([rgb.r, rgb.g, rgb.b, 0xFF]);
            for y in y0..y1 {
                for x in x0..x1 {
                    canvas.put_pixel(x, y, pixel);
                }
            }
        }
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PaletteError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::Position;
    use crate::variants::adjust_hue;

    #[test]
    fn aco_single_red_swatch_is_byte_exact() {
        let bytes = to_aco(&[NamedColor::new(Rgb::new(255, 0, 0), "Red")]).unwrap();
        let expected: Vec<u8> = vec![
            0x00, 0x02, 0x00, 0x01, // version 2, one color
            0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // RGB record
            0x00, 0x04, // "Red" + NUL
            0x00, b'R', 0x00, b'e', 0x00, b'd', 0x00, 0x00,
        ];
        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn aco_scales_channels_and_encodes_utf16() {
        let bytes = to_aco(&[
            NamedColor::new(Rgb::new(1, 128, 0), ""),
            NamedColor::new(Rgb::new(0, 0, 0), "é"),
        ])
        .unwrap();
        assert_eq!(&bytes[0..4], &[0, 2, 0, 2]);
        assert_eq!(&bytes[6..8], &257u16.to_be_bytes());
        assert_eq!(&bytes[8..10], &(128u16 * 257).to_be_bytes());
        // Empty name: length 1, just the terminator.
        assert_eq!(&bytes[14..18], &[0, 1, 0, 0]);
        let second = &bytes[18..];
        assert_eq!(&second[10..12], &[0, 2]);
        assert_eq!(&second[12..14], &0x00E9u16.to_be_bytes());
        assert_eq!(second.len(), 10 + 2 + 4);
    }

    #[test]
    fn aco_rejects_oversized_palettes() {
        let colors = vec![NamedColor::new(Rgb::BLACK, ""); u16::MAX as usize + 1];
        assert!(matches!(to_aco(&colors), Err(PaletteError::TooManyColors { .. })));
    }

    #[test]
    fn cls_layout() {
        let bytes = to_cls(
            &[NamedColor::new(Rgb::new(10, 20, 30), "x"), NamedColor::new(Rgb::WHITE, "y")],
            "Color Palette",
        );
        assert_eq!(bytes.len(), 64 + 2 * 12);
        assert_eq!(&bytes[0..4], b"SLCC");
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(&bytes[6..10], &[2, 0, 0, 0]);
        assert_eq!(&bytes[10..12], &[13, 0]);
        assert_eq!(&bytes[12..25], b"Color Palette");
        assert_eq!(bytes[25], 0);
        assert_eq!(&bytes[64..76], &[8, 0, 0, 0, 10, 20, 30, 255, 0, 0, 0, 0]);

        let long = to_cls(&[], &"n".repeat(200));
        assert_eq!(long.len(), 64);
        assert_eq!(long[63], 0);
    }

    #[test]
    fn long_names_are_cut_on_char_boundaries() {
        // 40 two-byte chars: the 51-byte limit lands inside the 26th.
        let bytes = to_cls(&[], &"é".repeat(40));
        assert_eq!(&bytes[10..12], &50u16.to_le_bytes());
        assert_eq!(std::str::from_utf8(&bytes[12..62]).unwrap(), "é".repeat(25));
        assert_eq!(bytes[62], 0);

        // One BMP unit then surrogate pairs: the pair straddling the limit is dropped whole.
        let name = format!("a{}", "😀".repeat(40_000));
        let bytes = to_aco(&[NamedColor::new(Rgb::BLACK, name)]).unwrap();
        let len = u16::from_be_bytes([bytes[14], bytes[15]]) as usize;
        assert_eq!(len, 1 + 2 * 32_766 + 1);
        let units: Vec<u16> = bytes[16..16 + 2 * (len - 1)]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        let decoded = String::from_utf16(&units).unwrap();
        assert_eq!(decoded.chars().count(), 1 + 32_766);
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);
    }

    fn swatch(r: u8, g: u8, b: u8) -> ExtractedColor {
        ExtractedColor::new(Rgb::new(r, g, b), Position::default())
    }

    fn at(img: &RgbaImage, x: u32, y: u32) -> Rgb {
        let [r, g, b, _] = img.get_pixel(x, y).0;
        Rgb::new(r, g, b)
    }

    #[test]
    fn grid_stacks_sections_with_first_swatch_at_bottom() {
        let dominant = vec![swatch(200, 40, 40), swatch(40, 40, 200)];
        let spec = VariationSpec::default();
        let img = palette_grid(&dominant, &[], &spec).unwrap();
        assert_eq!(img.dimensions(), (1000, 3000));

        // Strip: #2 on top, #1 at the bottom.
        assert_eq!(at(&img, 10, 10), Rgb::new(40, 40, 200));
        assert_eq!(at(&img, 990, 990), Rgb::new(200, 40, 40));

        // Brightness grid: the middle column (factor 1.0) is the base color.
        assert_eq!(at(&img, 500, 1990), Rgb::new(200, 40, 40));
        assert_eq!(at(&img, 500, 1010), Rgb::new(40, 40, 200));

        // Hue grid: columns are 250 wide.
        assert_eq!(at(&img, 260, 2990), adjust_hue(Rgb::new(200, 40, 40), 10.0));
    }

    #[test]
    fn grid_adds_family_sections() {
        let spec = VariationSpec::default();
        let img = palette_grid(&[swatch(200, 40, 40)], &[swatch(40, 200, 40)], &spec).unwrap();
        assert_eq!(img.dimensions(), (1000, 6000));
        assert_eq!(at(&img, 0, 3000), Rgb::new(40, 200, 40));

        let family_only = palette_grid(&[], &[swatch(40, 200, 40)], &spec).unwrap();
        assert_eq!(family_only.dimensions(), (1000, 3000));
    }

    #[test]
    fn grid_requires_colors() {
        assert_eq!(
            palette_grid(&[], &[], &VariationSpec::default()),
            Err(PaletteError::EmptyPalette)
        );
    }

    #[test]
    fn png_encoding_round_trips() {
        let img = palette_grid(&[swatch(1, 2, 3)], &[], &VariationSpec::default()).unwrap();
        let png = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
