//! Decoded RGBA raster the rest of the engine reads from.
//!
//! `PixelBuffer::decode` is the only place that touches encoded image bytes;
//! every other module works on an already-decoded buffer.

use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage, imageops::FilterType};
use log::debug;

use crate::color_space::Rgb;
use crate::error::{PaletteError, Result};

/// Largest encoded input accepted by [`PixelBuffer::decode`].
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Images larger than this on either side are scaled down before processing.
pub const MAX_DIMENSION: u32 = 1200;

const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

/// Pixel coordinate inside a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Build from raw RGBA bytes (`width * height * 4` long).
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Result<Self> {
        RgbaImage::from_raw(width, height, raw)
            .map(Self::new)
            .ok_or_else(|| {
                PaletteError::ImageLoad(format!(
                    "buffer length does not match {width}x{height} RGBA"
                ))
            })
    }

    /// Decode an encoded PNG/JPEG/WebP/GIF and bound its size to
    /// [`MAX_DIMENSION`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(PaletteError::ImageLoad("Image file is too large (max 10MB)".into()));
        }
        let format = image::guess_format(bytes)
            .map_err(|_| PaletteError::ImageLoad("Unrecognised image data".into()))?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(PaletteError::ImageLoad(
                "Invalid image format. Use PNG, JPEG, WebP, or GIF.".into(),
            ));
        }
        let img = image::load_from_memory_with_format(bytes, format)?;
        Ok(Self::from_dynamic(img))
    }

    /// Wrap an already-decoded image, downscaling it if needed.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (w, h) = img.dimensions();
        let (out_w, out_h) = scaled_dimensions(w, h, MAX_DIMENSION);
        if (out_w, out_h) == (w, h) {
            return Self::new(img.to_rgba8());
        }
        debug!("downscaling {w}x{h} image to {out_w}x{out_h}");
        // Nearest keeps every output pixel a color that exists in the source.
        Self::new(image::imageops::resize(&img, out_w, out_h, FilterType::Nearest))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        self.rgba(x, y).map(|[r, g, b, _]| Rgb::new(r, g, b))
    }

    pub fn rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Read the pixel nearest to a possibly out-of-bounds coordinate.
    /// `None` only for an empty buffer.
    pub fn get_clamped(&self, x: i64, y: i64) -> Option<(Position, Rgb)> {
        if self.is_empty() {
            return None;
        }
        let cx = x.clamp(0, self.width() as i64 - 1) as u32;
        let cy = y.clamp(0, self.height() as i64 - 1) as u32;
        self.get(cx, cy).map(|rgb| (Position::new(cx, cy), rgb))
    }

    /// Raw RGBA bytes, row-major.
    pub fn raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

/// Fit `width × height` inside a `max_dimension` square, keeping aspect.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / width.max(height) as f64;
    let w = ((width as f64) * scale).round().max(1.0) as u32;
    let h = ((height as f64) * scale).round().max(1.0) as u32;
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn encode(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).expect("encode");
        buf
    }

    #[test]
    fn decode_png_keeps_pixels() {
        let img = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 50, y as u8 * 100, 7, 255]));
        let buffer = PixelBuffer::decode(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (3, 2));
        assert_eq!(buffer.get(2, 1), Some(Rgb::new(100, 100, 7)));
        assert_eq!(buffer.get(3, 0), None);
    }

    #[test]
    fn decode_rejects_garbage_and_unsupported_formats() {
        assert!(matches!(
            PixelBuffer::decode(b"definitely not an image"),
            Err(PaletteError::ImageLoad(_))
        ));

        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let bmp = encode(&img, ImageFormat::Bmp);
        let err = PixelBuffer::decode(&bmp).unwrap_err();
        assert!(err.to_string().contains("PNG, JPEG, WebP, or GIF"));
    }

    #[test]
    fn large_images_are_bounded() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2400, 600, Rgba([9, 9, 9, 255])));
        let buffer = PixelBuffer::from_dynamic(img);
        assert_eq!((buffer.width(), buffer.height()), (1200, 300));
    }

    #[test]
    fn clamped_reads_stay_inside() {
        let img = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let buffer = PixelBuffer::new(img);
        let (pos, rgb) = buffer.get_clamped(-5, 99).unwrap();
        assert_eq!(pos, Position::new(0, 3));
        assert_eq!(rgb, Rgb::new(0, 3, 0));

        let empty = PixelBuffer::new(RgbaImage::new(0, 0));
        assert!(empty.get_clamped(0, 0).is_none());
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_err());
    }
}
