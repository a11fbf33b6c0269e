use wasm_bindgen::prelude::*;
use js_sys::{Array, Object, Reflect, Uint8Array};
use log::info;
use serde::{Deserialize, Serialize};

pub mod color_space;
pub mod config;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod kmeans;
pub mod naming;
pub mod pixel_buffer;
pub mod sampler;
pub mod spotlight;
pub mod variants;

pub use color_space::{
    Contrast, Hsl, Rgb, color_distance, contrast_color, hex_to_rgb, hsl_to_rgb, rgb_to_hex,
    rgb_to_hsl,
};
pub use config::{FamilyOptions, PaletteConfig};
pub use encoder::{NamedColor, encode_png, palette_grid, to_aco, to_cls};
pub use error::{PaletteError, Result};
pub use extractor::{ExtractOptions, ExtractedColor, extract_dominant, extract_family};
pub use kmeans::{KMeansOptions, cluster};
pub use pixel_buffer::{PixelBuffer, Position};
pub use spotlight::{AlphaBuffer, create_mask, create_multi_mask};
pub use variants::{VariationSpec, adjust_brightness, adjust_hue};

/// Dominant and family palettes of one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palettes {
    pub dominant: Vec<ExtractedColor>,
    pub family: Vec<ExtractedColor>,
}

/// Run both extraction passes with one configuration.
pub fn extract_palettes(buffer: &PixelBuffer, config: &PaletteConfig) -> Result<Palettes> {
    let dominant = extract_dominant(buffer, &config.extract)?;
    let family = extract_family(
        buffer,
        &dominant,
        &config.family_extract_options(),
        config.family.min_distance,
    )?;
    info!(
        "palette for {}x{} image: {} dominant, {} family",
        buffer.width(),
        buffer.height(),
        dominant.len(),
        family.len()
    );
    Ok(Palettes { dominant, family })
}

// ------------------------------------------------------------
// WASM surface
// ------------------------------------------------------------

type JsResult<T> = std::result::Result<T, JsValue>;

fn js_err(err: PaletteError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn set(target: &Object, key: &str, value: &JsValue) -> JsResult<()> {
    Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

fn color_to_js(color: &ExtractedColor) -> JsResult<Object> {
    let obj = Object::new();
    set(&obj, "hex", &JsValue::from_str(&color.hex))?;
    set(&obj, "r", &JsValue::from_f64(color.rgb.r as f64))?;
    set(&obj, "g", &JsValue::from_f64(color.rgb.g as f64))?;
    set(&obj, "b", &JsValue::from_f64(color.rgb.b as f64))?;
    set(&obj, "h", &JsValue::from_f64(color.hsl.h as f64))?;
    set(&obj, "s", &JsValue::from_f64(color.hsl.s as f64))?;
    set(&obj, "l", &JsValue::from_f64(color.hsl.l as f64))?;
    set(&obj, "x", &JsValue::from_f64(color.position.x as f64))?;
    set(&obj, "y", &JsValue::from_f64(color.position.y as f64))?;
    set(&obj, "prevalence", &JsValue::from_f64(color.prevalence as f64))?;
    set(&obj, "contrast", &JsValue::from_str(color.contrast().as_str()))?;
    if let Some(name) = &color.name {
        set(&obj, "name", &JsValue::from_str(name))?;
    }
    Ok(obj)
}

fn colors_to_js(colors: &[ExtractedColor]) -> JsResult<Array> {
    let out = Array::new();
    for color in colors {
        out.push(&JsValue::from(color_to_js(color)?));
    }
    Ok(out)
}

fn hex_array(values: &Array) -> JsResult<Vec<Rgb>> {
    values
        .iter()
        .map(|val| {
            let s = val
                .as_string()
                .ok_or_else(|| JsValue::from_str("Palette values must be strings"))?;
            hex_to_rgb(&s).map_err(js_err)
        })
        .collect()
}

fn swatches_from_js(colors: &Array, names: &Array) -> JsResult<Vec<NamedColor>> {
    let rgbs = hex_array(colors)?;
    Ok(rgbs
        .into_iter()
        .enumerate()
        .map(|(i, rgb)| {
            let name = names.get(i as u32).as_string().unwrap_or_default();
            NamedColor::new(rgb, name)
        })
        .collect())
}

/// Extract dominant and family palettes from an encoded image.
///
/// `config_json` is an optional `PaletteConfig` override. The returned object
/// has `dominant`, `family`, `width` and `height` fields; each color carries
/// `hex`, `r`/`g`/`b`, `h`/`s`/`l`, its source pixel `x`/`y`, `prevalence` and
/// the legible text `contrast`.
#[wasm_bindgen]
pub fn extract_palette(input: Vec<u8>, config_json: Option<String>) -> JsResult<Object> {
    let config = PaletteConfig::from_optional_json(config_json.as_deref()).map_err(js_err)?;
    let buffer = PixelBuffer::decode(&input).map_err(js_err)?;
    let palettes = extract_palettes(&buffer, &config).map_err(js_err)?;

    let result = Object::new();
    set(&result, "dominant", &JsValue::from(colors_to_js(&palettes.dominant)?))?;
    set(&result, "family", &JsValue::from(colors_to_js(&palettes.family)?))?;
    set(&result, "width", &JsValue::from_f64(buffer.width() as f64))?;
    set(&result, "height", &JsValue::from_f64(buffer.height() as f64))?;
    Ok(result)
}

/// Per-pixel highlight alpha (255 = matches any of `colors`).
#[wasm_bindgen]
pub fn spotlight_mask(input: Vec<u8>, colors: Array, threshold: f64) -> JsResult<Uint8Array> {
    let buffer = PixelBuffer::decode(&input).map_err(js_err)?;
    let targets = hex_array(&colors)?;
    let mask = create_multi_mask(&buffer, &targets, threshold);
    Ok(Uint8Array::from(mask.as_slice()))
}

/// RGBA dimming overlay for the hovered swatch(es), same size as the image.
#[wasm_bindgen]
pub fn spotlight_overlay(input: Vec<u8>, colors: Array, threshold: f64) -> JsResult<Uint8Array> {
    let buffer = PixelBuffer::decode(&input).map_err(js_err)?;
    let targets = hex_array(&colors)?;
    let overlay = spotlight::create_overlay(&buffer, &targets, threshold);
    Ok(Uint8Array::from(overlay.as_raw().as_slice()))
}

/// Color and clamped coordinate of the pixel under a crosshair.
#[wasm_bindgen]
pub fn pixel_color(input: Vec<u8>, x: f64, y: f64) -> JsResult<Object> {
    let buffer = PixelBuffer::decode(&input).map_err(js_err)?;
    let mut color = ExtractedColor::new(Rgb::BLACK, Position::default());
    if !color.repin(&buffer, x.round() as i64, y.round() as i64) {
        return Err(js_err(PaletteError::EmptyImage));
    }
    color_to_js(&color)
}

/// ACO swatch file from parallel arrays of hex strings and names.
#[wasm_bindgen]
pub fn export_aco(colors: Array, names: Array) -> JsResult<Uint8Array> {
    let swatches = swatches_from_js(&colors, &names)?;
    let bytes = to_aco(&swatches).map_err(js_err)?;
    Ok(Uint8Array::from(bytes.as_slice()))
}

/// Clip Studio color set from parallel arrays of hex strings and names.
#[wasm_bindgen]
pub fn export_cls(colors: Array, names: Array, set_name: String) -> JsResult<Uint8Array> {
    let swatches = swatches_from_js(&colors, &names)?;
    Ok(Uint8Array::from(to_cls(&swatches, &set_name).as_slice()))
}

/// PNG palette sheet for the given dominant and family hex colors.
#[wasm_bindgen]
pub fn export_palette_png(
    dominant: Array,
    family: Array,
    config_json: Option<String>,
) -> JsResult<Uint8Array> {
    let config = PaletteConfig::from_optional_json(config_json.as_deref()).map_err(js_err)?;
    let to_colors = |rgbs: Vec<Rgb>| -> Vec<ExtractedColor> {
        rgbs.into_iter()
            .map(|rgb| ExtractedColor::new(rgb, Position::default()))
            .collect()
    };
    let dominant = to_colors(hex_array(&dominant)?);
    let family = to_colors(hex_array(&family)?);
    let png = palette_png_bytes(&dominant, &family, &config.variations).map_err(js_err)?;
    Ok(Uint8Array::from(png.as_slice()))
}

// ------------------------------------------------------------
// Native helpers
// ------------------------------------------------------------

/// Encoded palette sheet (see [`palette_grid`]).
pub fn palette_png_bytes(
    dominant: &[ExtractedColor],
    family: &[ExtractedColor],
    spec: &VariationSpec,
) -> Result<Vec<u8>> {
    encode_png(&palette_grid(dominant, family, spec)?)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(input: &[u8], config: &PaletteConfig) -> Result<Palettes> {
    let buffer = PixelBuffer::decode(input)?;
    extract_palettes(&buffer, config)
}

/// Encoded PNG of the image with everything but the matching pixels dimmed.
#[cfg(not(target_arch = "wasm32"))]
pub fn spotlight_png_bytes(input: &[u8], targets: &[Rgb], threshold: f64) -> Result<Vec<u8>> {
    let buffer = PixelBuffer::decode(input)?;
    encode_png(&spotlight::spotlight_image(&buffer, targets, threshold))
}

/// All swatches of both palettes (with brightness and hue variants), minus
/// near black/white and duplicates, ready for [`to_aco`] or [`to_cls`].
pub fn export_swatches(palettes: &Palettes, config: &PaletteConfig) -> Vec<NamedColor> {
    let mut swatches =
        naming::collect_swatches(&palettes.dominant, &palettes.family, &config.variations);
    naming::retain_distinct(&mut swatches, config.extract.bw_threshold);
    swatches
}
