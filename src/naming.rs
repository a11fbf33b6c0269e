//! Swatch names: the best-effort color-name collaborator and the display
//! names written into exported swatch files.

use std::collections::{HashMap, HashSet};

use crate::color_space::{Rgb, is_black_or_white};
use crate::encoder::NamedColor;
use crate::extractor::ExtractedColor;
use crate::variants::{VariationSpec, adjust_brightness, adjust_hue, brightness_delta};

/// Fallback when no collaborator name is known.
pub const UNNAMED: &str = "Color";

/// Looks up human-readable names for hex colors. Lookups are best effort;
/// `None` leaves the swatch unnamed.
pub trait ColorNamer {
    fn name(&self, hex: &str) -> Option<String>;
}

impl ColorNamer for HashMap<String, String> {
    fn name(&self, hex: &str) -> Option<String> {
        self.get(&hex.to_uppercase()).cloned()
    }
}

/// Fill in `name` for every color the collaborator knows.
pub fn apply_names<N: ColorNamer + ?Sized>(colors: &mut [ExtractedColor], namer: &N) {
    for color in colors {
        if let Some(name) = namer.name(&color.hex) {
            color.name = Some(name);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteKind {
    Dominant,
    Accent,
}

impl PaletteKind {
    fn prefix(self) -> &'static str {
        match self {
            PaletteKind::Dominant => "dom",
            PaletteKind::Accent => "acc",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Variation {
    Base,
    Brightness(f64),
    Hue(f64),
}

/// `"dom #1 - Name"`, `"dom #1 (1.5x) - Name"`, `"acc #2 (+10°) - Name"`.
pub fn display_name(index: usize, name: &str, kind: PaletteKind, variation: Variation) -> String {
    let prefix = kind.prefix();
    let number = index + 1;
    match variation {
        Variation::Brightness(factor) if factor != 1.0 => {
            format!("{prefix} #{number} ({factor}x) - {name}")
        }
        Variation::Hue(shift) if shift != 0.0 => {
            let sign = if shift >= 0.0 { "+" } else { "" };
            format!("{prefix} #{number} ({sign}{shift}°) - {name}")
        }
        _ => format!("{prefix} #{number} - {name}"),
    }
}

/// Every swatch of an export: each base color, then its brightness variants
/// (factor ≠ 1) and hue variants (shift ≠ 0). Dominant colors come first.
pub fn collect_swatches(
    dominant: &[ExtractedColor],
    family: &[ExtractedColor],
    spec: &VariationSpec,
) -> Vec<NamedColor> {
    let mut out = Vec::new();
    for (colors, kind) in [(dominant, PaletteKind::Dominant), (family, PaletteKind::Accent)] {
        for (index, color) in colors.iter().enumerate() {
            let name = color.name.as_deref().unwrap_or(UNNAMED);
            out.push(NamedColor::new(
                color.rgb,
                display_name(index, name, kind, Variation::Base),
            ));
            for &factor in spec.brightness_factors.iter().filter(|&&f| f != 1.0) {
                out.push(NamedColor::new(
                    adjust_brightness(color.rgb, brightness_delta(factor)),
                    display_name(index, name, kind, Variation::Brightness(factor)),
                ));
            }
            for &shift in spec.hue_shifts.iter().filter(|&&s| s != 0.0) {
                out.push(NamedColor::new(
                    adjust_hue(color.rgb, shift),
                    display_name(index, name, kind, Variation::Hue(shift)),
                ));
            }
        }
    }
    out
}

/// Drop near-black/white swatches and repeated colors, keeping the first
/// occurrence of each color.
pub fn retain_distinct(swatches: &mut Vec<NamedColor>, bw_threshold: u8) {
    let mut seen: HashSet<Rgb> = HashSet::new();
    swatches.retain(|s| !is_black_or_white(s.rgb, bw_threshold) && seen.insert(s.rgb));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::Position;

    fn color(rgb: Rgb, name: Option<&str>) -> ExtractedColor {
        let mut c = ExtractedColor::new(rgb, Position::default());
        c.name = name.map(str::to_string);
        c
    }

    #[test]
    fn display_names_match_export_convention() {
        assert_eq!(
            display_name(0, "Crimson", PaletteKind::Dominant, Variation::Base),
            "dom #1 - Crimson"
        );
        assert_eq!(
            display_name(0, "Crimson", PaletteKind::Dominant, Variation::Brightness(1.5)),
            "dom #1 (1.5x) - Crimson"
        );
        assert_eq!(
            display_name(1, "Teal", PaletteKind::Accent, Variation::Hue(10.0)),
            "acc #2 (+10°) - Teal"
        );
        assert_eq!(
            display_name(1, "Teal", PaletteKind::Accent, Variation::Hue(-20.0)),
            "acc #2 (-20°) - Teal"
        );
        assert_eq!(
            display_name(2, "Teal", PaletteKind::Accent, Variation::Brightness(1.0)),
            "acc #3 - Teal"
        );
    }

    #[test]
    fn names_come_from_the_collaborator() {
        let mut colors = vec![color(Rgb::new(255, 0, 0), None), color(Rgb::new(1, 2, 3), None)];
        let mut lookup = HashMap::new();
        lookup.insert("#FF0000".to_string(), "Red".to_string());
        apply_names(&mut colors, &lookup);
        assert_eq!(colors[0].name.as_deref(), Some("Red"));
        assert_eq!(colors[1].name, None);
    }

    #[test]
    fn swatch_collection_skips_identity_variants() {
        let dominant = vec![color(Rgb::new(200, 40, 40), Some("Brick"))];
        let family = vec![color(Rgb::new(40, 200, 40), None)];
        let swatches = collect_swatches(&dominant, &family, &VariationSpec::default());
        // 1 base + 4 brightness + 3 hue per color.
        assert_eq!(swatches.len(), 16);
        assert_eq!(swatches[0].name, "dom #1 - Brick");
        assert_eq!(swatches[1].name, "dom #1 (0.5x) - Brick");
        assert_eq!(swatches[5].name, "dom #1 (+10°) - Brick");
        assert_eq!(swatches[8].name, "acc #1 - Color");
        assert_eq!(swatches[8].rgb, Rgb::new(40, 200, 40));
    }

    #[test]
    fn retain_distinct_drops_extremes_and_duplicates() {
        let mut swatches = vec![
            NamedColor::new(Rgb::new(200, 40, 40), "a"),
            NamedColor::new(Rgb::BLACK, "b"),
            NamedColor::new(Rgb::new(200, 40, 40), "c"),
            NamedColor::new(Rgb::new(250, 251, 252), "d"),
            NamedColor::new(Rgb::new(10, 200, 10), "e"),
        ];
        retain_distinct(&mut swatches, 15);
        let names: Vec<_> = swatches.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "e"]);
    }
}
