use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use palette_extractor_wasm::naming::apply_names;
use palette_extractor_wasm::{
    PaletteConfig, export_swatches, extract_palette_bytes, hex_to_rgb, palette_png_bytes,
    spotlight_png_bytes, to_aco, to_cls,
};

/// Extract dominant and family color palettes from images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of dominant colors
    #[arg(short = 'k', long)]
    n_colors: Option<usize>,

    /// Number of family colors
    #[arg(long)]
    family_k: Option<usize>,

    /// Minimum RGB distance of family colors from every dominant color
    #[arg(long)]
    min_distance: Option<f64>,

    /// Keep near-black and near-white pixels
    #[arg(long)]
    keep_black_white: bool,

    /// Random seed for cluster initialization
    #[arg(long)]
    seed: Option<u64>,

    /// JSON object mapping "#RRGGBB" to color names
    #[arg(long)]
    names: Option<PathBuf>,

    /// Write an Adobe swatch file (.aco)
    #[arg(long)]
    aco: bool,

    /// Write a Clip Studio color set (.cls)
    #[arg(long)]
    cls: bool,

    /// Write the palette sheet (.png)
    #[arg(long)]
    png: bool,

    /// Comma-separated hex colors to spotlight; writes a dimmed copy of the image
    #[arg(long)]
    spotlight: Option<String>,

    /// Output directory
    #[arg(short = 'd', long, default_value = ".")]
    out_dir: PathBuf,
}

impl Args {
    fn palette_config(&self) -> Result<PaletteConfig> {
        let mut config = match &self.config {
            Some(path) => PaletteConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PaletteConfig::default(),
        };
        if let Some(k) = self.n_colors {
            config.extract.k = k;
        }
        if let Some(k) = self.family_k {
            config.family.k = k;
        }
        if let Some(d) = self.min_distance {
            config.family.min_distance = d;
        }
        if let Some(seed) = self.seed {
            config.extract.seed = seed;
        }
        if self.keep_black_white {
            config.extract.filter_black_white = false;
        }
        Ok(config)
    }
}

fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("Saved → {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.palette_config()?;

    let names: Option<HashMap<String, String>> = match &args.names {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading names {}", path.display()))?;
            let raw: HashMap<String, String> =
                serde_json::from_str(&text).context("names file must be a JSON object")?;
            Some(raw.into_iter().map(|(k, v)| (k.to_uppercase(), v)).collect())
        }
        None => None,
    };

    let spotlight = match &args.spotlight {
        Some(list) => {
            let targets = list
                .split(',')
                .map(|s| hex_to_rgb(s.trim()))
                .collect::<Result<Vec<_>, _>>()
                .context("parsing --spotlight colors")?;
            if targets.is_empty() {
                bail!("--spotlight needs at least one color");
            }
            Some(targets)
        }
        None => None,
    };

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let mut palettes = extract_palette_bytes(&bytes, &config)
            .with_context(|| format!("extracting palette from {}", input.display()))?;
        if let Some(names) = &names {
            apply_names(&mut palettes.dominant, names);
            apply_names(&mut palettes.family, names);
        }
        info!(
            "{}: {} dominant, {} family",
            input.display(),
            palettes.dominant.len(),
            palettes.family.len()
        );

        println!("{}", serde_json::to_string_pretty(&palettes)?);

        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let out = |ext: &str| args.out_dir.join(format!("{stem}_palette.{ext}"));

        if args.aco || args.cls {
            let swatches = export_swatches(&palettes, &config);
            if args.aco {
                save(&out("aco"), &to_aco(&swatches)?)?;
            }
            if args.cls {
                save(&out("cls"), &to_cls(&swatches, "Color Palette"))?;
            }
        }
        if args.png {
            let png = palette_png_bytes(&palettes.dominant, &palettes.family, &config.variations)?;
            save(&out("png"), &png)?;
        }
        if let Some(targets) = &spotlight {
            let png = spotlight_png_bytes(&bytes, targets, config.spotlight_threshold)?;
            save(&args.out_dir.join(format!("{stem}_spotlight.png")), &png)?;
        }
    }

    Ok(())
}
