//! Tunables for a full extraction run, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```
//! use palette_extractor_wasm::PaletteConfig;
//!
//! let config = PaletteConfig::from_json(r#"{ "extract": { "k": 8 } }"#).unwrap();
//! assert_eq!(config.extract.k, 8);
//! assert!(config.extract.filter_black_white);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PaletteError, Result};
use crate::extractor::{DEFAULT_COLOR_COUNT, DEFAULT_FAMILY_DISTANCE, ExtractOptions};
use crate::spotlight::DEFAULT_THRESHOLD;
use crate::variants::VariationSpec;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyOptions {
    pub k: usize,
    pub min_distance: f64,
}

impl Default for FamilyOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_COLOR_COUNT,
            min_distance: DEFAULT_FAMILY_DISTANCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub extract: ExtractOptions,
    pub family: FamilyOptions,
    pub variations: VariationSpec,
    pub spotlight_threshold: f64,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            family: FamilyOptions::default(),
            variations: VariationSpec::default(),
            spotlight_threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<ConfigError> for PaletteError {
    fn from(err: ConfigError) -> Self {
        PaletteError::Config(err.to_string())
    }
}

impl PaletteConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse an optional JSON override, falling back to defaults.
    pub fn from_optional_json(json: Option<&str>) -> Result<Self> {
        match json {
            Some(s) if !s.trim().is_empty() => Ok(Self::from_json(s)?),
            _ => Ok(Self::default()),
        }
    }

    /// Extraction options for the family pass: the shared sampling and
    /// clustering settings with the family color count.
    pub fn family_extract_options(&self) -> ExtractOptions {
        ExtractOptions { k: self.family.k, ..self.extract }
    }
}
