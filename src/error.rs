use std::fmt;

/// Result type alias used throughout the palette engine.
pub type Result<T> = std::result::Result<T, PaletteError>;

/// Everything that can go wrong inside the palette engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteError {
    /// A color string could not be parsed.
    InvalidFormat(String),
    /// No pixels survived sampling.
    EmptyImage,
    /// Cluster count is zero or exceeds the number of samples.
    InvalidK { k: usize, samples: usize },
    /// Sampling stride must be at least 1.
    InvalidStride,
    /// The image decode collaborator failed.
    ImageLoad(String),
    /// The swatch file format cannot hold this many colors.
    TooManyColors { count: usize, max: usize },
    /// Nothing to draw.
    EmptyPalette,
    /// Raster encoding failed.
    Encode(String),
    /// A configuration file or JSON override could not be used.
    Config(String),
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::InvalidFormat(input) => {
                write!(f, "Invalid hex color '{input}': expected 6 hex digits")
            }
            PaletteError::EmptyImage => write!(f, "Image has no usable pixels to sample"),
            PaletteError::InvalidK { k, samples } => write!(
                f,
                "Invalid cluster count {k}: must be between 1 and the sample count ({samples})"
            ),
            PaletteError::InvalidStride => write!(f, "Sample stride must be a positive integer"),
            PaletteError::ImageLoad(reason) => write!(f, "Unable to load image: {reason}"),
            PaletteError::TooManyColors { count, max } => {
                write!(f, "Too many colors for swatch file: {count} (max {max})")
            }
            PaletteError::EmptyPalette => write!(f, "No colors to export"),
            PaletteError::Encode(reason) => write!(f, "Image encode error: {reason}"),
            PaletteError::Config(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for PaletteError {}

impl From<image::ImageError> for PaletteError {
    fn from(err: image::ImageError) -> Self {
        PaletteError::ImageLoad(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_offending_values() {
        let err = PaletteError::InvalidK { k: 9, samples: 4 };
        let text = err.to_string();
        assert!(text.contains('9'));
        assert!(text.contains('4'));

        let err = PaletteError::InvalidFormat("#GGHHII".into());
        assert!(err.to_string().contains("#GGHHII"));
    }
}
