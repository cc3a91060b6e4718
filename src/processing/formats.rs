//! Output format selection and extension handling

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Output formats understood by the orchestrator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Jpg,
    Png,
    Webp,
    Gif,
    Jp2,
    Tiff,
    Avif,
    Heif,
    Jxl,
    Raw,
    Tile,
}

impl OutputFormat {
    /// Format used when none is given or the given one is not recognized
    pub const DEFAULT: OutputFormat = OutputFormat::Jpg;

    /// Every output format, in display order
    pub const ALL: [OutputFormat; 12] = [
        Self::Jpeg,
        Self::Jpg,
        Self::Png,
        Self::Webp,
        Self::Gif,
        Self::Jp2,
        Self::Tiff,
        Self::Avif,
        Self::Heif,
        Self::Jxl,
        Self::Raw,
        Self::Tile,
    ];

    /// Parse a format name, case-insensitive, with or without a leading dot
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('.');
        match name.to_ascii_lowercase().as_str() {
            "jpeg" => Some(Self::Jpeg),
            "jpg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "jp2" => Some(Self::Jp2),
            "tiff" => Some(Self::Tiff),
            "avif" => Some(Self::Avif),
            "heif" => Some(Self::Heif),
            "jxl" => Some(Self::Jxl),
            "raw" => Some(Self::Raw),
            "tile" => Some(Self::Tile),
            _ => None,
        }
    }

    /// Parse a format name, falling back to [`OutputFormat::DEFAULT`]
    ///
    /// An unrecognized name never fails the batch.
    pub fn parse_or_default(name: Option<&str>) -> Self {
        match name {
            None => Self::DEFAULT,
            Some(name) => Self::parse(name).unwrap_or_else(|| {
                warn!(
                    "Unrecognized output format '{}', falling back to {}",
                    name,
                    Self::DEFAULT
                );
                Self::DEFAULT
            }),
        }
    }

    /// File extension written for this format, spelled as requested
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Jp2 => "jp2",
            Self::Tiff => "tiff",
            Self::Avif => "avif",
            Self::Heif => "heif",
            Self::Jxl => "jxl",
            Self::Raw => "raw",
            Self::Tile => "tile",
        }
    }

    /// Both JPEG spellings share one encoder
    pub fn is_jpeg(self) -> bool {
        matches!(self, Self::Jpeg | Self::Jpg)
    }

    /// Matching `image` crate format, if the linked encoders can write it
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Jpeg | Self::Jpg => Some(image::ImageFormat::Jpeg),
            Self::Png => Some(image::ImageFormat::Png),
            Self::Webp => Some(image::ImageFormat::WebP),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Tiff => Some(image::ImageFormat::Tiff),
            Self::Jp2 | Self::Avif | Self::Heif | Self::Jxl | Self::Raw | Self::Tile => None,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output file name for `source`: its stem with the format's extension
pub fn output_file_name(source: &Path, format: OutputFormat) -> Option<String> {
    let stem = source.file_stem()?.to_string_lossy();
    Some(format!("{}.{}", stem, format.extension()))
}
