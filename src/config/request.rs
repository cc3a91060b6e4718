//! Batch options and the immutable conversion request built from them

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResizError, Result};
use crate::processing::formats::{output_file_name, OutputFormat};

/// Quality used when the caller does not pass one
pub const DEFAULT_QUALITY: u8 = 90;

/// Largest accepted target dimension
pub const MAX_DIMENSION: u32 = 65_535;

/// Raw options for one batch run, as supplied by a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Source file or directory
    pub source: PathBuf,

    /// Destination directory (None = `resized_<timestamp>` next to the source)
    pub destination: Option<PathBuf>,

    /// Target width in pixels
    pub width: Option<u32>,

    /// Target height in pixels
    pub height: Option<u32>,

    /// Output quality, `0 <= quality < 100`
    pub quality: Option<i64>,

    /// Output format name; unrecognized names fall back to jpg
    pub format: Option<String>,
}

impl BatchOptions {
    /// Create options for a source path
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Set destination directory
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set target width
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set target height
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set quality
    pub fn quality(mut self, quality: i64) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set output format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Check value ranges and resolve the output format.
    ///
    /// Touches no filesystem state.
    pub fn validate(&self) -> Result<ValidatedOptions> {
        if self.source.as_os_str().is_empty() {
            return Err(ResizError::invalid_source(
                &self.source,
                "source file or directory is missing",
            ));
        }

        let quality = validate_quality(self.quality.unwrap_or(i64::from(DEFAULT_QUALITY)))?;
        let width = validate_dimension("width", self.width)?;
        let height = validate_dimension("height", self.height)?;
        let format = OutputFormat::parse_or_default(self.format.as_deref());

        Ok(ValidatedOptions {
            source: self.source.clone(),
            destination: self.destination.clone(),
            width,
            height,
            quality,
            format,
        })
    }
}

/// Check that `quality` lies in `0..100`
pub fn validate_quality(quality: i64) -> Result<u8> {
    if (0..100).contains(&quality) {
        // in range, so the cast is lossless
        Ok(quality as u8)
    } else {
        Err(ResizError::InvalidQuality { quality })
    }
}

fn validate_dimension(name: &str, value: Option<u32>) -> Result<Option<u32>> {
    match value {
        Some(0) => Err(ResizError::invalid_parameters(format!(
            "{} must be greater than 0",
            name
        ))),
        Some(v) if v > MAX_DIMENSION => Err(ResizError::invalid_parameters(format!(
            "{} must be at most {}, got {}",
            name, MAX_DIMENSION, v
        ))),
        other => Ok(other),
    }
}

/// Options that passed range validation but have not touched the filesystem
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOptions {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    pub format: OutputFormat,
}

impl ValidatedOptions {
    /// Freeze into a request once source and destination are resolved
    pub fn into_request(self, source_path: PathBuf, destination_dir: PathBuf) -> ConversionRequest {
        ConversionRequest {
            source_path,
            destination_dir,
            target_width: self.width,
            target_height: self.height,
            output_format: self.format,
            quality: self.quality,
        }
    }
}

/// Immutable per-batch request shared read-only by every worker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRequest {
    source_path: PathBuf,
    destination_dir: PathBuf,
    target_width: Option<u32>,
    target_height: Option<u32>,
    output_format: OutputFormat,
    quality: u8,
}

impl ConversionRequest {
    /// Absolute source file or directory
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Absolute, writable destination directory
    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    pub fn target_width(&self) -> Option<u32> {
        self.target_width
    }

    pub fn target_height(&self) -> Option<u32> {
        self.target_height
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Where the converted version of `file` is written
    pub fn output_path_for(&self, file: &Path) -> Result<PathBuf> {
        let name = output_file_name(file, self.output_format)
            .ok_or_else(|| ResizError::codec(file, "source path has no file name"))?;
        Ok(self.destination_dir.join(name))
    }
}
