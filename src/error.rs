//! Error types and handling for Resiz

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Resiz operations
pub type Result<T> = std::result::Result<T, ResizError>;

/// Main error type for Resiz operations
#[derive(Debug, Error)]
pub enum ResizError {
    /// Source path is missing, unreadable, or could not be traversed
    #[error("Invalid source {path:?}: {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    /// Source file extension is not one of the supported formats
    #[error("Unsupported image format: {extension} (file: {file:?})")]
    UnsupportedFormat { extension: String, file: PathBuf },

    /// Source directory holds no eligible file
    #[error("Source directory {path:?} does not contain any supported image file")]
    EmptySource { path: PathBuf },

    /// Quality outside of `0..100`
    #[error("Invalid quality: {quality} (expected 0 <= quality < 100)")]
    InvalidQuality { quality: i64 },

    /// Destination could not be created or failed the write probe
    #[error("Destination {path:?} is not writable: {source}")]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Codec engine could not report positive width and height
    #[error("Unable to read dimensions of {file:?}: {reason}")]
    UnreadableDimensions { file: PathBuf, reason: String },

    /// Conversion or encode failure for one file
    #[error("Conversion failed for {file:?}: {detail}")]
    CodecError { file: PathBuf, detail: String },

    /// Invalid target dimensions or other option values
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serde(String),

    /// Worker slot failures (panicked or cancelled unit of work)
    #[error("Parallel processing error: {message}")]
    Parallel { message: String },
}

/// Discriminant of [`ResizError`], cheap to copy into task outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidSource,
    UnsupportedFormat,
    EmptySource,
    InvalidQuality,
    DestinationNotWritable,
    UnreadableDimensions,
    CodecError,
    InvalidParameters,
    Config,
    Serde,
    Parallel,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidSource => "invalid source",
            Self::UnsupportedFormat => "unsupported format",
            Self::EmptySource => "empty source",
            Self::InvalidQuality => "invalid quality",
            Self::DestinationNotWritable => "destination not writable",
            Self::UnreadableDimensions => "unreadable dimensions",
            Self::CodecError => "codec error",
            Self::InvalidParameters => "invalid parameters",
            Self::Config => "configuration error",
            Self::Serde => "serialization error",
            Self::Parallel => "worker failure",
        };
        f.write_str(name)
    }
}

impl ResizError {
    /// Create a new invalid source error
    pub fn invalid_source<S: Into<String>>(path: impl Into<PathBuf>, reason: S) -> Self {
        Self::InvalidSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(extension: S, file: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
            file: file.into(),
        }
    }

    /// Create a new empty source error
    pub fn empty_source(path: impl Into<PathBuf>) -> Self {
        Self::EmptySource { path: path.into() }
    }

    /// Create a new destination error wrapping the underlying cause
    pub fn destination_not_writable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DestinationNotWritable {
            path: path.into(),
            source,
        }
    }

    /// Create a new unreadable dimensions error
    pub fn unreadable_dimensions<S: Into<String>>(file: impl Into<PathBuf>, reason: S) -> Self {
        Self::UnreadableDimensions {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Create a new codec error
    pub fn codec<S: Into<String>>(file: impl Into<PathBuf>, detail: S) -> Self {
        Self::CodecError {
            file: file.into(),
            detail: detail.into(),
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new parallel processing error
    pub fn parallel<S: Into<String>>(message: S) -> Self {
        Self::Parallel {
            message: message.into(),
        }
    }

    /// Discriminant of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSource { .. } => ErrorKind::InvalidSource,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::EmptySource { .. } => ErrorKind::EmptySource,
            Self::InvalidQuality { .. } => ErrorKind::InvalidQuality,
            Self::DestinationNotWritable { .. } => ErrorKind::DestinationNotWritable,
            Self::UnreadableDimensions { .. } => ErrorKind::UnreadableDimensions,
            Self::CodecError { .. } => ErrorKind::CodecError,
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::Config { .. } => ErrorKind::Config,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Parallel { .. } => ErrorKind::Parallel,
        }
    }

    /// Whether this error aborts the whole batch before any task is dispatched
    pub fn is_batch_fatal(&self) -> bool {
        match self {
            Self::InvalidSource { .. }
            | Self::UnsupportedFormat { .. }
            | Self::EmptySource { .. }
            | Self::InvalidQuality { .. }
            | Self::DestinationNotWritable { .. }
            | Self::InvalidParameters { .. }
            | Self::Config { .. }
            | Self::Serde(_) => true,

            // Recorded per file, siblings keep running
            Self::UnreadableDimensions { .. }
            | Self::CodecError { .. }
            | Self::Parallel { .. } => false,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::InvalidSource { path, .. }
            | Self::EmptySource { path }
            | Self::DestinationNotWritable { path, .. } => Some(path.as_path()),

            Self::UnsupportedFormat { file, .. }
            | Self::UnreadableDimensions { file, .. }
            | Self::CodecError { file, .. } => Some(file.as_path()),

            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat { extension, .. } => {
                format!(
                    "Unsupported image format: {}. Supported formats: {}",
                    extension,
                    crate::paths::SUPPORTED_EXTENSIONS.join(", ")
                )
            }
            Self::EmptySource { path } => {
                format!("No supported image files found under {}", path.display())
            }
            Self::InvalidQuality { quality } => {
                format!("Quality must be between 0 and 99, got {}", quality)
            }
            Self::DestinationNotWritable { path, source } => {
                format!("Cannot write to {}: {}", path.display(), source)
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResizError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ResizError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serde(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension mapping codec-side failures onto one file
pub trait CodecContext<T> {
    /// Convert any displayable error into [`ResizError::CodecError`] for `file`
    fn codec_context(self, file: &Path) -> Result<T>;
}

impl<T, E> CodecContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn codec_context(self, file: &Path) -> Result<T> {
        self.map_err(|e| ResizError::codec(file, e.to_string()))
    }
}
