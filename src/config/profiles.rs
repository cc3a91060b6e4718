//! Named option bundles for common use cases

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::request::{validate_quality, BatchOptions};
use crate::error::{ResizError, Result};
use crate::processing::OutputFormat;

/// A profile fills in batch options the caller did not set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Profile {
    /// Target width in pixels
    pub width: Option<u32>,

    /// Target height in pixels
    pub height: Option<u32>,

    /// Output quality (0-99)
    pub quality: Option<i64>,

    /// Output format name
    pub format: Option<String>,
}

impl Profile {
    /// Profile with a target width
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Default::default()
        }
    }

    /// Profile with both target dimensions
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    /// Set the output quality
    pub fn quality(mut self, quality: i64) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set the output format
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format.extension().to_string());
        self
    }

    /// Validate the profile values
    pub fn validate(&self) -> Result<()> {
        if let Some(quality) = self.quality {
            validate_quality(quality)?;
        }

        if self.width == Some(0) || self.height == Some(0) {
            return Err(ResizError::invalid_parameters(
                "Profile dimensions must be greater than 0",
            ));
        }

        if let Some(format) = &self.format {
            if OutputFormat::parse(format).is_none() {
                return Err(ResizError::invalid_parameters(format!(
                    "Unknown output format '{}'",
                    format
                )));
            }
        }

        Ok(())
    }

    /// Fill unset fields of `options`
    pub fn apply_to(&self, mut options: BatchOptions) -> BatchOptions {
        // Dimensions travel as a pair so a caller's width is not combined
        // with a profile's height
        if options.width.is_none() && options.height.is_none() {
            options.width = self.width;
            options.height = self.height;
        }
        if options.quality.is_none() {
            options.quality = self.quality;
        }
        if options.format.is_none() {
            options.format = self.format.clone();
        }
        options
    }
}

/// Predefined profiles
pub struct Profiles;

impl Profiles {
    /// Web optimization profile
    pub fn web() -> Profile {
        Profile::width(1920).quality(85).format(OutputFormat::Webp)
    }

    /// Mobile optimization profile
    pub fn mobile() -> Profile {
        Profile::width(768).quality(75).format(OutputFormat::Webp)
    }

    /// Square thumbnail profile
    pub fn thumbnail() -> Profile {
        Profile::exact(300, 300).quality(80).format(OutputFormat::Webp)
    }

    /// Email attachment profile (small file size)
    pub fn email() -> Profile {
        Profile::width(800).quality(70).format(OutputFormat::Jpg)
    }

    /// Get all predefined profiles
    pub fn all() -> HashMap<String, Profile> {
        let mut profiles = HashMap::new();
        profiles.insert("web".to_string(), Self::web());
        profiles.insert("mobile".to_string(), Self::mobile());
        profiles.insert("thumbnail".to_string(), Self::thumbnail());
        profiles.insert("email".to_string(), Self::email());
        profiles
    }
}
