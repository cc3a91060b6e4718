//! Output dimension planning
//!
//! All functions here are pure and testable without any I/O or images.

use serde::Serialize;

/// Width and height of an image as reported by the codec engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Target size computed for one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionPlan {
    pub width: u32,
    pub height: u32,
}

impl DimensionPlan {
    /// Whether the plan keeps the original size
    pub fn is_identity(self, original: Dimensions) -> bool {
        self.width == original.width && self.height == original.height
    }
}

/// Compute output dimensions from the original size and optional targets.
///
/// | width | height | result |
/// |---|---|---|
/// | set | set | `(width, height)` |
/// | unset | unset | original |
/// | unset | set | `(height * ratio, height)` |
/// | set | unset | `(width, width / ratio)` |
///
/// Ratio-scaled sides are truncated toward zero and never drop below 1.
/// `original` must have positive width and height.
///
/// # Examples
/// ```
/// # use resiz::processing::{plan, Dimensions, DimensionPlan};
/// let planned = plan(Dimensions::new(200, 100), Some(400), None);
/// assert_eq!(planned, DimensionPlan { width: 400, height: 200 });
/// ```
pub fn plan(
    original: Dimensions,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> DimensionPlan {
    let ratio = original.aspect_ratio();

    let (width, height) = match (target_width, target_height) {
        (Some(width), Some(height)) => (width, height),
        (None, None) => (original.width, original.height),
        (None, Some(height)) => (truncate(f64::from(height) * ratio), height),
        (Some(width), None) => (width, truncate(f64::from(width) / ratio)),
    };

    DimensionPlan { width, height }
}

fn truncate(value: f64) -> u32 {
    // `as` saturates on overflow and truncates toward zero
    (value.trunc() as u32).max(1)
}
