//! Per-file conversion: codec engine seam, dimension planning, output formats

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ConversionRequest;
use crate::error::{ResizError, Result};

pub mod codec;
pub mod formats;
pub mod plan;

pub use codec::ImageCodec;
pub use formats::*;
pub use plan::*;

/// Decode/resample/encode capability the orchestrator drives.
///
/// Implementations are called from blocking worker threads, one file per
/// call, and must not keep state between files that affects results.
pub trait CodecEngine: Send + Sync {
    /// Read width and height without decoding the pixel data.
    fn read_metadata(&self, path: &Path) -> Result<Dimensions>;

    /// Write `source` resized to `plan` as `format` at `output`.
    fn convert(
        &self,
        source: &Path,
        output: &Path,
        plan: DimensionPlan,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()>;
}

/// Convert one file end-to-end: metadata, plan, codec call.
///
/// Returns the path written. Every error here is scoped to `file`.
pub fn convert_file(
    codec: &dyn CodecEngine,
    request: &ConversionRequest,
    file: &Path,
) -> Result<PathBuf> {
    let original = codec.read_metadata(file)?;
    if original.width == 0 || original.height == 0 {
        return Err(ResizError::unreadable_dimensions(
            file,
            format!(
                "codec reported non-positive size {}x{}",
                original.width, original.height
            ),
        ));
    }

    let planned = plan(original, request.target_width(), request.target_height());
    let output = request.output_path_for(file)?;

    debug!(
        "Converting {:?}: {}x{} -> {}x{} as {}",
        file,
        original.width,
        original.height,
        planned.width,
        planned.height,
        request.output_format()
    );

    codec.convert(
        file,
        &output,
        planned,
        request.output_format(),
        request.quality(),
    )?;

    Ok(output)
}
