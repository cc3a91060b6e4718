//! Default codec engine backed by the `image` crate

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::error::{CodecContext, ResizError, Result};
use crate::processing::{CodecEngine, DimensionPlan, Dimensions, OutputFormat};

/// Pure-Rust codec: header-only metadata reads, Lanczos3 cover resize
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }

    fn resize(image: DynamicImage, plan: DimensionPlan) -> DynamicImage {
        let original = Dimensions::new(image.width(), image.height());
        if plan.is_identity(original) {
            return image;
        }
        image.resize_to_fill(plan.width, plan.height, FilterType::Lanczos3)
    }

    /// Only JPEG takes `quality`; the linked WebP encoder is lossless and
    /// PNG, GIF and TIFF have no quality knob.
    fn encode(
        image: &DynamicImage,
        output: &Path,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        match format {
            jpeg if jpeg.is_jpeg() => {
                let file = File::create(output).codec_context(output)?;
                let mut writer = BufWriter::new(file);
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
                rgb.write_with_encoder(encoder).codec_context(output)?;
                writer.flush().codec_context(output)
            }
            OutputFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
                .save_with_format(output, image::ImageFormat::Gif)
                .codec_context(output),
            OutputFormat::Raw => {
                std::fs::write(output, image.to_rgba8().as_raw()).codec_context(output)
            }
            other => {
                let image_format = other.image_format().ok_or_else(|| {
                    ResizError::codec(output, format!("no encoder linked for {}", other))
                })?;
                image
                    .save_with_format(output, image_format)
                    .codec_context(output)
            }
        }
    }
}

impl CodecEngine for ImageCodec {
    fn read_metadata(&self, path: &Path) -> Result<Dimensions> {
        let (width, height) = image::image_dimensions(path)
            .map_err(|e| ResizError::unreadable_dimensions(path, e.to_string()))?;
        Ok(Dimensions::new(width, height))
    }

    fn convert(
        &self,
        source: &Path,
        output: &Path,
        plan: DimensionPlan,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        // Fail before decoding when nothing could write the result
        if format != OutputFormat::Raw && format.image_format().is_none() {
            return Err(ResizError::codec(
                source,
                format!("no encoder linked for {}", format),
            ));
        }

        let image = image::open(source).codec_context(source)?;
        let resized = Self::resize(image, plan);

        debug!(
            "Encoding {:?} ({}x{}, {}, quality {})",
            output,
            resized.width(),
            resized.height(),
            format,
            quality
        );

        Self::encode(&resized, output, format, quality)
    }
}
