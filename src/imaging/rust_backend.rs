//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the params' quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |

use super::backend::{BackendError, ImageBackend};
use super::calculations::{fit_within, scale_for_density};
use super::params::{ThumbnailFormat, ThumbnailParams};
use crate::types::{Dimensions, Thumbnail};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(BackendError::UnknownFormat);
    }
    Ok(reader)
}

/// Decode an in-memory image, sniffing the format from its magic bytes.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    reader(bytes)?
        .decode()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))
}

fn encode(img: &DynamicImage, format: ThumbnailFormat) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match format {
        ThumbnailFormat::Jpeg(quality) => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buf,
                quality.value() as u8,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
        }
        ThumbnailFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut buf);
            img.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
        }
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(bytes)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(
        &self,
        bytes: &[u8],
        params: &ThumbnailParams,
    ) -> Result<Thumbnail, BackendError> {
        let img = load_image(bytes)?;
        let display = fit_within(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        if display == (0, 0) {
            return Err(BackendError::ProcessingFailed("Empty image".into()));
        }
        let (width, height) = scale_for_density(display, params.density);

        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        let bytes = encode(&resized, params.format)?;

        Ok(Thumbnail {
            bytes,
            mime: params.format.mime(),
            width,
            height,
        })
    }
}
