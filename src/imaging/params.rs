//! Parameter types for thumbnail rendering.
//!
//! These structs describe *what* to render, not *how*. They sit between the
//! [`operations`](super::operations) module (which picks a profile and a pixel
//! density) and the [`backend`](super::backend) (which does the pixel work),
//! so a mock backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ThumbnailFormat`]: Lossy JPEG at a fixed quality, or lossless PNG.
//! - [`ThumbnailProfile`]: The two supported size/format trade-offs.
//! - [`ThumbnailParams`]: Bounding box, pixel density and output format for one render.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Encoding of a rendered thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    Jpeg(Quality),
    Png,
}

impl ThumbnailFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg(_) => "image/jpeg",
            ThumbnailFormat::Png => "image/png",
        }
    }
}

/// Size/format trade-off for thumbnails.
///
/// - `Compact`: fits 320×240, JPEG at quality 90. Bounded memory.
/// - `Lossless`: fits 400×300, PNG. Sharper, several times larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailProfile {
    #[default]
    Compact,
    Lossless,
}

impl ThumbnailProfile {
    /// Bounding box as `(max_width, max_height)` in CSS pixels.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            ThumbnailProfile::Compact => (320, 240),
            ThumbnailProfile::Lossless => (400, 300),
        }
    }

    pub fn format(self) -> ThumbnailFormat {
        match self {
            ThumbnailProfile::Compact => ThumbnailFormat::Jpeg(Quality::new(90)),
            ThumbnailProfile::Lossless => ThumbnailFormat::Png,
        }
    }

    /// Average encoded size used for memory estimates.
    pub fn average_encoded_bytes(self) -> u64 {
        match self {
            ThumbnailProfile::Compact => 120 * 1024,
            ThumbnailProfile::Lossless => 360 * 1024,
        }
    }
}

/// Parameters for one thumbnail render (decode, fit, scale, encode).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailParams {
    pub max_width: u32,
    pub max_height: u32,
    /// Device pixel ratio; the backend clamps it to `[1, 2]`.
    pub density: f32,
    pub format: ThumbnailFormat,
}

impl ThumbnailParams {
    pub fn for_profile(profile: ThumbnailProfile, density: f32) -> Self {
        let (max_width, max_height) = profile.bounds();
        Self {
            max_width,
            max_height,
            density,
            format: profile.format(),
        }
    }
}
