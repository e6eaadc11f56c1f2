//! Best-effort image operations.
//!
//! These combine the backend with the chosen thumbnail profile and turn
//! failures into explicit states. A file whose header cannot be read still
//! becomes a record, with [`DimensionProbe::Unknown`] and/or
//! [`ThumbnailState::Unavailable`].

use super::backend::ImageBackend;
use super::params::{ThumbnailParams, ThumbnailProfile};
use crate::types::{DimensionProbe, ThumbnailState};
use std::sync::Arc;

/// Configuration for thumbnail rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub profile: ThumbnailProfile,
    pub density: f32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            profile: ThumbnailProfile::Compact,
            density: 1.0,
        }
    }
}

impl ThumbnailConfig {
    pub fn params(&self) -> ThumbnailParams {
        ThumbnailParams::for_profile(self.profile, self.density)
    }
}

/// Probe pixel dimensions; any failure yields [`DimensionProbe::Unknown`].
pub fn probe_dimensions(backend: &impl ImageBackend, name: &str, bytes: &[u8]) -> DimensionProbe {
    match backend.identify(bytes) {
        Ok(dims) => DimensionProbe::Known(dims),
        Err(e) => {
            tracing::debug!(file = name, error = %e, "dimensions unavailable");
            DimensionProbe::Unknown
        }
    }
}

/// Render a thumbnail; any failure yields [`ThumbnailState::Unavailable`].
pub fn render_thumbnail(
    backend: &impl ImageBackend,
    name: &str,
    bytes: &[u8],
    config: &ThumbnailConfig,
) -> ThumbnailState {
    match backend.thumbnail(bytes, &config.params()) {
        Ok(thumb) => ThumbnailState::Ready(Arc::new(thumb)),
        Err(e) => {
            tracing::warn!(file = name, error = %e, "thumbnail generation failed");
            ThumbnailState::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}
