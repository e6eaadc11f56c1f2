//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the scanner needs:
//! identify (read pixel dimensions) and thumbnail (decode, fit, encode).
//! Both work on in-memory bytes because picked files are read once and the
//! same buffer feeds both operations.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ThumbnailParams;
use crate::types::{Dimensions, Thumbnail};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Backends are shared across the rayon pool, hence `Sync`.
pub trait ImageBackend: Sync {
    /// Get image dimensions, reading no more than the header where possible.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, fit into the params' bounding box at the params' density, encode.
    fn thumbnail(&self, bytes: &[u8], params: &ThumbnailParams)
    -> Result<Thumbnail, BackendError>;
}
