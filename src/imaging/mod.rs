//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Thumbnail** | fit-to-box + density scale, Lanczos3, JPEG or PNG encode |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a thumbnail render
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Best-effort wrappers turning failures into explicit states

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{clamp_density, fit_within, scale_for_density};
pub use operations::{ThumbnailConfig, probe_dimensions, render_thumbnail};
pub use params::{Quality, ThumbnailFormat, ThumbnailParams, ThumbnailProfile};
pub use rust_backend::RustBackend;
