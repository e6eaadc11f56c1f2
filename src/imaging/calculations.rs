//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Highest device pixel ratio a thumbnail is rendered at.
pub const MAX_DENSITY: f32 = 2.0;

/// Fit `source` inside `bound`, preserving aspect ratio.
///
/// Never upscales: an image already inside the box keeps its size. Each side
/// is at least one pixel so extreme aspect ratios still produce a raster.
///
/// # Examples
/// ```
/// # use gallery_pick::imaging::fit_within;
/// // 4000x3000 landscape into 320x240 → 320x240
/// assert_eq!(fit_within((4000, 3000), (320, 240)), (320, 240));
///
/// // 1000x2000 portrait into 320x240 → 120x240
/// assert_eq!(fit_within((1000, 2000), (320, 240)), (120, 240));
/// ```
pub fn fit_within(source: (u32, u32), bound: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bound;
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }

    let scale = (max_w as f64 / src_w as f64)
        .min(max_h as f64 / src_h as f64)
        .min(1.0);

    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Clamp a device pixel ratio into `[1, MAX_DENSITY]`.
///
/// Non-finite input falls back to 1.
pub fn clamp_density(density: f32) -> f32 {
    if density.is_finite() {
        density.clamp(1.0, MAX_DENSITY)
    } else {
        1.0
    }
}

/// Multiply display dimensions by the (clamped) pixel density.
pub fn scale_for_density(dims: (u32, u32), density: f32) -> (u32, u32) {
    let d = clamp_density(density) as f64;
    let (w, h) = dims;
    (
        ((w as f64 * d).round() as u32).max(1),
        ((h as f64 * d).round() as u32).max(1),
    )
}
