//! Pure calculation functions for dimensions and sample mapping.
//!
//! All functions here are pure and testable without any rasters.

/// Width over height.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    width as f64 / height as f64
}

/// Height that keeps `ratio` for the given width: `round(width / ratio)`.
///
/// # Examples
/// ```
/// # use cropkit::imaging::locked_height;
/// assert_eq!(locked_height(400, 1000.0 / 800.0), 320);
/// assert_eq!(locked_height(333, 4.0 / 3.0), 250);
/// ```
pub fn locked_height(width: i64, ratio: f64) -> i64 {
    (width as f64 / ratio).round() as i64
}

/// Width that keeps `ratio` for the given height: `round(height * ratio)`.
pub fn locked_width(height: i64, ratio: f64) -> i64 {
    (height as f64 * ratio).round() as i64
}

/// Step a dimension by `delta`, never going below one pixel.
pub fn step_dimension(value: i64, delta: i64) -> i64 {
    value.saturating_add(delta).max(1)
}

/// True when either axis of `target` is smaller than `source`.
pub fn is_shrink(source: (u32, u32), target: (u32, u32)) -> bool {
    target.0 < source.0 || target.1 < source.1
}

/// Source index sampled by destination index `dst` under nearest-neighbor.
///
/// Maps the destination pixel center back into source space and takes the
/// pixel containing it.
#[inline]
pub fn nearest_source_index(dst: u32, src_extent: u32, dst_extent: u32) -> u32 {
    let center = (dst as f64 + 0.5) * src_extent as f64 / dst_extent as f64;
    (center.floor() as u32).min(src_extent - 1)
}

/// Initial crop rectangle `(x, y, w, h)` inset by `margin` on every side.
///
/// Returns `None` when the inset leaves nothing.
pub fn inset_rect(width: u32, height: u32, margin: u32) -> Option<(i64, i64, u32, u32)> {
    let w = width.checked_sub(margin.checked_mul(2)?)?;
    let h = height.checked_sub(margin.checked_mul(2)?)?;
    if w == 0 || h == 0 {
        return None;
    }
    Some((margin as i64, margin as i64, w, h))
}
