//! Nearest-neighbor resampling.

use super::calculations::nearest_source_index;
use super::raster::{CHANNELS, Raster};

/// Resize by pixel replication. Cheap, and exact for integer growth factors.
pub fn resize_nearest(src: &Raster, width: u32, height: u32) -> Raster {
    let (sw, sh) = src.dimensions();
    let mut out = Raster::new(width, height);
    let src_bytes = src.as_bytes();
    let src_stride = src.stride();

    // Column lookup is shared by every row.
    let columns: Vec<usize> = (0..width)
        .map(|x| nearest_source_index(x, sw, width) as usize * CHANNELS)
        .collect();

    let dst_stride = out.stride();
    for (y, dst_row) in out.as_bytes_mut().chunks_exact_mut(dst_stride).enumerate() {
        let row = nearest_source_index(y as u32, sh, height) as usize * src_stride;
        for (dst_px, &col) in dst_row.chunks_exact_mut(CHANNELS).zip(&columns) {
            dst_px.copy_from_slice(&src_bytes[row + col..row + col + CHANNELS]);
        }
    }
    out
}
