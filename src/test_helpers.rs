//! Shared test utilities for the cropkit test suite.
//!
//! Synthetic rasters with known structure, so tests can assert exact pixels
//! without shipping fixture images.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let src = gradient(64, 48);
//! assert_eq!(src.pixel(3, 2), Some(gradient_pixel(3, 2)));
//! ```

use crate::config::EditorConfig;
use crate::imaging::Raster;

pub use crate::host::tests::{MockView, ViewEvent};

// =========================================================================
// Synthetic rasters
// =========================================================================

/// Pixel value of [`gradient`] at `(x, y)`.
pub fn gradient_pixel(x: u32, y: u32) -> [u8; 4] {
    [(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]
}

/// Every pixel distinct within 256×256; channels encode position.
pub fn gradient(width: u32, height: u32) -> Raster {
    Raster::from_fn(width, height, gradient_pixel)
}

/// Black/white checkerboard with `cell`-pixel squares.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            [0, 0, 0, 255]
        } else {
            [255, 255, 255, 255]
        }
    })
}

// =========================================================================
// Config
// =========================================================================

/// Stock config with cooperative (non-parallel) resampling.
pub fn test_config() -> EditorConfig {
    let mut config = EditorConfig::default();
    config.scaling.parallel = false;
    config
}

/// Stock config with the given crop handle sizes.
pub fn config_with_handles(handle_size: u32, hover_handle_size: u32) -> EditorConfig {
    let mut config = test_config();
    config.crop.handle_size = handle_size;
    config.crop.hover_handle_size = hover_handle_size;
    config
}
