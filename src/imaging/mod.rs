//! Raster storage, codecs, and the two resamplers.
//!
//! | Operation | Module / function |
//! |---|---|
//! | **Pixel surface** | [`Raster`], [`RasterSurface`] |
//! | **Decode / encode** | `image` crate via [`codec`] |
//! | **Grow** (or fast shrink) | [`resize_nearest`] |
//! | **High-quality shrink** | [`LanczosJob`], [`resize_lanczos`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing resampling choices
//! - **Resamplers**: [`nearest`] and [`lanczos`], both reading a source
//!   [`Raster`] and writing a fresh one

mod calculations;
pub mod codec;
pub mod lanczos;
pub mod nearest;
mod params;
pub mod raster;

pub use calculations::{
    aspect_ratio, inset_rect, is_shrink, locked_height, locked_width, nearest_source_index,
    step_dimension,
};
pub use codec::CodecError;
pub use lanczos::{JobPhase, KernelCache, LanczosJob, resize_lanczos};
pub use nearest::resize_nearest;
pub use params::{Lobes, ScaleFilter};
pub use raster::{CHANNELS, Raster, RasterError, RasterSurface};
