//! The pixel surface every other component reads from and draws into.
//!
//! A [`Raster`] is a plain RGBA8 buffer (row-major, 4 bytes per pixel,
//! non-premultiplied). A [`RasterSurface`] owns two of them:
//!
//! - the **original**: the source every scale resamples from. It is replaced
//!   on load and whenever a crop is committed, never by scaling.
//! - the **live** raster: what the host displays and what crop reads from.
//!
//! Scaling results are swapped into the live slot in one assignment, so a
//! reader never observes a half-written raster.

use std::fmt;
use thiserror::Error;

/// Bytes per pixel (RGBA8).
pub const CHANNELS: usize = 4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RasterError {
    #[error("raster must have a non-zero size, got {width}x{height}")]
    ZeroSized { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} bytes, {width}x{height} RGBA needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// An owned RGBA8 pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Raster {
    /// A fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Wrap a host-provided buffer, checking its size.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroSized { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a raster by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut raster = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let idx = raster.index(x, y);
                raster.pixels[idx..idx + CHANNELS].copy_from_slice(&f(x, y));
            }
        }
        raster
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Read one pixel, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[idx..idx + CHANNELS]);
        Some(px)
    }

    /// Write one pixel. Writes outside the raster are dropped.
    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.pixels[idx..idx + CHANNELS].copy_from_slice(&px);
    }

    /// Exact copy of a `width x height` window whose top-left is `(x, y)`.
    ///
    /// The window may hang over the raster edge; pixels outside read as
    /// transparent black.
    pub fn copy_region(&self, x: i64, y: i64, width: u32, height: u32) -> Raster {
        let mut out = Raster::new(width, height);
        let out_stride = out.stride();

        // Intersect the window with the raster once, then copy whole row spans.
        let x0 = x.max(0);
        let x1 = (x + width as i64).min(self.width as i64);
        if x0 >= x1 {
            return out;
        }
        let span = (x1 - x0) as usize * CHANNELS;
        let dst_col = (x0 - x) as usize * CHANNELS;

        for j in 0..height as i64 {
            let sy = y + j;
            if sy < 0 || sy >= self.height as i64 {
                continue;
            }
            let src = self.index(x0 as u32, sy as u32);
            let dst = j as usize * out_stride + dst_col;
            out.pixels[dst..dst + span].copy_from_slice(&self.pixels[src..src + span]);
        }
        out
    }
}

/// Owner of the original and live rasters.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    original: Raster,
    live: Raster,
}

impl RasterSurface {
    pub fn new(raster: Raster) -> Self {
        Self {
            original: raster.clone(),
            live: raster,
        }
    }

    /// The raster scaling resamples from.
    pub fn original(&self) -> &Raster {
        &self.original
    }

    /// The raster currently shown to the host.
    pub fn live(&self) -> &Raster {
        &self.live
    }

    pub fn width(&self) -> u32 {
        self.live.width
    }

    pub fn height(&self) -> u32 {
        self.live.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.live.dimensions()
    }

    pub fn read_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.live.pixel(x, y)
    }

    pub fn draw_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        self.live.put_pixel(x, y, px);
    }

    /// Fill a rectangle, clipped to the raster. Coordinates may be negative.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, px: [u8; 4]) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width as i64).min(self.live.width as i64);
        let y1 = (y + height as i64).min(self.live.height as i64);
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.live.put_pixel(xx as u32, yy as u32, px);
            }
        }
    }

    /// Blend `px` over every pixel outside the given rectangle.
    pub fn shade_outside(&mut self, x: i64, y: i64, width: u32, height: u32, px: [u8; 4]) {
        let (w, h) = self.live.dimensions();
        let inside = |xx: i64, yy: i64| {
            xx >= x && xx < x + width as i64 && yy >= y && yy < y + height as i64
        };
        for yy in 0..h {
            for xx in 0..w {
                if inside(xx as i64, yy as i64) {
                    continue;
                }
                if let Some(under) = self.live.pixel(xx, yy) {
                    self.live.put_pixel(xx, yy, blend_over(under, px));
                }
            }
        }
    }

    /// Replace the live raster, keeping the original.
    pub fn present(&mut self, raster: Raster) {
        self.live = raster;
    }

    /// Replace both rasters: `raster` becomes the new original.
    pub fn rebase(&mut self, raster: Raster) {
        self.original = raster.clone();
        self.live = raster;
    }

    pub fn into_live(self) -> Raster {
        self.live
    }
}

/// Source-over compositing of `top` onto `under`, straight alpha.
fn blend_over(under: [u8; 4], top: [u8; 4]) -> [u8; 4] {
    let a = top[3] as u32;
    let inv = 255 - a;
    let mix = |t: u8, u: u8| ((t as u32 * a + u as u32 * inv + 127) / 255) as u8;
    [
        mix(top[0], under[0]),
        mix(top[1], under[1]),
        mix(top[2], under[2]),
        under[3].max(top[3]),
    ]
}
