//! Width/height fields kept consistent with the aspect lock.
//!
//! The controller stores the current notion of "original" size, its
//! `ratio = width / height`, and the working size last accepted by the
//! [`ScalingEngine`]. Editing one field with the lock on recomputes the other
//! from the stored ratio:
//!
//! ```text
//! edit width  w  →  (w, round(w / ratio))
//! edit height h  →  (round(h × ratio), h)
//! ```
//!
//! then issues a scale request. The working size only changes when the engine
//! accepts the request, so a rejected edit leaves the fields as they were.

use crate::imaging::{RasterSurface, aspect_ratio, locked_height, locked_width, step_dimension};
use crate::scaling::{ScaleError, ScaleOutcome, ScalingEngine};

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSyncController {
    original: (u32, u32),
    ratio: f64,
    working: (u32, u32),
    aspect_lock: bool,
}

impl DimensionSyncController {
    pub fn new(original: (u32, u32), aspect_lock: bool) -> Self {
        Self {
            original,
            ratio: aspect_ratio(original.0, original.1),
            working: original,
            aspect_lock,
        }
    }

    /// Size of the current original raster.
    pub fn original(&self) -> (u32, u32) {
        self.original
    }

    /// Original width over original height.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Width and height as last accepted.
    pub fn working(&self) -> (u32, u32) {
        self.working
    }

    pub fn aspect_lock(&self) -> bool {
        self.aspect_lock
    }

    /// Toggle the lock. The fields are not re-synced until the next edit.
    pub fn set_aspect_lock(&mut self, on: bool) {
        self.aspect_lock = on;
    }

    /// The size an edit of the width field would request.
    pub fn propose_width(&self, width: i64) -> (i64, i64) {
        if self.aspect_lock {
            (width, locked_height(width, self.ratio))
        } else {
            (width, self.working.1 as i64)
        }
    }

    /// The size an edit of the height field would request.
    pub fn propose_height(&self, height: i64) -> (i64, i64) {
        if self.aspect_lock {
            (locked_width(height, self.ratio), height)
        } else {
            (self.working.0 as i64, height)
        }
    }

    pub fn edit_width(
        &mut self,
        engine: &mut ScalingEngine,
        surface: &mut RasterSurface,
        width: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let (w, h) = self.propose_width(width);
        self.request(engine, surface, w, h)
    }

    pub fn edit_height(
        &mut self,
        engine: &mut ScalingEngine,
        surface: &mut RasterSurface,
        height: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let (w, h) = self.propose_height(height);
        self.request(engine, surface, w, h)
    }

    /// Nudge the width field by `delta`, never below one pixel.
    pub fn step_width(
        &mut self,
        engine: &mut ScalingEngine,
        surface: &mut RasterSurface,
        delta: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let width = step_dimension(self.working.0 as i64, delta);
        self.edit_width(engine, surface, width)
    }

    /// Nudge the height field by `delta`, never below one pixel.
    pub fn step_height(
        &mut self,
        engine: &mut ScalingEngine,
        surface: &mut RasterSurface,
        delta: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let height = step_dimension(self.working.1 as i64, delta);
        self.edit_height(engine, surface, height)
    }

    /// Request both sides at once, as a drag-resize gesture does.
    ///
    /// With the lock on, the height is recomputed from the width.
    pub fn resize_to(
        &mut self,
        engine: &mut ScalingEngine,
        surface: &mut RasterSurface,
        width: i64,
        height: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let (w, h) = if self.aspect_lock {
            self.propose_width(width)
        } else {
            (width, height)
        };
        self.request(engine, surface, w, h)
    }

    fn request(
        &mut self,
        engine: &mut ScalingEngine,
        surface: &mut RasterSurface,
        width: i64,
        height: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let outcome = engine.scale(surface, width, height)?;
        // Validated by the engine: both sides are in 1..=max_dimension.
        self.working = (width as u32, height as u32);
        Ok(outcome)
    }

    /// A crop produced a new original; reset ratio and working size to it.
    pub fn rebase(&mut self, original: (u32, u32)) {
        self.original = original;
        self.ratio = aspect_ratio(original.0, original.1);
        self.working = original;
    }

    /// The live raster was replaced outside a scale request.
    pub fn set_working(&mut self, size: (u32, u32)) {
        self.working = size;
    }
}
