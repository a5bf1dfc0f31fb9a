//! Scaling engine: turns a target size into new live-raster content.
//!
//! Every request resamples from the surface's **original** raster, never from
//! the live one, so repeated scales don't compound quality loss.
//!
//! ## Path selection
//!
//! | Request | Filter |
//! |---|---|
//! | Growth on both axes (or same size) | nearest-neighbor, applied immediately |
//! | Shrink, high quality off | nearest-neighbor, applied immediately |
//! | Shrink, high quality on | Lanczos job, advanced by [`ScalingEngine::pump`] |
//!
//! "Shrink" means either axis is smaller than the original.
//!
//! At most one Lanczos job is ever in flight. A new request (or a crop
//! commit) supersedes it; its buffers are dropped and the live raster keeps
//! whatever was last presented.
//!
//! With `scaling.parallel` on, the job runs to completion on the rayon pool
//! inside [`ScalingEngine::scale`] instead of being scheduled.

use crate::config::ScalingConfig;
use crate::imaging::{
    KernelCache, LanczosJob, Lobes, RasterSurface, ScaleFilter, resize_nearest,
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScaleError {
    #[error("invalid target size {width}x{height} (each side must be 1-{max})")]
    InvalidDimension { width: i64, height: i64, max: u32 },
}

/// What a [`ScalingEngine::scale`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// The live raster (or the job in flight) already matches the request.
    Unchanged,
    /// The result was swapped into the live raster.
    Applied(ScaleFilter),
    /// A Lanczos job was started; pump it to completion.
    Scheduled,
}

/// Check a requested size against `max` and convert it to pixels.
pub fn validate_target(width: i64, height: i64, max: u32) -> Result<(u32, u32), ScaleError> {
    let ok = |v: i64| v > 0 && v <= max as i64;
    if ok(width) && ok(height) {
        Ok((width as u32, height as u32))
    } else {
        Err(ScaleError::InvalidDimension { width, height, max })
    }
}

#[derive(Debug)]
pub struct ScalingEngine {
    max_dimension: u32,
    high_quality: bool,
    lobes: Lobes,
    slice_budget: usize,
    parallel: bool,
    cache: KernelCache,
    pending: Option<LanczosJob>,
    /// Size and filter of the live raster, when known to be a resample of
    /// the current original.
    presented: Option<((u32, u32), ScaleFilter)>,
}

impl ScalingEngine {
    /// An engine whose live raster is the untouched original of `original_size`.
    pub fn new(config: &ScalingConfig, original_size: (u32, u32)) -> Self {
        Self {
            max_dimension: config.max_dimension,
            high_quality: config.high_quality,
            lobes: Lobes::new(config.lobes),
            slice_budget: config.slice_budget.max(1),
            parallel: config.parallel,
            cache: KernelCache::new(),
            pending: None,
            presented: Some((original_size, ScaleFilter::Nearest)),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn high_quality(&self) -> bool {
        self.high_quality
    }

    pub fn set_high_quality(&mut self, on: bool) {
        self.high_quality = on;
    }

    pub fn lobes(&self) -> Lobes {
        self.lobes
    }

    /// True while a Lanczos job is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Target of the job in flight.
    pub fn pending_target(&self) -> Option<(u32, u32)> {
        self.pending.as_ref().map(LanczosJob::target)
    }

    /// `(completed, total)` slices of the job in flight.
    pub fn progress(&self) -> Option<(u32, u32)> {
        self.pending
            .as_ref()
            .map(|job| (job.completed_slices(), job.total_slices()))
    }

    /// Number of memoized kernel values.
    pub fn cached_kernel_values(&self) -> usize {
        self.cache.len()
    }

    /// Request the live raster be resampled from the original to `width x height`.
    ///
    /// Rejected requests leave the surface and any job in flight untouched.
    pub fn scale(
        &mut self,
        surface: &mut RasterSurface,
        width: i64,
        height: i64,
    ) -> Result<ScaleOutcome, ScaleError> {
        let target = validate_target(width, height, self.max_dimension)?;
        let filter = ScaleFilter::select(
            surface.original().dimensions(),
            target,
            self.high_quality,
            self.lobes,
        );

        if let Some(job) = &self.pending {
            if ScaleFilter::Lanczos(job.lobes()) == filter && job.target() == target {
                return Ok(ScaleOutcome::Unchanged);
            }
        } else if self.presented == Some((target, filter)) {
            return Ok(ScaleOutcome::Unchanged);
        }
        self.cancel();

        debug!(
            width = target.0,
            height = target.1,
            filter = filter.name(),
            "scaling from original"
        );

        match filter {
            ScaleFilter::Nearest => {
                let resized = resize_nearest(surface.original(), target.0, target.1);
                surface.present(resized);
                self.presented = Some((target, filter));
                Ok(ScaleOutcome::Applied(filter))
            }
            ScaleFilter::Lanczos(lobes) => {
                let job = LanczosJob::new(
                    surface.original().clone(),
                    target.0,
                    target.1,
                    lobes,
                    &mut self.cache,
                );
                if self.parallel {
                    surface.present(job.run_parallel());
                    self.presented = Some((target, filter));
                    Ok(ScaleOutcome::Applied(filter))
                } else {
                    self.pending = Some(job);
                    Ok(ScaleOutcome::Scheduled)
                }
            }
        }
    }

    /// Advance the job in flight by one slice budget.
    ///
    /// Returns `true` when no job remains (it just finished, or there was none).
    pub fn pump(&mut self, surface: &mut RasterSurface) -> bool {
        let Some(job) = self.pending.as_mut() else {
            return true;
        };
        if job.run(self.slice_budget) {
            self.complete(surface);
            return true;
        }
        false
    }

    /// Run the job in flight to completion and present it.
    pub fn finish(&mut self, surface: &mut RasterSurface) {
        if let Some(job) = self.pending.as_mut() {
            while !job.step() {}
            self.complete(surface);
        }
    }

    fn complete(&mut self, surface: &mut RasterSurface) {
        let Some(job) = self.pending.take() else {
            return;
        };
        let target = job.target();
        let lobes = job.lobes();
        if let Some(raster) = job.finish() {
            debug!(width = target.0, height = target.1, "lanczos job presented");
            surface.present(raster);
            self.presented = Some((target, ScaleFilter::Lanczos(lobes)));
        }
    }

    /// Drop the job in flight, if any. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(job) => {
                let (done, total) = (job.completed_slices(), job.total_slices());
                debug!(
                    width = job.target().0,
                    height = job.target().1,
                    done,
                    total,
                    "superseded in-flight lanczos job"
                );
                true
            }
            None => false,
        }
    }

    /// The surface was rebased onto a new original of `original_size`.
    pub fn rebased(&mut self, original_size: (u32, u32)) {
        self.cancel();
        self.presented = Some((original_size, ScaleFilter::Nearest));
    }

    /// The live raster was replaced by something this engine didn't produce.
    pub fn invalidate(&mut self) {
        self.cancel();
        self.presented = None;
    }
}
