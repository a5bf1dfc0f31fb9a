//! Separable Lanczos resampling, runnable one row or column at a time.
//!
//! A resize is two ordered 1-D passes:
//!
//! ```text
//! source (sw × sh) ──rows──▶ intermediate (tw × sh) ──columns──▶ output (tw × th)
//! ```
//!
//! For destination index `u` along an axis with `ratio = source / target`,
//! the continuous source center is `(u + 0.5) × ratio`. Source samples within
//! `radius = ceil(ratio × lobes / 2)` of it are weighted by
//! `L(d) = sinc(d) × sinc(d / lobes)`, where `d` is the sample's signed
//! distance from the center in kernel units (`ratio / 2` source pixels, never
//! less than one). Weights are normalized to sum to 1.
//!
//! Per-destination weights ([`Contribution`]s) are computed once per job; the
//! kernel itself is memoized in a [`KernelCache`] keyed by quantized distance
//! and lobe count, since the same offsets recur across many samples.
//!
//! A [`LanczosJob`] owns its intermediate and output buffers. The caller
//! advances it with [`LanczosJob::step`] between other work and only takes the
//! output once both passes are complete; dropping a job mid-way discards its
//! buffers without touching anything else. [`LanczosJob::run_parallel`] runs
//! the same passes on the rayon pool and produces identical bytes.

use super::params::Lobes;
use super::raster::{CHANNELS, Raster};
use rayon::prelude::*;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Distances are memoized at 1/1000 of a kernel unit.
const DISTANCE_QUANTUM: f64 = 1000.0;

/// Normalized sinc: `sin(πx) / (πx)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// The Lanczos kernel `sinc(d) × sinc(d / lobes)`, zero outside `|d| < lobes`.
pub fn lanczos(d: f64, lobes: u32) -> f64 {
    let a = lobes as f64;
    if d.abs() >= a {
        return 0.0;
    }
    sinc(d) * sinc(d / a)
}

/// Memoized kernel values keyed by `(quantized |distance|, lobes)`.
#[derive(Debug, Default)]
pub struct KernelCache {
    values: HashMap<(u32, u32), f64>,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel weight at distance `d`. The kernel is even, so only `|d|` is keyed.
    pub fn weight(&mut self, d: f64, lobes: Lobes) -> f64 {
        let q = (d.abs() * DISTANCE_QUANTUM).round() as u32;
        *self
            .values
            .entry((q, lobes.value()))
            .or_insert_with(|| lanczos(q as f64 / DISTANCE_QUANTUM, lobes.value()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Normalized source weights for one destination sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    /// First contributing source index.
    pub start: usize,
    /// One weight per source index from `start`; sums to 1.
    pub weights: Vec<f32>,
}

/// Compute the contributions for every destination index along one axis.
pub fn contributions(
    src_extent: u32,
    dst_extent: u32,
    lobes: Lobes,
    cache: &mut KernelCache,
) -> Vec<Contribution> {
    let ratio = src_extent as f64 / dst_extent as f64;
    let kernel_scale = (ratio / 2.0).max(1.0);
    let radius = (kernel_scale * lobes.value() as f64).ceil() as i64;
    let last = src_extent as i64 - 1;

    (0..dst_extent)
        .map(|u| {
            let center = (u as f64 + 0.5) * ratio;
            let icenter = center.floor() as i64;
            let lo = (icenter - radius).max(0);
            let hi = (icenter + radius).min(last);

            let raw: Vec<f64> = (lo..=hi)
                .map(|i| cache.weight((i as f64 + 0.5 - center) / kernel_scale, lobes))
                .collect();
            let sum: f64 = raw.iter().sum();

            if sum.abs() < f64::EPSILON {
                // Nothing usable in the window: fall back to the nearest sample.
                return Contribution {
                    start: icenter.clamp(0, last) as usize,
                    weights: vec![1.0],
                };
            }
            Contribution {
                start: lo as usize,
                weights: raw.iter().map(|w| (w / sum) as f32).collect(),
            }
        })
        .collect()
}

/// Weighted sum of the pixels at `first + i * step` for each weight `i`.
#[inline]
fn accumulate(src: &[u8], first: usize, step: usize, weights: &[f32]) -> [u8; 4] {
    let mut sums = [0.0f32; 4];
    for (i, &w) in weights.iter().enumerate() {
        let at = first + i * step;
        for (c, sum) in sums.iter_mut().enumerate() {
            *sum += src[at + c] as f32 * w;
        }
    }
    sums.map(|s| s.round().clamp(0.0, 255.0) as u8)
}

/// Resample one source row into one intermediate row.
fn resample_row(src_row: &[u8], dst_row: &mut [u8], columns: &[Contribution]) {
    for (dst_px, contrib) in dst_row.chunks_exact_mut(CHANNELS).zip(columns) {
        dst_px.copy_from_slice(&accumulate(
            src_row,
            contrib.start * CHANNELS,
            CHANNELS,
            &contrib.weights,
        ));
    }
}

/// Output pixel at column `x` for the destination row described by `contrib`.
#[inline]
fn resample_column_pixel(
    intermediate: &[u8],
    stride: usize,
    x: usize,
    contrib: &Contribution,
) -> [u8; 4] {
    accumulate(
        intermediate,
        contrib.start * stride + x * CHANNELS,
        stride,
        &contrib.weights,
    )
}

/// Where a job is in its two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Pass 1: next source row to resample horizontally.
    Rows { next: u32 },
    /// Pass 2: next intermediate column to resample vertically.
    Columns { next: u32 },
    Finished,
}

/// An in-progress two-pass Lanczos resize.
#[derive(Debug)]
pub struct LanczosJob {
    source: Raster,
    width: u32,
    height: u32,
    lobes: Lobes,
    columns: Vec<Contribution>,
    rows: Vec<Contribution>,
    intermediate: Raster,
    output: Raster,
    phase: JobPhase,
}

impl LanczosJob {
    pub fn new(
        source: Raster,
        width: u32,
        height: u32,
        lobes: Lobes,
        cache: &mut KernelCache,
    ) -> Self {
        let (sw, sh) = source.dimensions();
        Self {
            columns: contributions(sw, width, lobes, cache),
            rows: contributions(sh, height, lobes, cache),
            intermediate: Raster::new(width, sh),
            output: Raster::new(width, height),
            source,
            width,
            height,
            lobes,
            phase: JobPhase::Rows { next: 0 },
        }
    }

    pub fn target(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn lobes(&self) -> Lobes {
        self.lobes
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == JobPhase::Finished
    }

    /// Total slices (rows of pass 1 plus columns of pass 2).
    pub fn total_slices(&self) -> u32 {
        self.source.height() + self.width
    }

    /// Slices completed so far.
    pub fn completed_slices(&self) -> u32 {
        match self.phase {
            JobPhase::Rows { next } => next,
            JobPhase::Columns { next } => self.source.height() + next,
            JobPhase::Finished => self.total_slices(),
        }
    }

    /// Process one row (pass 1) or one column (pass 2).
    ///
    /// Returns `true` once the job is finished.
    pub fn step(&mut self) -> bool {
        match self.phase {
            JobPhase::Rows { next } => {
                let src_stride = self.source.stride();
                let dst_stride = self.intermediate.stride();
                let y = next as usize;
                let src_row = &self.source.as_bytes()[y * src_stride..(y + 1) * src_stride];
                let dst_row =
                    &mut self.intermediate.as_bytes_mut()[y * dst_stride..(y + 1) * dst_stride];
                resample_row(src_row, dst_row, &self.columns);

                let next = next + 1;
                self.phase = if next < self.source.height() {
                    JobPhase::Rows { next }
                } else {
                    JobPhase::Columns { next: 0 }
                };
            }
            JobPhase::Columns { next } => {
                let x = next as usize;
                let stride = self.intermediate.stride();
                let out_stride = self.output.stride();
                let intermediate = self.intermediate.as_bytes();
                let output = self.output.as_bytes_mut();
                for (y, contrib) in self.rows.iter().enumerate() {
                    let px = resample_column_pixel(intermediate, stride, x, contrib);
                    let at = y * out_stride + x * CHANNELS;
                    output[at..at + CHANNELS].copy_from_slice(&px);
                }

                let next = next + 1;
                self.phase = if next < self.width {
                    JobPhase::Columns { next }
                } else {
                    JobPhase::Finished
                };
            }
            JobPhase::Finished => {}
        }
        self.is_finished()
    }

    /// Run up to `budget` slices. Returns `true` once the job is finished.
    pub fn run(&mut self, budget: usize) -> bool {
        for _ in 0..budget {
            if self.step() {
                break;
            }
        }
        self.is_finished()
    }

    /// Run both passes to completion on the rayon pool.
    ///
    /// Pass 2 starts only after every row of pass 1 is written. Any progress
    /// made through [`step`](Self::step) is redone from scratch.
    pub fn run_parallel(mut self) -> Raster {
        let src_stride = self.source.stride();
        let mid_stride = self.intermediate.stride();
        let out_stride = self.output.stride();

        let source = self.source.as_bytes();
        let columns = &self.columns;
        self.intermediate
            .as_bytes_mut()
            .par_chunks_mut(mid_stride)
            .enumerate()
            .for_each(|(y, dst_row)| {
                let src_row = &source[y * src_stride..(y + 1) * src_stride];
                resample_row(src_row, dst_row, columns);
            });

        let intermediate = self.intermediate.as_bytes();
        let rows = &self.rows;
        self.output
            .as_bytes_mut()
            .par_chunks_mut(out_stride)
            .zip(rows.par_iter())
            .for_each(|(dst_row, contrib)| {
                for (x, dst_px) in dst_row.chunks_exact_mut(CHANNELS).enumerate() {
                    let px = resample_column_pixel(intermediate, mid_stride, x, contrib);
                    dst_px.copy_from_slice(&px);
                }
            });

        self.output
    }

    /// The finished raster, or `None` if passes remain.
    pub fn finish(self) -> Option<Raster> {
        self.is_finished().then_some(self.output)
    }
}

/// Resize to completion on the current thread.
pub fn resize_lanczos(src: &Raster, width: u32, height: u32, lobes: Lobes) -> Raster {
    let mut cache = KernelCache::new();
    let mut job = LanczosJob::new(src.clone(), width, height, lobes, &mut cache);
    while !job.step() {}
    job.output
}
