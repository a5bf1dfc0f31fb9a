//! Parameter types for scaling operations.
//!
//! These describe *what* resampling to do, not *how*. The scaling engine
//! picks a [`ScaleFilter`] per request; the resamplers in
//! [`nearest`](super::nearest) and [`lanczos`](super::lanczos) carry it out.

/// Number of Lanczos lobes (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lobes(pub u32);

impl Lobes {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 8))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Lobes {
    fn default() -> Self {
        Self(3)
    }
}

/// Resampling filter chosen for one scale request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleFilter {
    /// Pixel replication. Used for growth, and for shrink when quality is off.
    Nearest,
    /// Two-pass separable Lanczos.
    Lanczos(Lobes),
}

impl ScaleFilter {
    /// Pick the filter for scaling `source` to `target`.
    pub fn select(
        source: (u32, u32),
        target: (u32, u32),
        high_quality: bool,
        lobes: Lobes,
    ) -> Self {
        if high_quality && super::calculations::is_shrink(source, target) {
            ScaleFilter::Lanczos(lobes)
        } else {
            ScaleFilter::Nearest
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleFilter::Nearest => "nearest",
            ScaleFilter::Lanczos(_) => "lanczos",
        }
    }
}
