//! Restore points captured at commit boundaries.
//!
//! A [`RestorePoint`] is an immutable PNG snapshot of a raster, tagged with
//! its size, the kind of commit that produced it, and the SHA-256 of the
//! encoded bytes. Points are pushed after the initial load, after every
//! committed scale and after every committed crop.
//!
//! The [`RestorePointStack`] is an append-only trail: there is no pop and no
//! redo. With a retention cap the oldest points are dropped. Reading back
//! renders the most recent snapshot; a snapshot whose bytes no longer match
//! their digest, or no longer decode, is a hard error.

use crate::imaging::codec::{self, CodecError};
use crate::imaging::Raster;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("no restore point recorded")]
    Empty,
    #[error("snapshot encode failed: {0}")]
    Encode(#[source] CodecError),
    #[error("snapshot decode failed: {0}")]
    Decode(#[source] CodecError),
    #[error("snapshot digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
    #[error("snapshot decoded to {actual:?}, recorded as {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Which commit produced a restore point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreKind {
    Load,
    Scale,
    Crop,
}

impl RestoreKind {
    pub fn label(self) -> &'static str {
        match self {
            RestoreKind::Load => "load",
            RestoreKind::Scale => "scale",
            RestoreKind::Crop => "crop",
        }
    }
}

/// SHA-256 of `bytes` as a hex string.
pub fn digest_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Clone, PartialEq, Eq)]
pub struct RestorePoint {
    kind: RestoreKind,
    width: u32,
    height: u32,
    encoded: Vec<u8>,
    digest: String,
}

impl std::fmt::Debug for RestorePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestorePoint")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.encoded.len())
            .field("digest", &self.digest)
            .finish()
    }
}

impl RestorePoint {
    /// Encode `raster` into a new snapshot.
    pub fn capture(raster: &Raster, kind: RestoreKind) -> Result<Self, SnapshotError> {
        let encoded = codec::encode_png(raster).map_err(SnapshotError::Encode)?;
        let digest = digest_hex(&encoded);
        Ok(Self {
            kind,
            width: raster.width(),
            height: raster.height(),
            encoded,
            digest,
        })
    }

    pub fn kind(&self) -> RestoreKind {
        self.kind
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The PNG bytes.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Verify and decode the snapshot.
    pub fn render(&self) -> Result<Raster, SnapshotError> {
        let actual = digest_hex(&self.encoded);
        if actual != self.digest {
            warn!(expected = %self.digest, %actual, "restore point digest mismatch");
            return Err(SnapshotError::DigestMismatch {
                expected: self.digest.clone(),
                actual,
            });
        }
        let raster = codec::decode_png(&self.encoded).map_err(|e| {
            warn!(error = %e, "restore point failed to decode");
            SnapshotError::Decode(e)
        })?;
        if raster.dimensions() != self.dimensions() {
            return Err(SnapshotError::DimensionMismatch {
                expected: self.dimensions(),
                actual: raster.dimensions(),
            });
        }
        Ok(raster)
    }

    /// Flip the last payload byte without updating the digest.
    #[cfg(test)]
    pub(crate) fn corrupted(mut self) -> Self {
        if let Some(last) = self.encoded.last_mut() {
            *last ^= 0xff;
        }
        self
    }
}

/// Append-only list of restore points, newest last.
#[derive(Debug, Clone, Default)]
pub struct RestorePointStack {
    points: VecDeque<RestorePoint>,
    /// Maximum retained points; 0 keeps all.
    cap: usize,
    pruned: usize,
}

impl RestorePointStack {
    pub fn new(cap: usize) -> Self {
        Self {
            points: VecDeque::new(),
            cap,
            pruned: 0,
        }
    }

    pub fn push(&mut self, point: RestorePoint) {
        debug!(
            kind = point.kind.label(),
            width = point.width,
            height = point.height,
            bytes = point.encoded.len(),
            "restore point pushed"
        );
        self.points.push_back(point);
        if self.cap > 0 {
            while self.points.len() > self.cap {
                self.points.pop_front();
                self.pruned += 1;
                debug!(cap = self.cap, "oldest restore point dropped");
            }
        }
    }

    /// Capture `raster` and push it.
    pub fn capture(&mut self, raster: &Raster, kind: RestoreKind) -> Result<(), SnapshotError> {
        self.push(RestorePoint::capture(raster, kind)?);
        Ok(())
    }

    pub fn latest(&self) -> Option<&RestorePoint> {
        self.points.back()
    }

    /// Render the most recent snapshot.
    pub fn render_latest(&self) -> Result<Raster, SnapshotError> {
        self.latest().ok_or(SnapshotError::Empty)?.render()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points dropped by the retention cap so far.
    pub fn pruned(&self) -> usize {
        self.pruned
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RestorePoint> {
        self.points.iter()
    }
}
