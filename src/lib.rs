//! # cropkit
//!
//! An interactive raster crop and resize engine. A host UI (or the bundled
//! `cropkit` CLI) hands over a bitmap, then drives an [`session::EditorSession`]
//! with dimension edits, pointer events and commits.
//!
//! # Architecture
//!
//! ```text
//! EditorSession
//! ├── RasterSurface            original + live RGBA8 rasters
//! ├── DimensionSyncController  width/height fields, aspect lock
//! ├── ScalingEngine            nearest-neighbor grow, Lanczos shrink
//! ├── CropSelectionController  pointer-driven selection rectangle
//! └── RestorePointStack        PNG snapshots at commit boundaries
//! ```
//!
//! The session is the only owner of editor state; there are no globals.
//! Hosts get change notifications through the [`host::HostView`] trait and
//! read everything else back from the session.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Top-level owner and host entry point |
//! | [`scaling`] | Path selection, job scheduling and supersession |
//! | [`dimensions`] | Aspect-locked dimension fields driving the scaling engine |
//! | [`crop`] | Selection state machine, hit testing, overlay rendering |
//! | [`history`] | Restore points with SHA-256 integrity checks |
//! | [`imaging`] | Rasters, PNG codec, nearest-neighbor and Lanczos resamplers |
//! | [`host`] | Host notification trait |
//! | [`config`] | Layered `config.toml` loading and validation |
//! | [`output`] | CLI output formatting and JSON reports |
//!
//! # Design Decisions
//!
//! ## Resample From the Original
//!
//! Every scale reads the current original raster (the loaded image, or the
//! last committed crop), never the previous scale result. Dragging a size
//! field down and back up again returns the same pixels as a single request.
//!
//! ## Cooperative Lanczos
//!
//! High-quality shrinking is a two-pass separable Lanczos job that advances
//! a slice budget of rows or columns per [`session::EditorSession::pump`],
//! so a host event loop can keep handling input. The finished raster is
//! swapped in whole. With `scaling.parallel` the same passes run on the
//! rayon pool instead, producing identical bytes.
//!
//! ## Unclamped Selection
//!
//! The crop rectangle may hang over the raster edge. The overhang crops to
//! transparent black rather than being clipped away, so the committed size
//! is always the selected size.

pub mod config;
pub mod crop;
pub mod dimensions;
pub mod history;
pub mod host;
pub mod imaging;
pub mod output;
pub mod scaling;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
