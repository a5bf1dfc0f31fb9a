//! The editor session: one owner for every piece of editor state.
//!
//! An [`EditorSession`] is created from an initial bitmap and holds the
//! raster surface, the scaling engine, the dimension fields, the crop
//! controller and the restore-point stack. Hosts drive it through the
//! methods here and receive change notifications through their
//! [`HostView`].
//!
//! ```text
//! edit / step / resize ──▶ DimensionSyncController ──▶ ScalingEngine ──▶ surface
//! begin / pointer      ──▶ CropSelectionController
//! commit_crop          ──▶ CropSelectionController ──▶ RasterSurface (rebase)
//! commit_scale / crop  ──▶ RestorePointStack
//! ```
//!
//! Scale requests never push restore points; only [`EditorSession::commit_scale`],
//! [`EditorSession::commit_crop`] and construction do.

use crate::config::EditorConfig;
use crate::crop::{CropError, CropSelectionController, CropState, DragOutcome, PointerEvent, Rect};
use crate::dimensions::DimensionSyncController;
use crate::history::{RestoreKind, RestorePoint, RestorePointStack, SnapshotError};
use crate::host::HostView;
use crate::imaging::{CodecError, Raster, RasterError, RasterSurface, codec};
use crate::scaling::{ScaleError, ScaleOutcome, ScalingEngine, validate_target};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("image {width}x{height} cannot be edited; each side must be 1-{max}")]
    RasterSize { width: u32, height: u32, max: u32 },
}

pub struct EditorSession<V: HostView> {
    view: V,
    surface: RasterSurface,
    engine: ScalingEngine,
    dims: DimensionSyncController,
    crop: CropSelectionController,
    history: RestorePointStack,
}

impl<V: HostView> EditorSession<V> {
    /// Start a session on `raster` and record the load restore point.
    ///
    /// Rasters with a zero side, or a side above `scaling.max_dimension`,
    /// are refused.
    pub fn new(raster: Raster, config: &EditorConfig, view: V) -> Result<Self, SessionError> {
        let size = raster.dimensions();
        let max = config.scaling.max_dimension;
        if validate_target(size.0 as i64, size.1 as i64, max).is_err() {
            return Err(SessionError::RasterSize {
                width: size.0,
                height: size.1,
                max,
            });
        }
        let mut history = RestorePointStack::new(config.history.max_restore_points);
        history.push(RestorePoint::capture(&raster, RestoreKind::Load)?);
        debug!(width = size.0, height = size.1, "session started");

        Ok(Self {
            view,
            surface: RasterSurface::new(raster),
            engine: ScalingEngine::new(&config.scaling, size),
            dims: DimensionSyncController::new(size, config.dimensions.aspect_lock),
            crop: CropSelectionController::new(&config.crop, max),
            history,
        })
    }

    /// Start a session on a host-provided RGBA8 buffer.
    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        config: &EditorConfig,
        view: V,
    ) -> Result<Self, SessionError> {
        Self::new(Raster::from_rgba(width, height, pixels)?, config, view)
    }

    // =========================================================================
    // Flags
    // =========================================================================

    pub fn set_aspect_lock(&mut self, on: bool) {
        self.dims.set_aspect_lock(on);
    }

    pub fn set_high_quality(&mut self, on: bool) {
        self.engine.set_high_quality(on);
    }

    pub fn aspect_lock(&self) -> bool {
        self.dims.aspect_lock()
    }

    pub fn high_quality(&self) -> bool {
        self.engine.high_quality()
    }

    // =========================================================================
    // Scaling
    // =========================================================================

    /// Accepted scale requests end crop mode: the selection is relative to
    /// the raster being replaced.
    fn leave_crop_for_scale(&mut self) {
        if self.crop.cancel() {
            debug!("crop mode left for scale request");
            self.view.crop_mode_changed(false);
        }
    }

    /// Crop mode is left only once the engine has accepted the request.
    fn after_scale(
        &mut self,
        result: Result<ScaleOutcome, ScaleError>,
    ) -> Result<ScaleOutcome, SessionError> {
        let outcome = result?;
        self.leave_crop_for_scale();
        let (w, h) = self.dims.working();
        self.view.dimensions_changed(w, h);
        Ok(outcome)
    }

    /// The width field was edited.
    pub fn edit_width(&mut self, width: i64) -> Result<ScaleOutcome, SessionError> {
        let result = self.dims.edit_width(&mut self.engine, &mut self.surface, width);
        self.after_scale(result)
    }

    /// The height field was edited.
    pub fn edit_height(&mut self, height: i64) -> Result<ScaleOutcome, SessionError> {
        let result = self.dims.edit_height(&mut self.engine, &mut self.surface, height);
        self.after_scale(result)
    }

    pub fn step_width(&mut self, delta: i64) -> Result<ScaleOutcome, SessionError> {
        let result = self.dims.step_width(&mut self.engine, &mut self.surface, delta);
        self.after_scale(result)
    }

    pub fn step_height(&mut self, delta: i64) -> Result<ScaleOutcome, SessionError> {
        let result = self.dims.step_height(&mut self.engine, &mut self.surface, delta);
        self.after_scale(result)
    }

    /// A drag-resize gesture asked for `width x height`.
    pub fn resize_to(&mut self, width: i64, height: i64) -> Result<ScaleOutcome, SessionError> {
        let result = self
            .dims
            .resize_to(&mut self.engine, &mut self.surface, width, height);
        self.after_scale(result)
    }

    /// Advance an in-flight resample. Returns `true` once nothing is pending.
    pub fn pump(&mut self) -> bool {
        self.engine.pump(&mut self.surface)
    }

    /// Run an in-flight resample to completion.
    pub fn finish_pending(&mut self) {
        self.engine.finish(&mut self.surface);
    }

    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }

    /// Commit the current size: finish any pending resample and record a
    /// restore point of the result.
    pub fn commit_scale(&mut self) -> Result<(), SessionError> {
        self.finish_pending();
        let point = RestorePoint::capture(self.surface.live(), RestoreKind::Scale)?;
        self.history.push(point);
        Ok(())
    }

    /// Replace the live raster with the most recent restore point, dropping
    /// any uncommitted scale.
    pub fn revert_to_latest(&mut self) -> Result<(u32, u32), SessionError> {
        let raster = self.history.render_latest()?;
        self.leave_crop_for_scale();
        self.engine.invalidate();
        let size = raster.dimensions();
        self.surface.present(raster);
        self.dims.set_working(size);
        self.view.dimensions_changed(size.0, size.1);
        Ok(size)
    }

    // =========================================================================
    // Crop
    // =========================================================================

    /// Enter crop mode over the live raster. An in-flight resample is dropped.
    pub fn begin_crop(&mut self) -> Result<(), SessionError> {
        if self.engine.cancel() {
            let size = self.surface.dimensions();
            self.dims.set_working(size);
            self.view.dimensions_changed(size.0, size.1);
        }
        self.crop.begin(self.surface.dimensions())?;
        self.view.crop_mode_changed(true);
        Ok(())
    }

    /// Feed one pointer event. Ignored outside crop mode.
    pub fn pointer(&mut self, event: PointerEvent) -> DragOutcome {
        self.crop.handle_pointer(event)
    }

    /// Set the selection without a pointer.
    pub fn place_crop(
        &mut self,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> Result<(), SessionError> {
        Ok(self.crop.place(x, y, width, height)?)
    }

    pub fn crop_rect(&self) -> Option<Rect> {
        self.crop.rect()
    }

    pub fn crop_state(&self) -> CropState {
        self.crop.state()
    }

    pub fn crop_active(&self) -> bool {
        self.crop.is_active()
    }

    /// The live raster with the selection drawn over it.
    pub fn crop_overlay(&self) -> Option<Raster> {
        self.crop.render_overlay(self.surface.live())
    }

    /// Leave crop mode without touching the raster.
    pub fn cancel_crop(&mut self) {
        if self.crop.cancel() {
            self.view.crop_mode_changed(false);
        }
    }

    /// Crop the live raster to the selection. The result becomes the new
    /// original and the aspect ratio is recomputed from it.
    pub fn commit_crop(&mut self) -> Result<(u32, u32), SessionError> {
        if !self.crop.is_active() {
            return Err(CropError::Inactive.into());
        }
        let mut preview = self.crop.clone();
        let cropped = preview.commit(self.surface.live())?;
        let point = RestorePoint::capture(&cropped, RestoreKind::Crop)?;

        self.crop = preview;
        let size = cropped.dimensions();
        self.surface.rebase(cropped);
        self.engine.rebased(size);
        self.dims.rebase(size);
        self.history.push(point);

        self.view.crop_mode_changed(false);
        self.view.dimensions_changed(size.0, size.1);
        Ok(size)
    }

    // =========================================================================
    // Read-outs
    // =========================================================================

    /// Width and height as shown in the dimension fields.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dims.working()
    }

    /// Size of the live raster. Lags [`dimensions`](Self::dimensions) while
    /// a resample is in flight.
    pub fn raster_dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn original_dimensions(&self) -> (u32, u32) {
        self.dims.original()
    }

    pub fn ratio(&self) -> f64 {
        self.dims.ratio()
    }

    pub fn live(&self) -> &Raster {
        self.surface.live()
    }

    /// The live raster as PNG.
    pub fn encoded_bytes(&self) -> Result<Vec<u8>, SessionError> {
        Ok(codec::encode_png(self.surface.live())?)
    }

    pub fn history(&self) -> &RestorePointStack {
        &self.history
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_raster(self) -> Raster {
        self.surface.into_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockView, ViewEvent, gradient, test_config};

    fn session(w: u32, h: u32) -> EditorSession<MockView> {
        EditorSession::new(gradient(w, h), &test_config(), MockView::new()).unwrap()
    }

    #[test]
    fn new_records_load_point() {
        let s = session(40, 30);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history().latest().unwrap().kind(), RestoreKind::Load);
        assert_eq!(s.dimensions(), (40, 30));
        assert!(s.view().get_events().is_empty());
    }

    #[test]
    fn from_rgba_checks_buffer() {
        let result = EditorSession::from_rgba(2, 2, vec![0; 3], &test_config(), MockView::new());
        assert!(matches!(result, Err(SessionError::Raster(_))));
    }

    #[test]
    fn every_scale_request_notifies() {
        let mut s = session(40, 20);
        s.edit_width(80).unwrap();
        s.edit_width(80).unwrap();
        assert_eq!(
            s.view().get_events(),
            vec![ViewEvent::Dimensions(80, 40), ViewEvent::Dimensions(80, 40)]
        );
    }

    #[test]
    fn rejected_scale_does_not_notify() {
        let mut s = session(40, 20);
        let err = s.edit_height(0).unwrap_err();
        assert!(matches!(err, SessionError::Scale(ScaleError::InvalidDimension { .. })));
        assert!(s.view().get_events().is_empty());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn scaling_never_pushes_restore_points() {
        let mut s = session(60, 60);
        s.edit_width(30).unwrap();
        s.finish_pending();
        s.step_width(5).unwrap();
        assert_eq!(s.history().len(), 1);

        s.commit_scale().unwrap();
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.history().latest().unwrap().dimensions(), (35, 35));
    }

    #[test]
    fn commit_scale_finishes_pending_job() {
        let mut s = session(90, 60);
        assert_eq!(s.edit_width(30).unwrap(), ScaleOutcome::Scheduled);
        assert_eq!(s.raster_dimensions(), (90, 60));
        s.commit_scale().unwrap();
        assert!(!s.is_busy());
        assert_eq!(s.raster_dimensions(), (30, 20));
    }

    #[test]
    fn pump_drives_job() {
        let mut s = session(90, 60);
        s.edit_width(30).unwrap();
        let mut turns = 0;
        while !s.pump() {
            turns += 1;
        }
        assert!(turns > 0);
        assert_eq!(s.raster_dimensions(), (30, 20));
    }

    #[test]
    fn revert_discards_uncommitted_scale() {
        let mut s = session(30, 30);
        let original = s.live().clone();
        s.edit_width(60).unwrap();
        assert_eq!(s.raster_dimensions(), (60, 60));

        assert_eq!(s.revert_to_latest().unwrap(), (30, 30));
        assert_eq!(s.live(), &original);
        assert_eq!(s.dimensions(), (30, 30));
    }

    #[test]
    fn crop_cycle_rebases_original() {
        let mut s = session(200, 100);
        s.begin_crop().unwrap();
        assert!(s.crop_active());
        s.place_crop(10, 10, 60, 30).unwrap();

        assert_eq!(s.commit_crop().unwrap(), (60, 30));
        assert!(!s.crop_active());
        assert_eq!(s.original_dimensions(), (60, 30));
        assert_eq!(s.ratio(), 2.0);
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.history().latest().unwrap().kind(), RestoreKind::Crop);
        assert_eq!(s.live().pixel(0, 0), gradient(200, 100).pixel(10, 10));

        let events = s.view().get_events();
        assert_eq!(
            events,
            vec![
                ViewEvent::CropMode(true),
                ViewEvent::CropMode(false),
                ViewEvent::Dimensions(60, 30),
            ]
        );
    }

    #[test]
    fn scale_after_crop_uses_cropped_original() {
        let mut s = session(200, 100);
        s.begin_crop().unwrap();
        s.place_crop(0, 0, 50, 50).unwrap();
        s.commit_crop().unwrap();

        s.edit_width(100).unwrap();
        assert_eq!(s.dimensions(), (100, 100));
    }

    #[test]
    fn commit_crop_requires_crop_mode() {
        let mut s = session(50, 50);
        assert!(matches!(
            s.commit_crop(),
            Err(SessionError::Crop(CropError::Inactive))
        ));
    }

    #[test]
    fn cancel_crop_leaves_raster() {
        let mut s = session(100, 100);
        let before = s.live().clone();
        s.begin_crop().unwrap();
        s.pointer(PointerEvent::Down { x: 50, y: 50 });
        s.pointer(PointerEvent::Move { x: 60, y: 60 });
        s.cancel_crop();

        assert!(!s.crop_active());
        assert_eq!(s.live(), &before);
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn pointer_ignored_outside_crop_mode() {
        let mut s = session(100, 100);
        assert_eq!(s.pointer(PointerEvent::Down { x: 50, y: 50 }), DragOutcome::Ignored);
    }

    #[test]
    fn begin_crop_drops_pending_job() {
        let mut s = session(100, 100);
        s.edit_width(50).unwrap();
        assert!(s.is_busy());
        s.begin_crop().unwrap();
        assert!(!s.is_busy());
        assert_eq!(s.dimensions(), (100, 100));
        assert_eq!(s.crop_rect(), Some(Rect::new(20, 20, 60, 60)));
    }

    #[test]
    fn scale_request_ends_crop_mode() {
        let mut s = session(100, 100);
        s.begin_crop().unwrap();
        s.edit_width(200).unwrap();
        assert!(!s.crop_active());
        assert_eq!(s.view().last_dimensions(), Some((200, 200)));
    }

    #[test]
    fn rejected_scale_keeps_crop_mode() {
        let mut config = test_config();
        config.scaling.max_dimension = 100;
        let mut s = EditorSession::new(gradient(100, 100), &config, MockView::new()).unwrap();
        s.begin_crop().unwrap();
        s.place_crop(10, 10, 80, 80).unwrap();
        let before = s.live().clone();

        assert!(s.edit_width(0).is_err());
        assert!(s.edit_height(101).is_err());
        assert!(s.step_width(1).is_err());
        assert!(s.resize_to(50, -3).is_err());

        assert!(s.crop_active());
        assert_eq!(s.crop_state(), CropState::Armed);
        assert_eq!(s.crop_rect(), Some(Rect::new(10, 10, 80, 80)));
        assert_eq!(s.live(), &before);
        assert_eq!(s.dimensions(), (100, 100));
        assert_eq!(s.view().get_events(), vec![ViewEvent::CropMode(true)]);
    }

    #[test]
    fn rejected_place_keeps_selection() {
        let mut config = test_config();
        config.scaling.max_dimension = 500;
        let mut s = EditorSession::new(gradient(200, 100), &config, MockView::new()).unwrap();
        s.begin_crop().unwrap();
        s.place_crop(10, 10, 80, 40).unwrap();
        let before = s.live().clone();

        assert!(matches!(
            s.place_crop(0, 0, 5000, 40),
            Err(SessionError::Crop(CropError::SelectionTooLarge { max: 500, .. }))
        ));
        assert!(matches!(
            s.place_crop(0, 0, 20, 40),
            Err(SessionError::Crop(CropError::DegenerateSelection { .. }))
        ));
        assert!(s.crop_active());
        assert_eq!(s.crop_rect(), Some(Rect::new(10, 10, 80, 40)));
        assert_eq!(s.live(), &before);
    }

    #[test]
    fn crop_commit_stays_within_max_dimension() {
        let mut config = test_config();
        config.scaling.max_dimension = 500;
        let mut s = EditorSession::new(gradient(300, 300), &config, MockView::new()).unwrap();
        s.begin_crop().unwrap();
        s.pointer(PointerEvent::Down { x: 280, y: 280 });
        assert_eq!(
            s.pointer(PointerEvent::Move { x: 100_000, y: 180 }),
            DragOutcome::Rejected
        );
        s.pointer(PointerEvent::Move { x: 520, y: 180 });
        s.pointer(PointerEvent::Up { x: 520, y: 180 });

        assert_eq!(s.commit_crop().unwrap(), (500, 160));
        assert_eq!(s.edit_width(500).unwrap(), ScaleOutcome::Unchanged);
    }

    #[test]
    fn failed_revert_keeps_crop_mode() {
        let mut s = session(100, 100);
        let point = RestorePoint::capture(s.live(), RestoreKind::Scale).unwrap();
        s.history.push(point.corrupted());
        s.begin_crop().unwrap();
        let rect = s.crop_rect();
        let before = s.live().clone();

        assert!(matches!(s.revert_to_latest(), Err(SessionError::Snapshot(_))));
        assert!(s.crop_active());
        assert_eq!(s.crop_rect(), rect);
        assert_eq!(s.live(), &before);
    }

    #[test]
    fn new_rejects_empty_raster() {
        let result = EditorSession::new(Raster::new(0, 10), &test_config(), MockView::new());
        assert!(matches!(
            result,
            Err(SessionError::RasterSize {
                width: 0,
                height: 10,
                ..
            })
        ));
    }

    #[test]
    fn new_rejects_raster_over_max_dimension() {
        let mut config = test_config();
        config.scaling.max_dimension = 64;
        let result = EditorSession::new(gradient(65, 10), &config, MockView::new());
        assert!(matches!(
            result,
            Err(SessionError::RasterSize { max: 64, .. })
        ));
        assert!(EditorSession::new(gradient(64, 64), &config, MockView::new()).is_ok());
    }

    #[test]
    fn encoded_bytes_round_trip() {
        let s = session(16, 9);
        let bytes = s.encoded_bytes().unwrap();
        assert_eq!(codec::decode_png(&bytes).unwrap(), gradient(16, 9));
    }
}
