//! Interactive crop selection.
//!
//! A rectangle overlaid on the live raster, driven by a pointer stream while
//! crop mode is engaged:
//!
//! ```text
//! Inactive ──begin──▶ Armed
//! Armed    ──down on corner──▶ DraggingHandle(corner) ──up──▶ Armed
//! Armed    ──down in interior──▶ DraggingWhole ──up──▶ Armed
//! Armed    ──commit / cancel──▶ Inactive
//! ```
//!
//! ## Hit testing
//!
//! Each corner has a square hit window of half-width `handle_size`, or
//! `hover_handle_size` while that corner is hovered, so a hovered handle is
//! easier to keep hold of. Corners are tested in the order top-left,
//! top-right, bottom-right, bottom-left and the first hit wins.
//!
//! A whole-rectangle drag starts only when the pointer goes down strictly
//! inside the rectangle, at least `hover_handle_size` away from every edge.
//!
//! ## Size guard
//!
//! Every rectangle this controller holds is wider and taller than
//! `2 × hover_handle_size`, and no side exceeds the configured maximum
//! dimension. A corner drag whose candidate breaks the guard is dropped and
//! the previous rectangle stays. The rectangle is not clamped to
//! the raster; pixels outside it crop to transparent black.

use crate::config::CropConfig;
use crate::imaging::{Raster, RasterSurface, inset_rect};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CropError {
    #[error("crop mode is not active")]
    Inactive,
    #[error("raster {width}x{height} is too small to select; both sides must exceed {min}")]
    RasterTooSmall { width: u32, height: u32, min: u32 },
    #[error("selection {width}x{height} is too small; both sides must exceed {min}")]
    DegenerateSelection { width: i64, height: i64, min: u32 },
    #[error("selection {width}x{height} is too large; each side must be at most {max}")]
    SelectionTooLarge { width: i64, height: i64, max: u32 },
}

/// Overlay colors.
const SHADE: [u8; 4] = [0, 0, 0, 128];
const BORDER: [u8; 4] = [255, 255, 255, 255];
const HANDLE: [u8; 4] = [255, 255, 255, 255];
const HANDLE_HOVERED: [u8; 4] = [255, 196, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// Hit-test order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }

    fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }
}

/// Rectangle in raster pixels. `x`/`y` may be negative or past the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Position of a corner point.
    pub fn corner(&self, corner: Corner) -> (i64, i64) {
        match corner {
            Corner::TopLeft => (self.x, self.y),
            Corner::TopRight => (self.right(), self.y),
            Corner::BottomRight => (self.right(), self.bottom()),
            Corner::BottomLeft => (self.x, self.bottom()),
        }
    }

    /// Strictly inside, at least `band` away from every edge.
    fn interior_contains(&self, px: i64, py: i64, band: u32) -> bool {
        let band = band as i64;
        px > self.x + band
            && px < self.right() - band
            && py > self.y + band
            && py < self.bottom() - band
    }
}

/// The rectangle plus per-corner hover and drag flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub rect: Rect,
    hovered: [bool; 4],
    dragging: [bool; 4],
}

impl Selection {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            hovered: [false; 4],
            dragging: [false; 4],
        }
    }

    pub fn is_hovered(&self, corner: Corner) -> bool {
        self.hovered[corner.index()]
    }

    pub fn is_dragging(&self, corner: Corner) -> bool {
        self.dragging[corner.index()]
    }

    pub fn hovered_corner(&self) -> Option<Corner> {
        Corner::ALL.into_iter().find(|c| self.is_hovered(*c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropState {
    Inactive,
    Armed,
    DraggingHandle(Corner),
    DraggingWhole,
}

/// Pointer input in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Move { x: i64, y: i64 },
    Down { x: i64, y: i64 },
    Up { x: i64, y: i64 },
}

/// What a pointer event did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing to act on (crop inactive, or the pointer hit nothing).
    Ignored,
    /// Hover state was recomputed; the hovered corner, if any.
    Hovered(Option<Corner>),
    /// A drag started.
    Grabbed(CropState),
    /// The rectangle was translated.
    Moved,
    /// A corner drag produced a new rectangle.
    Resized,
    /// A corner drag candidate broke the size guard; rectangle kept.
    Rejected,
    /// A drag ended.
    Released,
}

#[derive(Debug, Clone)]
pub struct CropSelectionController {
    inset: u32,
    handle_size: u32,
    hover_handle_size: u32,
    max_dimension: u32,
    state: CropState,
    selection: Option<Selection>,
    /// Pointer minus the grabbed point (corner, or top-left for whole drags).
    grab: (i64, i64),
}

impl CropSelectionController {
    /// `max_dimension` caps each side of the selection, matching the
    /// largest raster the scaling engine will produce.
    pub fn new(config: &CropConfig, max_dimension: u32) -> Self {
        Self {
            inset: config.inset,
            handle_size: config.handle_size,
            hover_handle_size: config.hover_handle_size,
            max_dimension,
            state: CropState::Inactive,
            selection: None,
            grab: (0, 0),
        }
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != CropState::Inactive
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn rect(&self) -> Option<Rect> {
        self.selection.as_ref().map(|s| s.rect)
    }

    /// Both sides of a selection must exceed this.
    pub fn min_extent(&self) -> u32 {
        self.hover_handle_size.saturating_mul(2)
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn fits_guard(&self, width: i64, height: i64) -> bool {
        let min = self.min_extent() as i64;
        width > min && height > min
    }

    fn within_max(&self, width: i64, height: i64) -> bool {
        let max = self.max_dimension as i64;
        width <= max && height <= max
    }

    /// Check a candidate size against both bounds.
    fn check_size(&self, width: i64, height: i64) -> Result<(u32, u32), CropError> {
        if !self.fits_guard(width, height) {
            return Err(CropError::DegenerateSelection {
                width,
                height,
                min: self.min_extent(),
            });
        }
        if !self.within_max(width, height) {
            return Err(CropError::SelectionTooLarge {
                width,
                height,
                max: self.max_dimension,
            });
        }
        Ok((width as u32, height as u32))
    }

    /// Enter crop mode over a raster of the given size.
    ///
    /// The selection starts inset from the edges, or covers the whole raster
    /// when the inset one would be too small.
    pub fn begin(&mut self, raster_size: (u32, u32)) -> Result<(), CropError> {
        let (w, h) = raster_size;
        let inset = inset_rect(w, h, self.inset)
            .filter(|&(_, _, iw, ih)| self.fits_guard(iw as i64, ih as i64));
        let rect = match inset {
            Some((x, y, iw, ih)) => Rect::new(x, y, iw, ih),
            None if self.fits_guard(w as i64, h as i64) => Rect::new(0, 0, w, h),
            None => {
                return Err(CropError::RasterTooSmall {
                    width: w,
                    height: h,
                    min: self.min_extent(),
                });
            }
        };
        debug!(?rect, "crop mode entered");
        self.selection = Some(Selection::new(rect));
        self.state = CropState::Armed;
        Ok(())
    }

    /// Place the selection directly.
    pub fn place(&mut self, x: i64, y: i64, width: i64, height: i64) -> Result<(), CropError> {
        if self.selection.is_none() {
            return Err(CropError::Inactive);
        }
        let (w, h) = self.check_size(width, height)?;
        self.selection = Some(Selection::new(Rect::new(x, y, w, h)));
        self.state = CropState::Armed;
        Ok(())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> DragOutcome {
        match event {
            PointerEvent::Move { x, y } => self.pointer_move(x, y),
            PointerEvent::Down { x, y } => self.pointer_down(x, y),
            PointerEvent::Up { .. } => self.pointer_up(),
        }
    }

    /// First corner hit at `(px, py)`, using each corner's current window size.
    fn hit_corner(&self, selection: &Selection, px: i64, py: i64) -> Option<Corner> {
        Corner::ALL.into_iter().find(|&corner| {
            let size = if selection.is_hovered(corner) {
                self.hover_handle_size
            } else {
                self.handle_size
            } as i64;
            let (cx, cy) = selection.rect.corner(corner);
            (px - cx).abs() <= size && (py - cy).abs() <= size
        })
    }

    fn update_hover(&mut self, px: i64, py: i64) -> Option<Corner> {
        let selection = self.selection.as_ref()?;
        let hit = self.hit_corner(selection, px, py);
        if let Some(selection) = self.selection.as_mut() {
            selection.hovered = [false; 4];
            if let Some(corner) = hit {
                selection.hovered[corner.index()] = true;
            }
        }
        hit
    }

    pub fn pointer_move(&mut self, px: i64, py: i64) -> DragOutcome {
        match self.state {
            CropState::Inactive => DragOutcome::Ignored,
            CropState::Armed => DragOutcome::Hovered(self.update_hover(px, py)),
            CropState::DraggingWhole => {
                let (gx, gy) = self.grab;
                let Some(selection) = self.selection.as_mut() else {
                    return DragOutcome::Ignored;
                };
                selection.rect.x = px - gx;
                selection.rect.y = py - gy;
                DragOutcome::Moved
            }
            CropState::DraggingHandle(corner) => self.drag_corner(corner, px, py),
        }
    }

    fn drag_corner(&mut self, corner: Corner, px: i64, py: i64) -> DragOutcome {
        let Some(selection) = self.selection.as_ref() else {
            return DragOutcome::Ignored;
        };
        let (nx, ny) = (px - self.grab.0, py - self.grab.1);
        let (ax, ay) = selection.rect.corner(corner.opposite());

        let (x, y, w, h) = match corner {
            Corner::TopLeft => (nx, ny, ax - nx, ay - ny),
            Corner::TopRight => (ax, ny, nx - ax, ay - ny),
            Corner::BottomRight => (ax, ay, nx - ax, ny - ay),
            Corner::BottomLeft => (nx, ay, ax - nx, ny - ay),
        };

        let Ok((w, h)) = self.check_size(w, h) else {
            trace!(?corner, width = w, height = h, "rejected crop candidate");
            return DragOutcome::Rejected;
        };
        if let Some(selection) = self.selection.as_mut() {
            selection.rect = Rect::new(x, y, w, h);
        }
        DragOutcome::Resized
    }

    pub fn pointer_down(&mut self, px: i64, py: i64) -> DragOutcome {
        if self.state != CropState::Armed {
            return DragOutcome::Ignored;
        }
        let band = self.hover_handle_size;

        if let Some(corner) = self.update_hover(px, py) {
            let Some(selection) = self.selection.as_mut() else {
                return DragOutcome::Ignored;
            };
            let (cx, cy) = selection.rect.corner(corner);
            selection.dragging[corner.index()] = true;
            self.grab = (px - cx, py - cy);
            self.state = CropState::DraggingHandle(corner);
            return DragOutcome::Grabbed(self.state);
        }

        match self.selection.as_ref() {
            Some(selection) if selection.rect.interior_contains(px, py, band) => {
                self.grab = (px - selection.rect.x, py - selection.rect.y);
                self.state = CropState::DraggingWhole;
                DragOutcome::Grabbed(self.state)
            }
            _ => DragOutcome::Ignored,
        }
    }

    pub fn pointer_up(&mut self) -> DragOutcome {
        match self.state {
            CropState::DraggingHandle(_) | CropState::DraggingWhole => {
                if let Some(selection) = self.selection.as_mut() {
                    selection.dragging = [false; 4];
                }
                self.state = CropState::Armed;
                DragOutcome::Released
            }
            CropState::Inactive | CropState::Armed => DragOutcome::Ignored,
        }
    }

    /// Copy the selected pixels out of `source` and leave crop mode.
    ///
    /// A selection over the size limit is refused and crop mode stays on.
    pub fn commit(&mut self, source: &Raster) -> Result<Raster, CropError> {
        let Some(r) = self.rect() else {
            return Err(CropError::Inactive);
        };
        self.check_size(r.width as i64, r.height as i64)?;
        self.selection = None;
        self.state = CropState::Inactive;
        debug!(x = r.x, y = r.y, width = r.width, height = r.height, "crop committed");
        Ok(source.copy_region(r.x, r.y, r.width, r.height))
    }

    /// Leave crop mode, discarding the selection. Returns whether it was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.selection = None;
        self.state = CropState::Inactive;
        was_active
    }

    /// Preview of `live` with the selection drawn over it.
    ///
    /// Outside the rectangle is dimmed; the rectangle gets a 1px border and
    /// a square handle on each corner at its current window size.
    pub fn render_overlay(&self, live: &Raster) -> Option<Raster> {
        let selection = self.selection.as_ref()?;
        let r = selection.rect;
        let mut canvas = RasterSurface::new(live.clone());

        canvas.shade_outside(r.x, r.y, r.width, r.height, SHADE);
        canvas.fill_rect(r.x, r.y, r.width, 1, BORDER);
        canvas.fill_rect(r.x, r.bottom() - 1, r.width, 1, BORDER);
        canvas.fill_rect(r.x, r.y, 1, r.height, BORDER);
        canvas.fill_rect(r.right() - 1, r.y, 1, r.height, BORDER);

        for corner in Corner::ALL {
            let (size, color) = if selection.is_hovered(corner) {
                (self.hover_handle_size, HANDLE_HOVERED)
            } else {
                (self.handle_size, HANDLE)
            };
            let (cx, cy) = r.corner(corner);
            let half = size as i64 / 2;
            canvas.fill_rect(cx - half, cy - half, size, size, color);
        }
        Some(canvas.into_live())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::test_helpers::{config_with_handles, gradient, test_config};

    fn controller(config: &EditorConfig) -> CropSelectionController {
        CropSelectionController::new(&config.crop, config.scaling.max_dimension)
    }

    fn armed(raster: (u32, u32)) -> CropSelectionController {
        let mut crop = controller(&test_config());
        crop.begin(raster).unwrap();
        crop
    }

    // =========================================================================
    // begin / place
    // =========================================================================

    #[test]
    fn begin_insets_selection() {
        let crop = armed((200, 100));
        assert_eq!(crop.state(), CropState::Armed);
        assert_eq!(crop.rect(), Some(Rect::new(20, 20, 160, 60)));
    }

    #[test]
    fn begin_falls_back_to_full_raster() {
        // Inset leaves 10x10, under the 20px guard.
        let crop = armed((50, 50));
        assert_eq!(crop.rect(), Some(Rect::new(0, 0, 50, 50)));
    }

    #[test]
    fn begin_rejects_tiny_raster() {
        let mut crop = controller(&test_config());
        let err = crop.begin((20, 300)).unwrap_err();
        assert_eq!(
            err,
            CropError::RasterTooSmall {
                width: 20,
                height: 300,
                min: 20
            }
        );
        assert!(!crop.is_active());
    }

    #[test]
    fn place_applies_guard() {
        let mut crop = armed((200, 200));
        assert!(crop.place(5, 5, 21, 21).is_ok());
        assert_eq!(crop.rect(), Some(Rect::new(5, 5, 21, 21)));

        let err = crop.place(0, 0, 20, 100).unwrap_err();
        assert!(matches!(err, CropError::DegenerateSelection { width: 20, .. }));
        assert_eq!(crop.rect(), Some(Rect::new(5, 5, 21, 21)));
    }

    #[test]
    fn place_rejects_sides_over_max_dimension() {
        let mut config = test_config();
        config.scaling.max_dimension = 500;
        let mut crop = controller(&config);
        crop.begin((300, 300)).unwrap();
        crop.place(0, 0, 500, 40).unwrap();

        let err = crop.place(0, 0, 5000, 40).unwrap_err();
        assert_eq!(
            err,
            CropError::SelectionTooLarge {
                width: 5000,
                height: 40,
                max: 500
            }
        );
        assert_eq!(crop.rect(), Some(Rect::new(0, 0, 500, 40)));
        assert!(crop.place(0, 0, 40, 100_000).is_err());
        assert!(crop.place(0, 0, i64::MAX, 40).is_err());
    }

    #[test]
    fn place_requires_crop_mode() {
        let mut crop = controller(&test_config());
        assert_eq!(crop.place(0, 0, 50, 50), Err(CropError::Inactive));
    }

    // =========================================================================
    // hover
    // =========================================================================

    #[test]
    fn hover_uses_resting_window_then_hovered_window() {
        let mut crop = armed((200, 200));
        // Top-left corner at (20, 20); resting window 6, hovered window 10.
        assert_eq!(crop.pointer_move(28, 20), DragOutcome::Hovered(None));
        assert_eq!(
            crop.pointer_move(25, 20),
            DragOutcome::Hovered(Some(Corner::TopLeft))
        );
        // Now hovered: the larger window keeps it.
        assert_eq!(
            crop.pointer_move(29, 29),
            DragOutcome::Hovered(Some(Corner::TopLeft))
        );
        assert_eq!(crop.pointer_move(31, 20), DragOutcome::Hovered(None));
        assert_eq!(crop.selection().unwrap().hovered_corner(), None);
    }

    #[test]
    fn at_most_one_corner_hovered() {
        let mut crop = controller(&config_with_handles(30, 30));
        crop.begin((200, 200)).unwrap();
        crop.place(0, 0, 61, 61).unwrap();
        // Within 30 of every corner; first in order wins.
        assert_eq!(
            crop.pointer_move(30, 30),
            DragOutcome::Hovered(Some(Corner::TopLeft))
        );
        let sel = crop.selection().unwrap();
        let hovered = Corner::ALL.iter().filter(|c| sel.is_hovered(**c)).count();
        assert_eq!(hovered, 1);
    }

    #[test]
    fn pointer_ignored_when_inactive() {
        let mut crop = controller(&test_config());
        assert_eq!(crop.pointer_move(1, 1), DragOutcome::Ignored);
        assert_eq!(crop.pointer_down(1, 1), DragOutcome::Ignored);
        assert_eq!(crop.pointer_up(), DragOutcome::Ignored);
    }

    // =========================================================================
    // corner drag
    // =========================================================================

    #[test]
    fn corner_drag_keeps_opposite_anchor() {
        let mut crop = armed((200, 200));
        // Grab bottom-right (180, 180) two pixels off its center.
        assert_eq!(
            crop.pointer_down(182, 181),
            DragOutcome::Grabbed(CropState::DraggingHandle(Corner::BottomRight))
        );
        assert!(crop.selection().unwrap().is_dragging(Corner::BottomRight));

        assert_eq!(crop.pointer_move(102, 91), DragOutcome::Resized);
        assert_eq!(crop.rect(), Some(Rect::new(20, 20, 80, 70)));

        assert_eq!(crop.pointer_up(), DragOutcome::Released);
        assert_eq!(crop.state(), CropState::Armed);
        assert!(!crop.selection().unwrap().is_dragging(Corner::BottomRight));
    }

    #[test]
    fn top_left_drag_moves_origin() {
        let mut crop = armed((200, 200));
        crop.pointer_down(20, 20);
        crop.pointer_move(50, 40);
        assert_eq!(crop.rect(), Some(Rect::new(50, 40, 130, 140)));
    }

    #[test]
    fn small_candidate_rejected_and_previous_kept() {
        let mut crop = armed((200, 200));
        crop.place(0, 0, 100, 100).unwrap();
        crop.pointer_down(100, 100);

        // 20x20 is not larger than 2 x 10.
        assert_eq!(crop.pointer_move(20, 20), DragOutcome::Rejected);
        assert_eq!(crop.rect(), Some(Rect::new(0, 0, 100, 100)));

        // 40x40 is.
        assert_eq!(crop.pointer_move(40, 40), DragOutcome::Resized);
        assert_eq!(crop.rect(), Some(Rect::new(0, 0, 40, 40)));
    }

    #[test]
    fn crossing_the_anchor_is_rejected() {
        let mut crop = armed((200, 200));
        crop.pointer_down(20, 180); // bottom-left
        assert_eq!(crop.pointer_move(190, 10), DragOutcome::Rejected);
        assert_eq!(crop.rect(), Some(Rect::new(20, 20, 160, 160)));
    }

    #[test]
    fn oversized_candidate_rejected_and_previous_kept() {
        let mut config = test_config();
        config.scaling.max_dimension = 500;
        let mut crop = controller(&config);
        crop.begin((200, 200)).unwrap();
        crop.pointer_down(180, 180);

        assert_eq!(crop.pointer_move(100_000, 100), DragOutcome::Rejected);
        assert_eq!(crop.rect(), Some(Rect::new(20, 20, 160, 160)));

        assert_eq!(crop.pointer_move(520, 100), DragOutcome::Resized);
        assert_eq!(crop.rect(), Some(Rect::new(20, 20, 500, 80)));
        assert_eq!(crop.pointer_move(521, 100), DragOutcome::Rejected);
        assert_eq!(crop.rect(), Some(Rect::new(20, 20, 500, 80)));
    }

    #[test]
    fn drag_sequences_respect_guard() {
        let mut crop = armed((300, 300));
        let moves = [(200, 30), (30, 200), (275, 275), (22, 22), (-40, 290), (150, 150)];
        for corner in Corner::ALL {
            let (cx, cy) = crop.rect().unwrap().corner(corner);
            crop.pointer_down(cx, cy);
            for (x, y) in moves {
                crop.pointer_move(x, y);
                let r = crop.rect().unwrap();
                assert!(r.width > 20 && r.height > 20, "{corner:?} -> {r:?}");
            }
            crop.pointer_up();
        }
    }

    // =========================================================================
    // whole drag
    // =========================================================================

    #[test]
    fn interior_drag_translates() {
        let mut crop = armed((200, 200));
        assert_eq!(
            crop.pointer_down(100, 100),
            DragOutcome::Grabbed(CropState::DraggingWhole)
        );
        assert_eq!(crop.pointer_move(130, 90), DragOutcome::Moved);
        assert_eq!(crop.rect(), Some(Rect::new(50, 10, 160, 160)));
    }

    #[test]
    fn whole_drag_is_not_clamped() {
        let mut crop = armed((200, 200));
        crop.pointer_down(100, 100);
        crop.pointer_move(-100, -100);
        assert_eq!(crop.rect(), Some(Rect::new(-180, -180, 160, 160)));
    }

    #[test]
    fn border_band_does_not_start_drag() {
        let mut crop = armed((200, 200));
        // Inside the rectangle but within 10px of the left edge, away from corners.
        assert_eq!(crop.pointer_down(30, 100), DragOutcome::Ignored);
        assert_eq!(crop.state(), CropState::Armed);
        assert_eq!(crop.pointer_down(31, 100), DragOutcome::Grabbed(CropState::DraggingWhole));
    }

    #[test]
    fn handle_pointer_dispatches() {
        let mut crop = armed((200, 200));
        crop.handle_pointer(PointerEvent::Down { x: 100, y: 100 });
        crop.handle_pointer(PointerEvent::Move { x: 101, y: 100 });
        assert_eq!(
            crop.handle_pointer(PointerEvent::Up { x: 101, y: 100 }),
            DragOutcome::Released
        );
        assert_eq!(crop.rect(), Some(Rect::new(21, 20, 160, 160)));
    }

    // =========================================================================
    // commit / cancel / overlay
    // =========================================================================

    #[test]
    fn commit_is_exact_copy() {
        let src = gradient(120, 90);
        let mut crop = armed(src.dimensions());
        crop.place(13, 7, 50, 40).unwrap();
        let out = crop.commit(&src).unwrap();

        assert_eq!(out.dimensions(), (50, 40));
        for j in 0..40 {
            for i in 0..50 {
                assert_eq!(out.pixel(i, j), src.pixel(13 + i, 7 + j));
            }
        }
        assert!(!crop.is_active());
        assert!(crop.selection().is_none());
    }

    #[test]
    fn commit_outside_raster_is_transparent() {
        let src = gradient(60, 60);
        let mut crop = armed(src.dimensions());
        crop.place(-10, 0, 30, 30).unwrap();
        let out = crop.commit(&src).unwrap();
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(out.pixel(10, 0), src.pixel(0, 0));
    }

    #[test]
    fn commit_refuses_oversized_selection() {
        let mut crop = armed((200, 200));
        crop.place(0, 0, 300, 300).unwrap();
        crop.max_dimension = 100;

        let err = crop.commit(&gradient(200, 200)).unwrap_err();
        assert!(matches!(err, CropError::SelectionTooLarge { max: 100, .. }));
        assert!(crop.is_active());
        assert_eq!(crop.rect(), Some(Rect::new(0, 0, 300, 300)));
    }

    #[test]
    fn commit_requires_crop_mode() {
        let mut crop = controller(&test_config());
        assert_eq!(crop.commit(&gradient(4, 4)), Err(CropError::Inactive));
    }

    #[test]
    fn cancel_discards_selection() {
        let mut crop = armed((100, 100));
        assert!(crop.cancel());
        assert!(!crop.cancel());
        assert_eq!(crop.state(), CropState::Inactive);
        assert!(crop.rect().is_none());
    }

    #[test]
    fn overlay_dims_outside_and_leaves_source() {
        let live = Raster::from_fn(100, 100, |_, _| [200, 200, 200, 255]);
        let crop = armed(live.dimensions());
        let preview = crop.render_overlay(&live).unwrap();

        assert!(preview.pixel(5, 50).unwrap()[0] < 200);
        assert_eq!(preview.pixel(50, 50), Some([200, 200, 200, 255]));
        assert_eq!(preview.pixel(50, 20), Some(BORDER));
        assert_eq!(preview.pixel(20, 20), Some(HANDLE));
        assert_eq!(live.pixel(5, 50), Some([200, 200, 200, 255]));
    }

    #[test]
    fn overlay_marks_hovered_handle() {
        let live = Raster::from_fn(100, 100, |_, _| [200, 200, 200, 255]);
        let mut crop = armed(live.dimensions());
        crop.pointer_move(80, 80);
        let preview = crop.render_overlay(&live).unwrap();
        assert_eq!(preview.pixel(80, 80), Some(HANDLE_HOVERED));
        assert_eq!(preview.pixel(20, 20), Some(HANDLE));
    }

    #[test]
    fn no_overlay_when_inactive() {
        let crop = controller(&test_config());
        assert!(crop.render_overlay(&gradient(10, 10)).is_none());
    }
}
