//! The narrow notification seam between the editor and its host UI.
//!
//! The host owns the widgets (dimension fields, the crop button label); the
//! session tells it when what they display has changed through [`HostView`].
//! Everything else the host needs it reads back from
//! [`EditorSession`](crate::session::EditorSession) directly.

/// Callbacks the host implements to keep its widgets in sync.
///
/// Both methods take `&self`; hosts that record state use interior
/// mutability.
pub trait HostView {
    /// The working width/height changed, or a scale was requested.
    ///
    /// Called on every scale request, including ones that leave the size
    /// unchanged, so the readout is always re-rendered.
    fn dimensions_changed(&self, width: u32, height: u32);

    /// Crop mode was entered (`true`) or left (`false`).
    fn crop_mode_changed(&self, active: bool);
}

/// A host that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl HostView for NullView {
    fn dimensions_changed(&self, _width: u32, _height: u32) {}

    fn crop_mode_changed(&self, _active: bool) {}
}

impl<V: HostView + ?Sized> HostView for &V {
    fn dimensions_changed(&self, width: u32, height: u32) {
        (**self).dimensions_changed(width, height);
    }

    fn crop_mode_changed(&self, active: bool) {
        (**self).crop_mode_changed(active);
    }
}
