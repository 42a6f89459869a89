//! Zoom level selection.

use super::header::ZoomLevelHeader;

/// Selects the zoom level appropriate for a rendering resolution.
///
/// Scans the headers in zoom-number order (coarsest first) and returns the
/// first whose reduction level is strictly finer than `bp_per_pixel`; a
/// level whose reduction exactly equals the scale is rejected. `None` means
/// no zoom level qualifies and the caller should read full-resolution data.
#[must_use]
pub fn zoom_level_for_scale(
    bp_per_pixel: f64,
    zoom_headers: &[ZoomLevelHeader],
) -> Option<&ZoomLevelHeader> {
    zoom_headers
        .iter()
        .find(|zoom| f64::from(zoom.reduction_level) < bp_per_pixel)
}
