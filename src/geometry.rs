//! Pure placement and scaling policy
//!
//! Inputs are preference values plus host-surface dimensions; the outputs
//! are applied to the scene graph by [`LogoOverlay`](crate::overlay::LogoOverlay).
//! Nothing here performs I/O or holds state.

use crate::prefs::LogoPosition;
use crate::types::Align;

/// Alignment pair for a placement value.
pub fn alignment(position: LogoPosition) -> (Align, Align) {
    match position {
        LogoPosition::Center => (Align::Center, Align::Center),
        LogoPosition::BottomLeft => (Align::Start, Align::End),
        LogoPosition::BottomCenter => (Align::Center, Align::End),
        LogoPosition::BottomRight => (Align::End, Align::End),
    }
}

/// Alignment pair for the raw schema string. Unknown values yield `None`;
/// the caller keeps whatever placement was applied last.
pub fn alignment_for(raw: &str) -> Option<(Align, Align)> {
    LogoPosition::parse(raw).map(alignment)
}

/// Logo width in pixels for a size preference, as a share of the work area.
pub fn target_width(size_percent: f64, work_area_width: u32) -> f64 {
    work_area_width as f64 * size_percent / 100.0
}

/// Multiplicative transform mapping the decoded width onto the target width.
///
/// `None` while the image has no decoded width yet; the image-ready event
/// re-triggers the computation.
pub fn scale_factor(target_width: f64, natural_width: u32) -> Option<f64> {
    if natural_width == 0 {
        return None;
    }
    Some(target_width / natural_width as f64)
}

/// Decode width for loading at the top of the size schema range, so later
/// size changes only adjust the scale transform instead of re-decoding.
pub fn max_decode_width(size_range_max: f64, work_area_width: u32) -> i32 {
    target_width(size_range_max, work_area_width).ceil() as i32
}
