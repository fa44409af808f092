//! Pure visibility and opacity policy

use std::path::Path;

/// Whether the logo should be shown on a surface.
///
/// Forced on by the always-visible preference; otherwise the logo appears
/// only on the user's default wallpaper, and never when the background has
/// no image at all.
pub fn compute(
    always_visible: bool,
    current: Option<&Path>,
    default_image: Option<&Path>,
) -> bool {
    if always_visible {
        return true;
    }
    let Some(current) = current else {
        return false;
    };
    default_image.is_some_and(|default_image| current == default_image)
}

/// Node opacity after the surface's vignette dims the configured value.
///
/// `brightness` is the factor the host reports for an active darkening
/// effect, `1.0` when none is active.
pub fn effective_opacity(configured: u8, brightness: f64) -> u8 {
    let scaled = (configured as f64 * brightness).round();
    scaled.clamp(0.0, u8::MAX as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    #[test]
    fn always_visible_overrides_everything() {
        assert!(compute(true, Some(&p("/a.png")), Some(&p("/b.png"))));
        assert!(compute(true, None, Some(&p("/b.png"))));
        assert!(compute(true, None, None));
    }

    #[test]
    fn visible_only_on_default_wallpaper() {
        assert!(compute(false, Some(&p("/bg.png")), Some(&p("/bg.png"))));
        assert!(!compute(false, Some(&p("/other.png")), Some(&p("/bg.png"))));
    }

    #[test]
    fn hidden_when_background_has_no_image() {
        assert!(!compute(false, None, Some(&p("/bg.png"))));
        assert!(!compute(false, None, None));
    }

    #[test]
    fn hidden_when_no_default_is_known() {
        assert!(!compute(false, Some(&p("/bg.png")), None));
    }

    #[test]
    fn effective_opacity_scales_with_brightness() {
        assert_eq!(effective_opacity(255, 1.0), 255);
        assert_eq!(effective_opacity(255, 0.5), 128);
        assert_eq!(effective_opacity(200, 0.25), 50);
        assert_eq!(effective_opacity(0, 1.0), 0);
    }

    #[test]
    fn effective_opacity_clamps_overdriven_brightness() {
        assert_eq!(effective_opacity(200, 2.0), 255);
        assert_eq!(effective_opacity(200, -1.0), 0);
    }
}
