//! Application-wide constants
//!
//! Single source of truth for the magic numbers the overlay applies to the
//! scene graph.

/// Visibility fade animation constants
pub mod fade {
    /// Fade duration in milliseconds, matching the shell's wallpaper
    /// crossfade so the logo never pops against a still-fading background
    pub const DURATION_MS: u32 = 1000;
}

/// Node opacity bounds
pub mod opacity {
    /// Fully opaque node opacity
    pub const OPAQUE: u8 = 255;

    /// Fully transparent node opacity
    pub const TRANSPARENT: u8 = 0;
}

/// Logo size schema range, in percent of the work-area width
pub mod size {
    /// Lower bound of the logo-size schema range
    pub const MIN_PERCENT: f64 = 0.0;

    /// Upper bound of the logo-size schema range
    pub const MAX_PERCENT: f64 = 100.0;
}
