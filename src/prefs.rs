//! Preference surface of the overlay
//!
//! The shell owns preference storage and its schema; this module defines the
//! read-only typed view the core consumes ([`PreferenceStore`]), the schema
//! keys it reacts to, and [`MemoryPrefs`], an in-memory store for embedding
//! hosts without their own backend and for the test suite.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::size;

/// The six schema keys the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKey {
    LogoFile,
    LogoSize,
    LogoPosition,
    LogoBorder,
    LogoOpacity,
    AlwaysVisible,
}

impl PrefKey {
    /// Schema spelling of the key, as the host persists it.
    pub fn name(self) -> &'static str {
        match self {
            PrefKey::LogoFile => "logo-file",
            PrefKey::LogoSize => "logo-size",
            PrefKey::LogoPosition => "logo-position",
            PrefKey::LogoBorder => "logo-border",
            PrefKey::LogoOpacity => "logo-opacity",
            PrefKey::AlwaysVisible => "logo-always-visible",
        }
    }
}

/// Placement of the logo inside the work area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    Center,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl LogoPosition {
    /// Parse the schema string form. Unknown values yield `None` so callers
    /// can keep the previously applied placement.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "center" => Some(LogoPosition::Center),
            "bottom-left" => Some(LogoPosition::BottomLeft),
            "bottom-center" => Some(LogoPosition::BottomCenter),
            "bottom-right" => Some(LogoPosition::BottomRight),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogoPosition::Center => "center",
            LogoPosition::BottomLeft => "bottom-left",
            LogoPosition::BottomCenter => "bottom-center",
            LogoPosition::BottomRight => "bottom-right",
        }
    }
}

/// Read-only typed view over the shell's preference store.
///
/// Change notification is delivered by the host as
/// [`HostEvent::PrefChanged`](crate::host::HostEvent) on its event loop; the
/// store itself only answers point reads.
pub trait PreferenceStore {
    /// Raw `logo-file` value; may be empty, `~/`-prefixed, or relative.
    fn logo_file(&self) -> String;

    /// `logo-size` in percent of the work-area width.
    fn logo_size(&self) -> f64;

    /// Raw `logo-position` value; corrupted values are tolerated downstream.
    fn logo_position(&self) -> String;

    /// Padding in pixels around the logo inside its container.
    fn logo_border(&self) -> u32;

    /// Configured logo opacity, before any vignette dimming.
    fn logo_opacity(&self) -> u8;

    /// Whether the logo shows on every wallpaper, not just the default one.
    fn always_visible(&self) -> bool;

    /// Upper bound of the `logo-size` schema range.
    fn size_range_max(&self) -> f64;
}

/// Resolve the configured logo path to an absolute identity.
///
/// Empty values resolve to `None`. `~` and `~/...` expand to the home
/// directory; relative paths are anchored at the process working directory,
/// mirroring command-line-argument resolution. The file is not required to
/// exist; identity comparison is lexical, not filesystem-canonical.
pub fn resolve_logo_file(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }

    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return Some(home);
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Some(home.join(rest));
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    match std::env::current_dir() {
        Ok(cwd) => Some(cwd.join(path)),
        Err(err) => {
            warn!(path = %raw, error = ?err, "cannot resolve working directory, using path as-is");
            Some(path.to_path_buf())
        }
    }
}

/// Preference values in their persisted shape, named as the schema spells
/// them so hosts can serialize them in whatever format they own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PrefValues {
    pub logo_file: String,
    pub logo_size: f64,
    pub logo_position: String,
    pub logo_border: u32,
    pub logo_opacity: u8,
    pub logo_always_visible: bool,
}

fn default_size() -> f64 {
    8.0
}

fn default_border() -> u32 {
    10
}

impl Default for PrefValues {
    fn default() -> Self {
        Self {
            logo_file: String::new(),
            logo_size: default_size(),
            logo_position: LogoPosition::default().as_str().to_string(),
            logo_border: default_border(),
            logo_opacity: u8::MAX,
            logo_always_visible: false,
        }
    }
}

/// In-memory [`PreferenceStore`] carrying the schema defaults.
///
/// Values are validated and clamped at set time so readers never observe an
/// out-of-range preference.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: RefCell<PrefValues>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from host-supplied values, clamping where needed.
    pub fn from_values(values: PrefValues) -> Self {
        let prefs = Self {
            values: RefCell::new(values),
        };
        let size = prefs.values.borrow().logo_size;
        prefs.set_logo_size(size);
        prefs
    }

    pub fn set_logo_file(&self, file: &str) {
        self.values.borrow_mut().logo_file = file.to_string();
    }

    pub fn set_logo_size(&self, size: f64) {
        if !size.is_finite() {
            warn!(logo_size = size, "non-finite logo-size, using default");
            self.values.borrow_mut().logo_size = default_size();
            return;
        }
        let clamped = size.clamp(size::MIN_PERCENT, self.size_range_max());
        if clamped != size {
            warn!(
                logo_size = size,
                clamped = clamped,
                "logo-size outside schema range, clamping"
            );
        }
        self.values.borrow_mut().logo_size = clamped;
    }

    /// Store the raw string; corrupted values are tolerated and ignored at
    /// the point of use, keeping the previously applied placement.
    pub fn set_logo_position(&self, position: &str) {
        self.values.borrow_mut().logo_position = position.to_string();
    }

    pub fn set_logo_border(&self, border: u32) {
        self.values.borrow_mut().logo_border = border;
    }

    pub fn set_logo_opacity(&self, opacity: u8) {
        self.values.borrow_mut().logo_opacity = opacity;
    }

    pub fn set_always_visible(&self, always: bool) {
        self.values.borrow_mut().logo_always_visible = always;
    }
}

impl PreferenceStore for MemoryPrefs {
    fn logo_file(&self) -> String {
        self.values.borrow().logo_file.clone()
    }

    fn logo_size(&self) -> f64 {
        self.values.borrow().logo_size
    }

    fn logo_position(&self) -> String {
        self.values.borrow().logo_position.clone()
    }

    fn logo_border(&self) -> u32 {
        self.values.borrow().logo_border
    }

    fn logo_opacity(&self) -> u8 {
        self.values.borrow().logo_opacity
    }

    fn always_visible(&self) -> bool {
        self.values.borrow().logo_always_visible
    }

    fn size_range_max(&self) -> f64 {
        size::MAX_PERCENT
    }
}
