#![forbid(unsafe_code)]

//! Reactive logo overlay for desktop-shell background surfaces.
//!
//! One [`LogoOverlay`] is bound to each live background surface; the
//! [`OverlayManager`] keeps that set synchronized across monitor hotplug,
//! workspace changes and background swaps, while each overlay tracks the
//! user's logo preferences and its surface's content. Host capabilities
//! (preference storage, surface enumeration, scene-graph nodes, image
//! loading, opacity animation) are the collaborator traits in [`host`]; the
//! crate itself never talks to a display server.

pub mod constants;
pub mod geometry;
pub mod host;
pub mod image;
pub mod manager;
pub mod overlay;
pub mod prefs;
pub mod types;
pub mod visibility;

pub use host::{Easing, HostContext, HostEvent, ImageCache, LoadSpec, SceneGraph, SurfaceRegistry};
pub use image::FsImageCache;
pub use manager::OverlayManager;
pub use overlay::LogoOverlay;
pub use prefs::{LogoPosition, MemoryPrefs, PrefKey, PrefValues, PreferenceStore};
pub use types::{Align, Dimensions, ImageId, NodeId, Rect, SurfaceId};
