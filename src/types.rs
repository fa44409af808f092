//! Shared value types for overlay geometry and host handles.

use serde::{Deserialize, Serialize};

/// Scene-graph node handle, allocated by the host's scene collaborator.
pub type NodeId = u32;

/// Background-surface handle, allocated by the host's surface registry.
pub type SurfaceId = u32;

/// Image handle, allocated by the image-cache collaborator.
pub type ImageId = u32;

/// Work-area rectangle of a monitor, excluding panels and docks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Natural pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Alignment of a node inside its parent, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
}
