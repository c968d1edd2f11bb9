//! Window state shared between discovery, the state controller and listeners
//!
//! These are the plain value types that cross every boundary of the crate:
//! they are stored in the registry, carried by notifications and handed to
//! the shell in snapshots.

use serde::{Deserialize, Serialize};

/// X11 window id of a top-level window
pub type NativeHandle = u32;

/// Window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Lifecycle state of a managed window
///
/// `Maximized`, `Minimized` and `FullScreen` are mutually exclusive and are
/// all entered from (and left back to) `Normal`. `Closing` can be entered
/// from anywhere and is never left: the entry is dropped once discovery
/// stops seeing the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Minimized,
    FullScreen,
    Closing,
}

impl WindowState {
    /// States whose geometry is dictated by the workspace rectangle
    pub fn fills_workspace(self) -> bool {
        matches!(self, Self::Maximized | Self::FullScreen)
    }
}
