//! Windowing system seam
//!
//! The engine never talks to X11 directly. Everything it needs from the
//! outside world goes through [`WindowSystem`]: listing top-level windows,
//! reading their attributes, and writing one-way requests. The X11
//! implementation lives in [`crate::wm::x11`].

use bitflags::bitflags;

use crate::error::BackendError;
use crate::shared::{Geometry, NativeHandle, WindowState};
use crate::wm::dispatch::Command;

/// Window role as announced through `_NET_WM_WINDOW_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Normal,
    Dialog,
    Desktop,
    Dock,
    /// Menus, tooltips, splash screens, toolbars, notifications...
    Other,
}

impl WindowKind {
    /// Only ordinary application windows and their dialogs are tracked
    pub fn is_manageable(self) -> bool {
        matches!(self, Self::Normal | Self::Dialog)
    }
}

bitflags! {
    /// Subset of `_NET_WM_STATE` (plus ICCCM iconic state) the engine reads
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NetState: u8 {
        const MAXIMIZED_VERT = 1 << 0;
        const MAXIMIZED_HORZ = 1 << 1;
        const HIDDEN         = 1 << 2;
        const FULLSCREEN     = 1 << 3;
    }
}

impl NetState {
    /// The lifecycle state these flags describe
    ///
    /// Hidden wins over fullscreen, fullscreen over maximized: window
    /// managers keep the other flags on an iconified window. A window is only
    /// considered maximized when both axes are.
    pub fn implied_state(self) -> WindowState {
        if self.contains(Self::HIDDEN) {
            WindowState::Minimized
        } else if self.contains(Self::FULLSCREEN) {
            WindowState::FullScreen
        } else if self.contains(Self::MAXIMIZED_VERT | Self::MAXIMIZED_HORZ) {
            WindowState::Maximized
        } else {
            WindowState::Normal
        }
    }
}

/// Everything discovery reads about one native window in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAttributes {
    pub kind: WindowKind,
    pub override_redirect: bool,
    /// Root-relative geometry
    pub geometry: Geometry,
    /// `None` when the window carries no name property at all
    pub title: Option<String>,
    pub viewable: bool,
    pub net_state: NetState,
}

impl NativeAttributes {
    pub fn is_manageable(&self) -> bool {
        !self.override_redirect && self.kind.is_manageable()
    }
}

/// Bounded, synchronous access to the windowing system
///
/// Every call either completes or fails immediately; nothing here waits for
/// another client. `send` only queues a request, `flush` writes the queue.
pub trait WindowSystem {
    /// All current top-level windows
    fn enumerate_top_level_windows(&self) -> Result<Vec<NativeHandle>, BackendError>;

    /// Attributes of one window; `BackendError::Query` when it cannot be read
    fn window_attributes(&self, handle: NativeHandle) -> Result<NativeAttributes, BackendError>;

    /// The window the windowing system reports as focused, if any
    fn active_window(&self) -> Result<Option<NativeHandle>, BackendError>;

    /// Ask for property and structure notifications on a tracked window
    fn watch(&self, handle: NativeHandle) -> Result<(), BackendError>;

    /// Queue a one-way request; no acknowledgement exists
    fn send(&self, handle: NativeHandle, command: &Command) -> Result<(), BackendError>;

    fn flush(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_normal_and_dialog_are_manageable() {
        assert!(WindowKind::Normal.is_manageable());
        assert!(WindowKind::Dialog.is_manageable());
        assert!(!WindowKind::Desktop.is_manageable());
        assert!(!WindowKind::Dock.is_manageable());
        assert!(!WindowKind::Other.is_manageable());
    }

    #[test]
    fn test_override_redirect_is_never_manageable() {
        let attrs = NativeAttributes {
            kind: WindowKind::Normal,
            override_redirect: true,
            geometry: Geometry::new(0, 0, 10, 10),
            title: None,
            viewable: true,
            net_state: NetState::empty(),
        };
        assert!(!attrs.is_manageable());
    }

    #[test]
    fn test_implied_state() {
        assert_eq!(NetState::empty().implied_state(), WindowState::Normal);
        assert_eq!(NetState::MAXIMIZED_VERT.implied_state(), WindowState::Normal);
        assert_eq!(
            (NetState::MAXIMIZED_VERT | NetState::MAXIMIZED_HORZ).implied_state(),
            WindowState::Maximized
        );
        assert_eq!(
            (NetState::HIDDEN | NetState::MAXIMIZED_VERT | NetState::MAXIMIZED_HORZ).implied_state(),
            WindowState::Minimized
        );
        assert_eq!(
            (NetState::FULLSCREEN | NetState::HIDDEN).implied_state(),
            WindowState::Minimized
        );
        assert_eq!(
            (NetState::FULLSCREEN | NetState::MAXIMIZED_VERT | NetState::MAXIMIZED_HORZ).implied_state(),
            WindowState::FullScreen
        );
    }
}
