use serde::{Deserialize, Serialize};

use crate::shared::{Geometry, NativeHandle, WindowState};
use crate::wm::backend::{NativeAttributes, WindowKind};

/// Title used for windows that expose no name property
pub const UNTITLED: &str = "Application";

/// Local command still waiting for the native side to catch up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingCommand {
    /// State the command asked for
    pub target: WindowState,
    /// Reconcile cycles left before native reads are trusted again
    pub cycles_left: u8,
}

/// A tracked top-level window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedWindow {
    /// X11 window ID
    pub handle: NativeHandle,

    /// Window title
    pub title: String,

    /// Lifecycle state
    pub state: WindowState,

    /// Current geometry; only follows native reads while `Normal`
    pub current_geometry: Geometry,

    /// Geometry to go back to when leaving Maximized/FullScreen
    pub saved_normal_geometry: Geometry,

    /// Decided once at discovery
    pub manageable: bool,

    /// Classification that made the window manageable
    #[serde(skip, default = "default_kind")]
    pub kind: WindowKind,

    /// State the window was in when it got minimized
    #[serde(skip)]
    pub(crate) minimized_from: WindowState,

    #[serde(skip)]
    pub(crate) pending: Option<PendingCommand>,
}

fn default_kind() -> WindowKind {
    WindowKind::Normal
}

impl ManagedWindow {
    /// Build the entry for a freshly discovered window, always in `Normal`
    pub fn from_native(handle: NativeHandle, attrs: &NativeAttributes) -> Self {
        Self {
            handle,
            title: title_or_default(attrs.title.as_deref()),
            state: WindowState::Normal,
            current_geometry: attrs.geometry,
            saved_normal_geometry: attrs.geometry,
            manageable: attrs.is_manageable(),
            kind: attrs.kind,
            minimized_from: WindowState::Normal,
            pending: None,
        }
    }

    pub fn is_maximized(&self) -> bool {
        self.state == WindowState::Maximized
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state == WindowState::FullScreen
    }

    pub fn is_closing(&self) -> bool {
        self.state == WindowState::Closing
    }

    /// Whether a local command is still unconfirmed
    pub fn has_pending_command(&self) -> bool {
        self.pending.is_some()
    }
}

pub(crate) fn title_or_default(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::fake::app_window;

    #[test]
    fn test_from_native_starts_normal() {
        let attrs = app_window("Files", Geometry::new(10, 20, 300, 200));
        let window = ManagedWindow::from_native(0x1c00003, &attrs);

        assert_eq!(window.state, WindowState::Normal);
        assert_eq!(window.current_geometry, Geometry::new(10, 20, 300, 200));
        assert_eq!(window.saved_normal_geometry, window.current_geometry);
        assert!(window.manageable);
        assert!(!window.has_pending_command());
    }

    #[test]
    fn test_missing_title_gets_placeholder() {
        let mut attrs = app_window("", Geometry::default());
        assert_eq!(ManagedWindow::from_native(1, &attrs).title, UNTITLED);

        attrs.title = None;
        assert_eq!(ManagedWindow::from_native(1, &attrs).title, UNTITLED);
    }
}
