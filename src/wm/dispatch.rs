//! Protocol command dispatch
//!
//! Turns abstract commands into requests on the windowing connection. The
//! protocol has no acknowledgement, so nothing here decides or records
//! anything about window state: the outcome is only known once discovery
//! observes it.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::shared::NativeHandle;
use crate::wm::backend::WindowSystem;

/// One-way request targeted at a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Iconify (ICCCM `WM_CHANGE_STATE`)
    Minimize,
    /// Add or remove both maximized axes
    SetMaximized { enabled: bool },
    /// Add or remove `_NET_WM_STATE_FULLSCREEN`
    SetFullScreen { enabled: bool },
    /// Ask for focus (and de-iconify) via `_NET_ACTIVE_WINDOW`
    Activate,
    /// Polite `WM_DELETE_WINDOW`, never a kill
    Close,
}

/// Fire-and-forget sender
#[derive(Debug, Default)]
pub struct Dispatcher {
    sent: u64,
    failed: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transmit `command` to `handle`
    ///
    /// Failures are logged and swallowed; the next reconcile cycle reflects
    /// whatever actually happened.
    pub fn send<B: WindowSystem>(&mut self, backend: &B, handle: NativeHandle, command: Command) {
        match backend.send(handle, &command) {
            Ok(()) => {
                self.sent += 1;
                debug!("Sent {:?} to window 0x{:x}", command, handle);
            }
            Err(err) => {
                self.failed += 1;
                warn!("Dropping {:?} for window 0x{:x}: {}", command, handle, err);
            }
        }
    }

    /// Requests written successfully so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Requests that failed to transmit
    pub fn failed(&self) -> u64 {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::fake::FakeWindowSystem;

    #[test]
    fn test_send_to_vanished_window_is_swallowed() {
        let backend = FakeWindowSystem::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.send(&backend, 0x400009, Command::Minimize);

        assert_eq!(dispatcher.failed(), 1);
    }

    #[test]
    fn test_send_records_command() {
        let backend = FakeWindowSystem::new();
        backend.add_app(0x400001, "xterm", Geometry::new(0, 0, 640, 480));
        let mut dispatcher = Dispatcher::new();

        dispatcher.send(&backend, 0x400001, Command::SetMaximized { enabled: true });

        assert_eq!(backend.sent(), vec![(0x400001, Command::SetMaximized { enabled: true })]);
        assert_eq!(dispatcher.sent(), 1);
        assert_eq!(dispatcher.failed(), 0);
    }

    #[test]
    fn test_send_failure_is_swallowed() {
        let backend = FakeWindowSystem::new();
        backend.add_app(0x400001, "xterm", Geometry::new(0, 0, 640, 480));
        backend.fail_sends(true);
        let mut dispatcher = Dispatcher::new();

        dispatcher.send(&backend, 0x400001, Command::Close);
        dispatcher.send(&backend, 0x400001, Command::Close);

        // No retry: two attempts, two failures, nothing queued
        assert!(backend.sent().is_empty());
        assert_eq!(dispatcher.failed(), 2);
        assert_eq!(dispatcher.sent(), 0);
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&Command::SetFullScreen { enabled: false }).unwrap();
        assert_eq!(json, r#"{"type":"SetFullScreen","enabled":false}"#);
    }
}
