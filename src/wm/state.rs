//! State & geometry controller
//!
//! Local window operations requested by the shell. Each one updates the
//! in-memory entry first, notifies, and then hands a one-way request to the
//! dispatcher. An operation that would not change anything does nothing at
//! all: no geometry write, no event, no request.

use tracing::debug;

use crate::shared::{Geometry, NativeHandle, WindowState};
use crate::wm::backend::WindowSystem;
use crate::wm::client::{ManagedWindow, PendingCommand};
use crate::wm::dispatch::Command;
use crate::wm::notify::WindowEvent;
use crate::wm::WindowManager;

/// Move `window` into `target`, applying the geometry policy
///
/// - into Maximized/FullScreen: the normal geometry is snapshotted when the
///   window is leaving Normal (directly, or through a Minimized that started
///   from Normal) and the workspace becomes the current geometry
/// - back to Normal from Maximized/FullScreen: the snapshot is restored
/// - back to Normal from Minimized: geometry is left as it was, unless the
///   window was minimized out of Maximized/FullScreen, in which case the
///   snapshot is restored as well
/// - Closing is terminal
///
/// A workspace-filling geometry is therefore never taken as normal geometry.
///
/// Returns false, leaving the window untouched, when there is nothing to do.
pub(crate) fn apply_transition(
    window: &mut ManagedWindow,
    target: WindowState,
    workspace: Geometry,
) -> bool {
    let from = window.state;
    if from == target || from == WindowState::Closing {
        return false;
    }

    match target {
        WindowState::Normal => {
            let filled = from.fills_workspace()
                || (from == WindowState::Minimized && window.minimized_from.fills_workspace());
            if filled {
                window.current_geometry = window.saved_normal_geometry;
            }
        }
        WindowState::Maximized | WindowState::FullScreen => {
            let leaving_normal = from == WindowState::Normal
                || (from == WindowState::Minimized && window.minimized_from == WindowState::Normal);
            if leaving_normal {
                window.saved_normal_geometry = window.current_geometry;
            }
            window.current_geometry = workspace;
        }
        WindowState::Minimized => {
            window.minimized_from = from;
        }
        WindowState::Closing => {}
    }

    window.state = target;
    true
}

/// Requests needed besides the primary one so the window manager's flags end
/// up describing `target` alone
///
/// EWMH keeps `_NET_WM_STATE` flags across iconify and fullscreen: a
/// maximized window that goes fullscreen or gets iconified is still flagged
/// maximized, and an iconified window stays hidden until activated.
fn follow_up_commands(
    from: WindowState,
    minimized_from: WindowState,
    target: WindowState,
) -> Vec<Command> {
    let mut commands = Vec::new();
    if matches!(target, WindowState::Minimized | WindowState::Closing) {
        return commands;
    }

    let left = if from == WindowState::Minimized {
        commands.push(Command::Activate);
        minimized_from
    } else {
        from
    };
    if left == WindowState::Maximized && target != WindowState::Maximized {
        commands.push(Command::SetMaximized { enabled: false });
    }
    if left == WindowState::FullScreen && target != WindowState::FullScreen {
        commands.push(Command::SetFullScreen { enabled: false });
    }
    commands
}

impl<B: WindowSystem> WindowManager<B> {
    /// Iconify; geometry is untouched
    pub fn minimize(&mut self, handle: NativeHandle) {
        self.command(handle, WindowState::Minimized, Command::Minimize);
    }

    /// Fill the workspace, remembering the normal geometry; idempotent
    pub fn maximize(&mut self, handle: NativeHandle) {
        self.command(handle, WindowState::Maximized, Command::SetMaximized { enabled: true });
    }

    /// Back to Normal from any of Maximized, Minimized or FullScreen
    ///
    /// From Minimized the window is activated, and also un-maximized (or
    /// taken out of fullscreen) when that is where it was minimized from.
    pub fn restore(&mut self, handle: NativeHandle) {
        let Some(window) = self.lookup(handle, "restore") else {
            return;
        };
        let state = window.state;
        let command = match state {
            WindowState::Maximized => Command::SetMaximized { enabled: false },
            WindowState::FullScreen => Command::SetFullScreen { enabled: false },
            WindowState::Minimized => Command::Activate,
            WindowState::Normal | WindowState::Closing => {
                debug!("restore: window 0x{:x} is {:?}, nothing to do", handle, state);
                return;
            }
        };
        self.command(handle, WindowState::Normal, command);
    }

    pub fn toggle_maximize(&mut self, handle: NativeHandle) {
        let Some(maximized) = self.lookup(handle, "toggle_maximize").map(|w| w.is_maximized()) else {
            return;
        };
        if maximized {
            self.restore(handle);
        } else {
            self.maximize(handle);
        }
    }

    /// Enter fullscreen, or leave it (same as `restore` from FullScreen)
    pub fn set_fullscreen(&mut self, handle: NativeHandle, enabled: bool) {
        let Some(fullscreen) = self.lookup(handle, "set_fullscreen").map(|w| w.is_fullscreen()) else {
            return;
        };
        if enabled {
            self.command(handle, WindowState::FullScreen, Command::SetFullScreen { enabled: true });
        } else if fullscreen {
            self.restore(handle);
        }
    }

    /// Focus a window, de-iconifying it first if needed
    pub fn activate(&mut self, handle: NativeHandle) {
        let Some(state) = self.lookup(handle, "activate").map(|w| w.state) else {
            return;
        };
        match state {
            WindowState::Minimized => self.restore(handle),
            WindowState::Closing => {
                debug!("activate: window 0x{:x} is closing", handle);
            }
            _ => self.dispatcher.send(&self.backend, handle, Command::Activate),
        }
    }

    /// Politely ask the window to close
    ///
    /// The entry stays (in `Closing`) until discovery no longer sees the
    /// window; a client that ignores the request simply stays listed.
    pub fn request_close(&mut self, handle: NativeHandle) {
        let Some(window) = self.registry.get_mut(handle) else {
            debug!("request_close ignored: window 0x{:x} is not managed", handle);
            return;
        };
        if window.is_closing() {
            return;
        }
        window.state = WindowState::Closing;
        window.pending = None;

        self.emit(WindowEvent::WindowStateChanged { handle, state: WindowState::Closing });
        self.dispatcher.send(&self.backend, handle, Command::Close);
    }

    /// New usable area from the shell; workspace-filling windows follow it
    pub fn apply_workspace_geometry(&mut self, rect: Geometry) {
        if rect != self.workspace {
            debug!(
                "Workspace now {}x{} at ({}, {})",
                rect.width, rect.height, rect.x, rect.y
            );
        }
        self.workspace = rect;

        let mut events: Vec<WindowEvent> = self
            .registry
            .iter_mut()
            .filter(|w| w.state.fills_workspace() && w.current_geometry != rect)
            .map(|w| {
                w.current_geometry = rect;
                WindowEvent::WindowGeometryChanged { handle: w.handle, geometry: rect }
            })
            .collect();
        events.sort_by_key(WindowEvent::handle);
        self.emit_all(events);
    }

    /// Shared path for the transitions that go through the dispatcher
    fn command(&mut self, handle: NativeHandle, target: WindowState, command: Command) -> bool {
        let workspace = self.workspace;
        let settle_cycles = self.settle_cycles;
        let Some(window) = self.registry.get_mut(handle) else {
            debug!("{:?} ignored: window 0x{:x} is not managed", command, handle);
            return false;
        };

        let (from, minimized_from) = (window.state, window.minimized_from);
        if !apply_transition(window, target, workspace) {
            debug!("{:?} is a no-op for window 0x{:x} in {:?}", command, handle, from);
            return false;
        }
        window.pending = (settle_cycles > 0).then_some(PendingCommand {
            target,
            cycles_left: settle_cycles,
        });

        self.emit(WindowEvent::WindowStateChanged { handle, state: target });
        self.dispatcher.send(&self.backend, handle, command);
        for extra in follow_up_commands(from, minimized_from, target) {
            if extra != command {
                self.dispatcher.send(&self.backend, handle, extra);
            }
        }
        true
    }
}
