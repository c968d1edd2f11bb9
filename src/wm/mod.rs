//! Window Manager Module
//!
//! Tracks top-level application windows: discovery against the windowing
//! system, the per-window state machine, outgoing protocol requests and the
//! notification fan-out to the shell.

pub mod backend;
pub mod client;
pub mod discovery;
pub mod dispatch;
pub mod events;
pub mod ewmh;
pub mod notify;
pub mod registry;
pub mod state;
pub mod x11;

#[cfg(test)]
pub(crate) mod fake;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::WmError;
use crate::shared::{Geometry, NativeHandle};
use crate::wm::backend::WindowSystem;
use crate::wm::client::ManagedWindow;
use crate::wm::dispatch::Dispatcher;
use crate::wm::notify::{ListenerId, NotificationBus, WindowEvent, WindowListener};
use crate::wm::registry::WindowRegistry;

pub use discovery::Reconciliation;

/// Reconcile cycles a local command may stay unconfirmed by default
pub const DEFAULT_SETTLE_CYCLES: u8 = 3;

/// The window lifecycle engine
///
/// Owns the registry and the windowing connection. Everything runs on the
/// caller's thread: `reconcile()` and the state operations are bounded,
/// synchronous calls.
pub struct WindowManager<B: WindowSystem> {
    backend: B,
    registry: WindowRegistry,
    /// Usable screen area, pushed in by the shell
    workspace: Geometry,
    dispatcher: Dispatcher,
    bus: NotificationBus,
    /// Last focused managed window
    active: Option<NativeHandle>,
    settle_cycles: u8,
}

impl<B: WindowSystem> WindowManager<B> {
    pub fn new(backend: B, workspace: Geometry) -> Self {
        info!(
            "Window manager core starting, workspace {}x{} at ({}, {})",
            workspace.width, workspace.height, workspace.x, workspace.y
        );
        Self {
            backend,
            registry: WindowRegistry::new(),
            workspace,
            dispatcher: Dispatcher::new(),
            bus: NotificationBus::new(),
            active: None,
            settle_cycles: DEFAULT_SETTLE_CYCLES,
        }
    }

    /// How many reconcile cycles native reads are distrusted after a local command
    pub fn with_settle_cycles(mut self, cycles: u8) -> Self {
        self.settle_cycles = cycles;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn workspace(&self) -> Geometry {
        self.workspace
    }

    pub fn window(&self, handle: NativeHandle) -> Option<&ManagedWindow> {
        self.registry.get(handle)
    }

    pub fn active_window(&self) -> Option<NativeHandle> {
        self.active
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Every tracked window, ordered by handle, for late-joining listeners
    pub fn snapshot(&self) -> Vec<ManagedWindow> {
        self.registry.snapshot()
    }

    pub fn register_listener(&mut self, listener: Box<dyn WindowListener>) -> ListenerId {
        self.bus.register(listener)
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        self.bus.unregister(id)
    }

    /// Channel receiving every future event (no history)
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<WindowEvent> {
        self.bus.subscribe()
    }

    /// Write queued requests; only a lost connection is reported
    pub fn flush(&self) -> Result<(), WmError> {
        if let Err(err) = self.backend.flush() {
            if let Some(fatal) = WmError::from_backend(&err) {
                return Err(fatal);
            }
            warn!("Flush failed: {}", err);
        }
        Ok(())
    }

    fn emit(&mut self, event: WindowEvent) {
        self.bus.emit(&event);
    }

    fn emit_all(&mut self, events: Vec<WindowEvent>) {
        for event in events {
            self.bus.emit(&event);
        }
    }

    /// Look up a window for a state operation, logging unknown handles
    fn lookup(&self, handle: NativeHandle, operation: &str) -> Option<&ManagedWindow> {
        let window = self.registry.get(handle);
        if window.is_none() {
            debug!("{} ignored: window 0x{:x} is not managed", operation, handle);
        }
        window
    }
}
