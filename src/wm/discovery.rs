//! Discovery Module
//!
//! One reconcile cycle: list the native top-level windows, drop registry
//! entries that vanished, classify and admit new ones, and refresh the cached
//! title, geometry and state of the rest.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::WmError;
use crate::shared::{NativeHandle, WindowState};
use crate::wm::backend::{NativeAttributes, NetState, WindowSystem};
use crate::wm::client::{title_or_default, ManagedWindow, PendingCommand};
use crate::wm::notify::WindowEvent;
use crate::wm::state::apply_transition;
use crate::wm::WindowManager;

/// Outcome of one reconcile cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<ManagedWindow>,
    pub removed: Vec<NativeHandle>,
    pub updated: Vec<NativeHandle>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

impl<B: WindowSystem> WindowManager<B> {
    /// Diff the live window list against the registry
    ///
    /// Removals are applied (and notified) before any addition. Windows whose
    /// attributes cannot be read are skipped and retried next cycle. Only a
    /// lost connection is returned as an error.
    pub fn reconcile(&mut self) -> Result<Reconciliation, WmError> {
        let listed = match self.backend.enumerate_top_level_windows() {
            Ok(listed) => listed,
            Err(err) => {
                if let Some(fatal) = WmError::from_backend(&err) {
                    return Err(fatal);
                }
                warn!("Window enumeration failed, skipping cycle: {}", err);
                return Ok(Reconciliation::default());
            }
        };

        let present: HashSet<NativeHandle> = listed.iter().copied().collect();
        let mut result = Reconciliation {
            removed: self.registry.retain_present(&present),
            ..Default::default()
        };

        for &handle in &result.removed {
            debug!("Window 0x{:x} is gone", handle);
            if self.active == Some(handle) {
                self.active = None;
            }
            self.emit(WindowEvent::WindowRemoved { handle });
        }

        let mut seen = HashSet::with_capacity(listed.len());
        for handle in listed {
            if !seen.insert(handle) || self.registry.is_ignored(handle) {
                continue;
            }

            let attrs = match self.backend.window_attributes(handle) {
                Ok(attrs) => attrs,
                Err(err) => {
                    if let Some(fatal) = WmError::from_backend(&err) {
                        return Err(fatal);
                    }
                    debug!("Skipping window 0x{:x} this cycle: {}", handle, err);
                    continue;
                }
            };

            if self.registry.contains(handle) {
                if self.refresh_window(handle, &attrs) {
                    result.updated.push(handle);
                }
            } else if let Some(window) = self.admit(handle, &attrs)? {
                result.added.push(window);
            }
        }

        self.refresh_active()?;

        if !result.added.is_empty() || !result.removed.is_empty() {
            info!(
                "Reconcile: {} added, {} removed, {} updated, {} tracked",
                result.added.len(),
                result.removed.len(),
                result.updated.len(),
                self.registry.len()
            );
        }

        Ok(result)
    }

    /// Classify an unknown handle and start tracking it if it qualifies
    fn admit(
        &mut self,
        handle: NativeHandle,
        attrs: &NativeAttributes,
    ) -> Result<Option<ManagedWindow>, WmError> {
        // Not mapped yet: its type may not be final, look again next cycle.
        // Iconified windows are unmapped too but do exist.
        if !attrs.viewable && !attrs.net_state.contains(NetState::HIDDEN) {
            debug!("Window 0x{:x} not viewable yet", handle);
            return Ok(None);
        }

        if !attrs.is_manageable() {
            debug!(
                "Window 0x{:x} not manageable (kind={:?}, override_redirect={})",
                handle, attrs.kind, attrs.override_redirect
            );
            self.registry.ignore(handle);
            return Ok(None);
        }

        // An iconified window may still carry the state it was iconified from
        let mut window = ManagedWindow::from_native(handle, attrs);
        let beneath = attrs.net_state.difference(NetState::HIDDEN).implied_state();
        apply_transition(&mut window, beneath, self.workspace);
        apply_transition(&mut window, attrs.net_state.implied_state(), self.workspace);

        if let Err(err) = self.backend.watch(handle) {
            if let Some(fatal) = WmError::from_backend(&err) {
                return Err(fatal);
            }
            debug!("Could not watch window 0x{:x}: {}", handle, err);
        }

        info!("Managing window 0x{:x} ({})", handle, window.title);
        self.registry.insert(window.clone());

        self.emit(WindowEvent::WindowAdded {
            handle,
            title: window.title.clone(),
            geometry: window.current_geometry,
        });
        if window.state != WindowState::Normal {
            self.emit(WindowEvent::WindowStateChanged { handle, state: window.state });
        }

        Ok(Some(window))
    }

    /// Fold a fresh native read into an existing entry; true if anything changed
    fn refresh_window(&mut self, handle: NativeHandle, attrs: &NativeAttributes) -> bool {
        let workspace = self.workspace;
        let Some(window) = self.registry.get_mut(handle) else {
            return false;
        };

        let mut events = Vec::new();

        let title = title_or_default(attrs.title.as_deref());
        if title != window.title {
            window.title = title.clone();
            events.push(WindowEvent::WindowTitleChanged { handle, title });
        }

        if !window.is_closing() {
            let native_state = attrs.net_state.implied_state();
            let trust_native = match window.pending {
                Some(pending) if pending.target == native_state => {
                    debug!("Window 0x{:x} confirmed {:?}", handle, native_state);
                    window.pending = None;
                    true
                }
                Some(pending) if pending.cycles_left > 1 => {
                    window.pending = Some(PendingCommand {
                        cycles_left: pending.cycles_left - 1,
                        ..pending
                    });
                    false
                }
                Some(pending) => {
                    debug!(
                        "Window 0x{:x} never confirmed {:?}, following native state {:?}",
                        handle, pending.target, native_state
                    );
                    window.pending = None;
                    true
                }
                None => true,
            };

            if trust_native {
                if apply_transition(window, native_state, workspace) {
                    events.push(WindowEvent::WindowStateChanged { handle, state: window.state });
                }
                if window.state == WindowState::Normal && attrs.geometry != window.current_geometry {
                    window.current_geometry = attrs.geometry;
                    events.push(WindowEvent::WindowGeometryChanged {
                        handle,
                        geometry: attrs.geometry,
                    });
                }
            }
        }

        let updated = !events.is_empty();
        self.emit_all(events);
        updated
    }

    fn refresh_active(&mut self) -> Result<(), WmError> {
        let active = match self.backend.active_window() {
            Ok(active) => active.filter(|handle| self.registry.contains(*handle)),
            Err(err) => {
                if let Some(fatal) = WmError::from_backend(&err) {
                    return Err(fatal);
                }
                debug!("Active window query failed: {}", err);
                return Ok(());
            }
        };

        if active != self.active {
            self.active = active;
            if let Some(handle) = active {
                self.emit(WindowEvent::WindowFocused { handle });
            }
        }
        Ok(())
    }
}
