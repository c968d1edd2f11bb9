//! In-memory windowing system for tests

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::error::BackendError;
use crate::shared::{Geometry, NativeHandle};
use crate::wm::backend::{NativeAttributes, NetState, WindowKind, WindowSystem};
use crate::wm::dispatch::Command;

#[derive(Default)]
struct FakeState {
    windows: BTreeMap<NativeHandle, NativeAttributes>,
    failing: HashSet<NativeHandle>,
    sent: Vec<(NativeHandle, Command)>,
    watched: Vec<NativeHandle>,
    active: Option<NativeHandle>,
    fail_sends: bool,
    connection_lost: bool,
    flushes: usize,
    /// Apply sent commands to the native flags like an EWMH window manager
    follow_commands: bool,
}

/// Scriptable [`WindowSystem`]; all mutators take `&self` and clones share
/// state, so a test can keep driving it after handing it to the engine.
#[derive(Clone, Default)]
pub(crate) struct FakeWindowSystem {
    state: Rc<RefCell<FakeState>>,
}

/// Attributes of a plain mapped application window
pub(crate) fn app_window(title: &str, geometry: Geometry) -> NativeAttributes {
    NativeAttributes {
        kind: WindowKind::Normal,
        override_redirect: false,
        geometry,
        title: Some(title.to_string()),
        viewable: true,
        net_state: NetState::empty(),
    }
}

impl FakeWindowSystem {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A fake whose window manager honours every request
    ///
    /// Flags are only ever set or cleared one request at a time, so a
    /// maximized window stays flagged maximized while iconified or
    /// fullscreen, exactly as an EWMH window manager keeps them.
    pub(crate) fn with_window_manager() -> Self {
        let fake = Self::default();
        fake.state.borrow_mut().follow_commands = true;
        fake
    }

    pub(crate) fn net_state(&self, handle: NativeHandle) -> Option<NetState> {
        self.state.borrow().windows.get(&handle).map(|attrs| attrs.net_state)
    }

    pub(crate) fn insert(&self, handle: NativeHandle, attrs: NativeAttributes) {
        self.state.borrow_mut().windows.insert(handle, attrs);
    }

    pub(crate) fn add_app(&self, handle: NativeHandle, title: &str, geometry: Geometry) {
        self.insert(handle, app_window(title, geometry));
    }

    pub(crate) fn remove(&self, handle: NativeHandle) {
        self.state.borrow_mut().windows.remove(&handle);
    }

    pub(crate) fn update(&self, handle: NativeHandle, f: impl FnOnce(&mut NativeAttributes)) {
        if let Some(attrs) = self.state.borrow_mut().windows.get_mut(&handle) {
            f(attrs);
        }
    }

    pub(crate) fn fail_queries_for(&self, handle: NativeHandle, failing: bool) {
        let mut state = self.state.borrow_mut();
        if failing {
            state.failing.insert(handle);
        } else {
            state.failing.remove(&handle);
        }
    }

    pub(crate) fn fail_sends(&self, failing: bool) {
        self.state.borrow_mut().fail_sends = failing;
    }

    pub(crate) fn lose_connection(&self) {
        self.state.borrow_mut().connection_lost = true;
    }

    pub(crate) fn set_active(&self, handle: Option<NativeHandle>) {
        self.state.borrow_mut().active = handle;
    }

    pub(crate) fn sent(&self) -> Vec<(NativeHandle, Command)> {
        self.state.borrow().sent.clone()
    }

    pub(crate) fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }

    pub(crate) fn watched(&self) -> Vec<NativeHandle> {
        self.state.borrow().watched.clone()
    }

    pub(crate) fn flushes(&self) -> usize {
        self.state.borrow().flushes
    }

    fn check_connection(&self) -> Result<(), BackendError> {
        if self.state.borrow().connection_lost {
            return Err(BackendError::ConnectionLost("broken pipe".into()));
        }
        Ok(())
    }
}

impl WindowSystem for FakeWindowSystem {
    fn enumerate_top_level_windows(&self) -> Result<Vec<NativeHandle>, BackendError> {
        self.check_connection()?;
        Ok(self.state.borrow().windows.keys().copied().collect())
    }

    fn window_attributes(&self, handle: NativeHandle) -> Result<NativeAttributes, BackendError> {
        self.check_connection()?;
        let state = self.state.borrow();
        if state.failing.contains(&handle) {
            return Err(BackendError::Query { handle, reason: "BadWindow".into() });
        }
        state
            .windows
            .get(&handle)
            .cloned()
            .ok_or_else(|| BackendError::Query { handle, reason: "BadWindow".into() })
    }

    fn active_window(&self) -> Result<Option<NativeHandle>, BackendError> {
        self.check_connection()?;
        Ok(self.state.borrow().active)
    }

    fn watch(&self, handle: NativeHandle) -> Result<(), BackendError> {
        self.check_connection()?;
        self.state.borrow_mut().watched.push(handle);
        Ok(())
    }

    fn send(&self, handle: NativeHandle, command: &Command) -> Result<(), BackendError> {
        self.check_connection()?;
        let mut state = self.state.borrow_mut();
        if state.fail_sends || !state.windows.contains_key(&handle) {
            return Err(BackendError::Request { handle, reason: "BadWindow".into() });
        }
        state.sent.push((handle, *command));
        if state.follow_commands {
            if let Some(attrs) = state.windows.get_mut(&handle) {
                honour(attrs, command);
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), BackendError> {
        self.check_connection()?;
        self.state.borrow_mut().flushes += 1;
        Ok(())
    }
}

/// What a window manager does to a window's flags on each request
fn honour(attrs: &mut NativeAttributes, command: &Command) {
    let both = NetState::MAXIMIZED_HORZ | NetState::MAXIMIZED_VERT;
    match *command {
        Command::Minimize => {
            attrs.net_state.insert(NetState::HIDDEN);
            attrs.viewable = false;
        }
        Command::Activate => {
            attrs.net_state.remove(NetState::HIDDEN);
            attrs.viewable = true;
        }
        Command::SetMaximized { enabled } => attrs.net_state.set(both, enabled),
        Command::SetFullScreen { enabled } => attrs.net_state.set(NetState::FULLSCREEN, enabled),
        // Up to the client
        Command::Close => {}
    }
}
