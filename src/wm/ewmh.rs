//! EWMH (Extended Window Manager Hints) and ICCCM plumbing
//!
//! Atom interning, property decoding and the client messages used to ask the
//! running window manager for state changes.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{ClientMessageEvent, *};

use crate::wm::backend::{NetState, WindowKind};
use crate::wm::dispatch::Command;

/// ICCCM `IconicState`, as stored in `WM_STATE` and sent in `WM_CHANGE_STATE`
pub const ICONIC_STATE: u32 = 3;

/// `_NET_WM_STATE` actions
pub const NET_WM_STATE_REMOVE: u32 = 0;
pub const NET_WM_STATE_ADD: u32 = 1;

/// Source indication for pagers and taskbars
pub const SOURCE_PAGER: u32 = 2;

/// Holds every interned atom the engine reads or sends
#[derive(Debug, Clone)]
pub struct Atoms {
    pub net_supporting_wm_check: Atom,
    pub net_client_list: Atom,
    pub net_active_window: Atom,
    pub net_wm_name: Atom,
    pub net_wm_window_type: Atom,
    pub _net_wm_window_type_desktop: Atom,
    pub _net_wm_window_type_dock: Atom,
    pub _net_wm_window_type_normal: Atom,
    pub _net_wm_window_type_dialog: Atom,
    pub _net_wm_window_type_utility: Atom,
    pub _net_wm_window_type_toolbar: Atom,
    pub _net_wm_window_type_splash: Atom,
    pub _net_wm_window_type_menu: Atom,
    pub _net_wm_window_type_dropdown_menu: Atom,
    pub _net_wm_window_type_popup_menu: Atom,
    pub _net_wm_window_type_tooltip: Atom,
    pub _net_wm_window_type_notification: Atom,
    pub _net_wm_window_type_combo: Atom,
    pub _net_wm_window_type_dnd: Atom,
    pub net_wm_state: Atom,
    pub _net_wm_state_fullscreen: Atom,
    pub _net_wm_state_maximized_vert: Atom,
    pub _net_wm_state_maximized_horz: Atom,
    pub _net_wm_state_hidden: Atom,
    // Standard X11 atoms
    pub _wm_protocols: Atom,
    pub _wm_delete_window: Atom,
    pub _wm_change_state: Atom,
    pub _wm_state: Atom,
    pub _utf8_string: Atom,
}

/// A client message ready for `send_event`
#[derive(Debug, Clone, Copy)]
pub struct ClientRequest {
    pub destination: Window,
    pub mask: EventMask,
    pub event: ClientMessageEvent,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_supporting_wm_check: intern("_NET_SUPPORTING_WM_CHECK")?,
            net_client_list: intern("_NET_CLIENT_LIST")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_window_type: intern("_NET_WM_WINDOW_TYPE")?,
            _net_wm_window_type_desktop: intern("_NET_WM_WINDOW_TYPE_DESKTOP")?,
            _net_wm_window_type_dock: intern("_NET_WM_WINDOW_TYPE_DOCK")?,
            _net_wm_window_type_normal: intern("_NET_WM_WINDOW_TYPE_NORMAL")?,
            _net_wm_window_type_dialog: intern("_NET_WM_WINDOW_TYPE_DIALOG")?,
            _net_wm_window_type_utility: intern("_NET_WM_WINDOW_TYPE_UTILITY")?,
            _net_wm_window_type_toolbar: intern("_NET_WM_WINDOW_TYPE_TOOLBAR")?,
            _net_wm_window_type_splash: intern("_NET_WM_WINDOW_TYPE_SPLASH")?,
            _net_wm_window_type_menu: intern("_NET_WM_WINDOW_TYPE_MENU")?,
            _net_wm_window_type_dropdown_menu: intern("_NET_WM_WINDOW_TYPE_DROPDOWN_MENU")?,
            _net_wm_window_type_popup_menu: intern("_NET_WM_WINDOW_TYPE_POPUP_MENU")?,
            _net_wm_window_type_tooltip: intern("_NET_WM_WINDOW_TYPE_TOOLTIP")?,
            _net_wm_window_type_notification: intern("_NET_WM_WINDOW_TYPE_NOTIFICATION")?,
            _net_wm_window_type_combo: intern("_NET_WM_WINDOW_TYPE_COMBO")?,
            _net_wm_window_type_dnd: intern("_NET_WM_WINDOW_TYPE_DND")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            _net_wm_state_fullscreen: intern("_NET_WM_STATE_FULLSCREEN")?,
            _net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT")?,
            _net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            _net_wm_state_hidden: intern("_NET_WM_STATE_HIDDEN")?,
            _wm_protocols: intern("WM_PROTOCOLS")?,
            _wm_delete_window: intern("WM_DELETE_WINDOW")?,
            _wm_change_state: intern("WM_CHANGE_STATE")?,
            _wm_state: intern("WM_STATE")?,
            _utf8_string: intern("UTF8_STRING")?,
        })
    }

    /// Properties whose change can alter what discovery reports
    pub fn watched_properties(&self) -> [Atom; 7] {
        [
            self.net_client_list,
            self.net_active_window,
            self.net_wm_name,
            AtomEnum::WM_NAME.into(),
            self.net_wm_state,
            self._wm_state,
            self.net_wm_window_type,
        ]
    }

    /// Map `_NET_WM_WINDOW_TYPE` to a [`WindowKind`]
    ///
    /// The list is in order of preference, so the first type we recognise
    /// wins. Without any recognised type a window is Normal, or a Dialog when
    /// it is transient for another window.
    pub fn classify_window_type(&self, types: &[Atom], transient: bool) -> WindowKind {
        let other = [
            self._net_wm_window_type_utility,
            self._net_wm_window_type_toolbar,
            self._net_wm_window_type_splash,
            self._net_wm_window_type_menu,
            self._net_wm_window_type_dropdown_menu,
            self._net_wm_window_type_popup_menu,
            self._net_wm_window_type_tooltip,
            self._net_wm_window_type_notification,
            self._net_wm_window_type_combo,
            self._net_wm_window_type_dnd,
        ];

        for &atom in types {
            if atom == self._net_wm_window_type_normal {
                return WindowKind::Normal;
            } else if atom == self._net_wm_window_type_dialog {
                return WindowKind::Dialog;
            } else if atom == self._net_wm_window_type_desktop {
                return WindowKind::Desktop;
            } else if atom == self._net_wm_window_type_dock {
                return WindowKind::Dock;
            } else if other.contains(&atom) {
                return WindowKind::Other;
            }
        }

        if transient {
            WindowKind::Dialog
        } else {
            WindowKind::Normal
        }
    }

    /// Decode the `_NET_WM_STATE` atoms we care about
    pub fn net_state_flags(&self, states: &[Atom]) -> NetState {
        states.iter().fold(NetState::empty(), |flags, &atom| {
            if atom == self._net_wm_state_maximized_vert {
                flags | NetState::MAXIMIZED_VERT
            } else if atom == self._net_wm_state_maximized_horz {
                flags | NetState::MAXIMIZED_HORZ
            } else if atom == self._net_wm_state_hidden {
                flags | NetState::HIDDEN
            } else if atom == self._net_wm_state_fullscreen {
                flags | NetState::FULLSCREEN
            } else {
                flags
            }
        })
    }

    /// Build the client message carrying `command` for `window`
    ///
    /// State requests go to the root window so the window manager sees them;
    /// the close request goes to the client itself.
    pub fn client_request(&self, root: Window, window: Window, command: &Command) -> ClientRequest {
        let to_root = |type_: Atom, data: [u32; 5]| ClientRequest {
            destination: root,
            mask: EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event: ClientMessageEvent::new(32, window, type_, data),
        };
        let action = |enabled: bool| if enabled { NET_WM_STATE_ADD } else { NET_WM_STATE_REMOVE };

        match *command {
            Command::Minimize => to_root(self._wm_change_state, [ICONIC_STATE, 0, 0, 0, 0]),
            Command::SetMaximized { enabled } => to_root(
                self.net_wm_state,
                [
                    action(enabled),
                    self._net_wm_state_maximized_horz,
                    self._net_wm_state_maximized_vert,
                    SOURCE_PAGER,
                    0,
                ],
            ),
            Command::SetFullScreen { enabled } => to_root(
                self.net_wm_state,
                [action(enabled), self._net_wm_state_fullscreen, 0, SOURCE_PAGER, 0],
            ),
            Command::Activate => to_root(
                self.net_active_window,
                [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
            ),
            Command::Close => ClientRequest {
                destination: window,
                // NO_EVENT delivers to the client that selected nothing
                mask: EventMask::NO_EVENT,
                event: ClientMessageEvent::new(
                    32,
                    window,
                    self._wm_protocols,
                    [self._wm_delete_window, x11rb::CURRENT_TIME, 0, 0, 0],
                ),
            },
        }
    }

    /// Read a 32-bit list property; missing properties read as empty
    pub fn get_list<C: Connection>(
        &self,
        conn: &C,
        window: Window,
        property: Atom,
        type_: impl Into<Atom>,
    ) -> Result<Vec<u32>, ReplyError> {
        let reply = conn
            .get_property(false, window, property, type_, 0, 1024)?
            .reply()?;
        Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
    }

    /// Read a single WINDOW-typed property (`_NET_ACTIVE_WINDOW`, ...)
    pub fn get_window<C: Connection>(
        &self,
        conn: &C,
        window: Window,
        property: Atom,
    ) -> Result<Option<Window>, ReplyError> {
        let values = self.get_list(conn, window, property, AtomEnum::WINDOW)?;
        Ok(values.first().copied().filter(|&w| w != x11rb::NONE))
    }

    /// Get _NET_WM_WINDOW_TYPE property for a window
    pub fn get_window_type<C: Connection>(
        &self,
        conn: &C,
        window: Window,
    ) -> Result<Vec<Atom>, ReplyError> {
        self.get_list(conn, window, self.net_wm_window_type, AtomEnum::ATOM)
    }

    /// `_NET_WM_STATE` flags, with ICCCM iconic state folded into `HIDDEN`
    pub fn get_net_state<C: Connection>(
        &self,
        conn: &C,
        window: Window,
    ) -> Result<NetState, ReplyError> {
        let states = self.get_list(conn, window, self.net_wm_state, AtomEnum::ATOM)?;
        let mut flags = self.net_state_flags(&states);

        let wm_state = self.get_list(conn, window, self._wm_state, self._wm_state)?;
        if wm_state.first() == Some(&ICONIC_STATE) {
            flags |= NetState::HIDDEN;
        }
        Ok(flags)
    }

    pub fn is_transient<C: Connection>(&self, conn: &C, window: Window) -> Result<bool, ReplyError> {
        Ok(self
            .get_window(conn, window, AtomEnum::WM_TRANSIENT_FOR.into())?
            .is_some())
    }

    /// `_NET_WM_NAME`, falling back to `WM_NAME`; `None` when neither is set
    pub fn get_title<C: Connection>(
        &self,
        conn: &C,
        window: Window,
    ) -> Result<Option<String>, ReplyError> {
        let reply = conn
            .get_property(false, window, self.net_wm_name, self._utf8_string, 0, 1024)?
            .reply()?;
        if !reply.value.is_empty() {
            return Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()));
        }

        let reply = conn
            .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::ANY, 0, 1024)?
            .reply()?;
        if reply.type_ == x11rb::NONE {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }
}

#[cfg(test)]
impl Atoms {
    /// Distinct made-up atom values, no server needed
    pub(crate) fn for_tests() -> Self {
        Self {
            net_supporting_wm_check: 300,
            net_client_list: 301,
            net_active_window: 302,
            net_wm_name: 303,
            net_wm_window_type: 304,
            _net_wm_window_type_desktop: 310,
            _net_wm_window_type_dock: 311,
            _net_wm_window_type_normal: 312,
            _net_wm_window_type_dialog: 313,
            _net_wm_window_type_utility: 314,
            _net_wm_window_type_toolbar: 315,
            _net_wm_window_type_splash: 316,
            _net_wm_window_type_menu: 317,
            _net_wm_window_type_dropdown_menu: 318,
            _net_wm_window_type_popup_menu: 319,
            _net_wm_window_type_tooltip: 320,
            _net_wm_window_type_notification: 321,
            _net_wm_window_type_combo: 322,
            _net_wm_window_type_dnd: 323,
            net_wm_state: 330,
            _net_wm_state_fullscreen: 331,
            _net_wm_state_maximized_vert: 332,
            _net_wm_state_maximized_horz: 333,
            _net_wm_state_hidden: 334,
            _wm_protocols: 340,
            _wm_delete_window: 341,
            _wm_change_state: 342,
            _wm_state: 343,
            _utf8_string: 344,
        }
    }
}
