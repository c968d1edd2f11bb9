//! X11 windowing backend
//!
//! [`WindowSystem`] over an x11rb connection. The engine runs beside a
//! window manager, not as one: it only listens for substructure and property
//! notifications on the root window and asks the window manager for changes
//! through EWMH client messages.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::driver::ChangeSource;
use crate::error::BackendError;
use crate::shared::{Geometry, NativeHandle};
use crate::wm::backend::{NativeAttributes, WindowSystem};
use crate::wm::dispatch::Command;
use crate::wm::events::{EventResult, EventRouter};
use crate::wm::ewmh::Atoms;
use crate::x11_async::X11EventStream;

fn connection_lost(err: ConnectionError) -> BackendError {
    BackendError::ConnectionLost(err.to_string())
}

fn query_failed(handle: NativeHandle, err: ReplyError) -> BackendError {
    match err {
        ReplyError::ConnectionError(err) => connection_lost(err),
        ReplyError::X11Error(err) => BackendError::Query {
            handle,
            reason: format!("{:?}", err.error_kind),
        },
    }
}

pub struct X11Backend {
    conn: Arc<RustConnection>,
    root: Window,
    screen: Geometry,
    atoms: Atoms,
    prefer_client_list: bool,
}

impl X11Backend {
    /// Connect to `display` (or `$DISPLAY`) and start listening on the root window
    pub fn connect(display: Option<&str>, prefer_client_list: bool) -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(display).context("Failed to connect to X server")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_geometry = Geometry::new(
            0,
            0,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        );

        let atoms = Atoms::new(&conn).context("Failed to intern atoms")?;

        // Never SUBSTRUCTURE_REDIRECT: that belongs to the window manager
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::SUBSTRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE),
        )?
        .check()
        .context("Failed to select events on the root window")?;
        conn.flush()?;

        info!(
            "Connected to X server, screen {} ({}x{}), root 0x{:x}",
            screen_num, screen_geometry.width, screen_geometry.height, root
        );

        Ok(Self {
            conn: Arc::new(conn),
            root,
            screen: screen_geometry,
            atoms,
            prefer_client_list,
        })
    }

    pub fn connection(&self) -> Arc<RustConnection> {
        self.conn.clone()
    }

    /// Full size of the default screen
    pub fn screen_geometry(&self) -> Geometry {
        self.screen
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    /// Whether an EWMH window manager is running
    fn has_ewmh_wm(&self) -> Result<bool, ReplyError> {
        let check = self
            .atoms
            .get_window(self.conn.as_ref(), self.root, self.atoms.net_supporting_wm_check)?;
        Ok(check.is_some())
    }

    fn list_windows(&self) -> Result<Vec<NativeHandle>, ReplyError> {
        if self.prefer_client_list && self.has_ewmh_wm()? {
            return self.atoms.get_list(
                self.conn.as_ref(),
                self.root,
                self.atoms.net_client_list,
                AtomEnum::WINDOW,
            );
        }
        Ok(self.conn.query_tree(self.root)?.reply()?.children)
    }

    fn read_attributes(&self, handle: NativeHandle) -> Result<NativeAttributes, ReplyError> {
        let conn = self.conn.as_ref();

        // Pipeline the core requests
        let attrs = conn.get_window_attributes(handle)?;
        let geometry = conn.get_geometry(handle)?;
        let position = conn.translate_coordinates(handle, self.root, 0, 0)?;
        let attrs = attrs.reply()?;
        let geometry = geometry.reply()?;
        let position = position.reply()?;

        let types = self.atoms.get_window_type(conn, handle)?;
        let transient = self.atoms.is_transient(conn, handle)?;

        Ok(NativeAttributes {
            kind: self.atoms.classify_window_type(&types, transient),
            override_redirect: attrs.override_redirect,
            geometry: Geometry::new(
                i32::from(position.dst_x),
                i32::from(position.dst_y),
                u32::from(geometry.width),
                u32::from(geometry.height),
            ),
            title: self.atoms.get_title(conn, handle)?,
            viewable: attrs.map_state == MapState::VIEWABLE,
            net_state: self.atoms.get_net_state(conn, handle)?,
        })
    }
}

impl WindowSystem for X11Backend {
    fn enumerate_top_level_windows(&self) -> Result<Vec<NativeHandle>, BackendError> {
        self.list_windows().map_err(|err| query_failed(self.root, err))
    }

    fn window_attributes(&self, handle: NativeHandle) -> Result<NativeAttributes, BackendError> {
        self.read_attributes(handle)
            .map_err(|err| query_failed(handle, err))
    }

    fn active_window(&self) -> Result<Option<NativeHandle>, BackendError> {
        self.atoms
            .get_window(self.conn.as_ref(), self.root, self.atoms.net_active_window)
            .map_err(|err| query_failed(self.root, err))
    }

    fn watch(&self, handle: NativeHandle) -> Result<(), BackendError> {
        // Unchecked: a window that is already gone shows up as an error event
        self.conn
            .change_window_attributes(
                handle,
                &ChangeWindowAttributesAux::new()
                    .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
            )
            .map_err(connection_lost)?;
        Ok(())
    }

    fn send(&self, handle: NativeHandle, command: &Command) -> Result<(), BackendError> {
        if handle == x11rb::NONE {
            return Err(BackendError::Request {
                handle,
                reason: "invalid window id".to_string(),
            });
        }
        let request = self.atoms.client_request(self.root, handle, command);
        self.conn
            .send_event(false, request.destination, request.mask, request.event)
            .map_err(connection_lost)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), BackendError> {
        self.conn.flush().map_err(connection_lost)
    }
}

/// Feeds X11 notifications into the driver
pub struct X11ChangeSource {
    stream: X11EventStream,
    router: EventRouter,
}

impl X11ChangeSource {
    pub fn new(backend: &X11Backend) -> Result<Self> {
        Ok(Self {
            stream: X11EventStream::new(backend.connection())?,
            router: EventRouter::new(backend.atoms().watched_properties()),
        })
    }
}

impl ChangeSource for X11ChangeSource {
    async fn wait(&mut self) {
        self.stream.wait_readable().await;
    }

    fn drain(&mut self) -> Result<bool, BackendError> {
        let mut dirty = false;
        let mut count = 0usize;
        while let Some(event) = self.stream.poll_next_event()? {
            count += 1;
            dirty |= self.router.route_event(&event) == EventResult::Reconcile;
        }
        if count > 0 {
            debug!("Drained {} X11 events, reconcile needed: {}", count, dirty);
        }
        Ok(dirty)
    }
}
