//! Async driver
//!
//! Runs the engine on one task: waits for the windowing connection to report
//! changes, for requests from the shell, or for the periodic safety sweep,
//! then reconciles at most once per wake and flushes queued requests.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{BackendError, WmError};
use crate::shared::{Geometry, NativeHandle};
use crate::wm::backend::WindowSystem;
use crate::wm::client::ManagedWindow;
use crate::wm::WindowManager;

/// Where change notifications come from
#[allow(async_fn_in_trait)]
pub trait ChangeSource {
    /// Resolves once there may be notifications to drain
    async fn wait(&mut self);

    /// Consume everything pending; true if any of it calls for a reconcile
    fn drain(&mut self) -> Result<bool, BackendError>;
}

/// Requests from the shell (panel, taskbar, launcher)
#[derive(Debug)]
pub enum ShellRequest {
    Minimize(NativeHandle),
    Maximize(NativeHandle),
    Restore(NativeHandle),
    ToggleMaximize(NativeHandle),
    SetFullScreen { handle: NativeHandle, enabled: bool },
    Activate(NativeHandle),
    Close(NativeHandle),
    /// The usable screen area changed (panel moved, resolution change)
    WorkspaceChanged(Geometry),
    /// Reconcile now instead of waiting for a notification
    Refresh,
    /// Current registry contents, ordered by handle
    Snapshot(oneshot::Sender<Vec<ManagedWindow>>),
}

pub struct Driver<B: WindowSystem, S: ChangeSource> {
    wm: WindowManager<B>,
    source: S,
    sweep_interval: Duration,
}

impl<B: WindowSystem, S: ChangeSource> Driver<B, S> {
    pub fn new(wm: WindowManager<B>, source: S, sweep_interval: Duration) -> Self {
        Self {
            wm,
            source,
            sweep_interval,
        }
    }

    pub fn manager(&self) -> &WindowManager<B> {
        &self.wm
    }

    pub fn manager_mut(&mut self) -> &mut WindowManager<B> {
        &mut self.wm
    }

    /// Run until the request channel closes or the connection is lost
    ///
    /// Hands the engine back on a clean shutdown.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<ShellRequest>,
    ) -> Result<WindowManager<B>, WmError> {
        self.wm.reconcile()?;
        self.wm.flush()?;

        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately
        sweep.tick().await;

        loop {
            let mut dirty = false;

            // Changes first, so requests act on fresh state
            tokio::select! {
                biased;
                _ = self.source.wait() => {}
                request = requests.recv() => match request {
                    Some(request) => dirty |= handle_request(&mut self.wm, request),
                    None => {
                        info!("Request channel closed, driver stopping");
                        return Ok(self.wm);
                    }
                },
                _ = sweep.tick() => {
                    debug!("Safety sweep");
                    dirty = true;
                }
            }

            match self.source.drain() {
                Ok(changed) => dirty |= changed,
                Err(err) => {
                    if let Some(fatal) = WmError::from_backend(&err) {
                        return Err(fatal);
                    }
                    warn!("Reading notifications failed: {}", err);
                    dirty = true;
                }
            }

            if dirty {
                self.wm.reconcile()?;
            }
            self.wm.flush()?;
        }
    }
}

/// Apply one shell request; true if it asks for a reconcile
fn handle_request<B: WindowSystem>(wm: &mut WindowManager<B>, request: ShellRequest) -> bool {
    debug!("Shell request: {:?}", request);
    match request {
        ShellRequest::Minimize(handle) => wm.minimize(handle),
        ShellRequest::Maximize(handle) => wm.maximize(handle),
        ShellRequest::Restore(handle) => wm.restore(handle),
        ShellRequest::ToggleMaximize(handle) => wm.toggle_maximize(handle),
        ShellRequest::SetFullScreen { handle, enabled } => wm.set_fullscreen(handle, enabled),
        ShellRequest::Activate(handle) => wm.activate(handle),
        ShellRequest::Close(handle) => wm.request_close(handle),
        ShellRequest::WorkspaceChanged(rect) => wm.apply_workspace_geometry(rect),
        ShellRequest::Refresh => return true,
        ShellRequest::Snapshot(reply) => {
            if reply.send(wm.snapshot()).is_err() {
                debug!("Snapshot requester went away");
            }
        }
    }
    false
}
