//! X11 Async Event Stream
//!
//! Non-blocking X11 event polling: mio watches the connection's file
//! descriptor on a blocking thread and wakes the async loop, which then
//! drains everything x11rb has buffered.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Notify, oneshot};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::error::BackendError;

/// X11 event stream with async readiness notification
///
/// x11rb reads events off the socket into its own buffer, so readiness of
/// the file descriptor is only a hint: after every wake the caller drains
/// [`X11EventStream::poll_next_event`] until it returns `None`. The actual
/// waiting happens on a blocking thread running a mio poll, which pokes a
/// [`Notify`] that the driver awaits.
pub struct X11EventStream {
    conn: Arc<RustConnection>,
    notify: Arc<Notify>,
    _task_guard: oneshot::Receiver<()>,
}

impl X11EventStream {
    /// Create a new X11 event stream over a shared connection
    ///
    /// Registers the connection's file descriptor with a fresh mio poll and
    /// spawns the polling thread. The thread polls with a short timeout so it
    /// notices when the stream is dropped (the guard channel closes) and
    /// exits. Must be called from inside a tokio runtime.
    ///
    /// Fails when mio cannot create the poll or register the descriptor.
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let notify = Arc::new(Notify::new());
        let task_notify = notify.clone();

        let (guard, task_guard) = oneshot::channel::<()>();
        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        let mut events = mio::Events::with_capacity(1);

        poll.registry()
            .register(
                &mut mio::unix::SourceFd(&fd),
                mio::Token(0),
                mio::Interest::READABLE,
            )
            .context("Failed to register X11 FD with mio")?;

        let timeout = Duration::from_millis(100);
        tokio::task::spawn_blocking(move || {
            loop {
                if guard.is_closed() {
                    tracing::debug!("X11 socket polling thread shutting down");
                    return;
                }

                if let Err(err) = poll.poll(&mut events, Some(timeout)) {
                    tracing::warn!("X11 socket poll failed: {:?}", err);
                    continue;
                }

                events
                    .iter()
                    .filter(|event| event.token() == mio::Token(0))
                    .for_each(|_| task_notify.notify_one());
            }
        });

        Ok(Self {
            conn,
            notify,
            _task_guard: task_guard,
        })
    }

    /// Take the next event without blocking
    ///
    /// Returns `Some(event)` while x11rb has events buffered (reading more from
    /// the socket if it is readable) and `None` once nothing is left; call it
    /// in a loop after each wake. Any error here means the connection is
    /// unusable and is reported as [`BackendError::ConnectionLost`].
    pub fn poll_next_event(&self) -> Result<Option<Event>, BackendError> {
        self.conn
            .poll_for_event()
            .map_err(|err| BackendError::ConnectionLost(err.to_string()))
    }

    /// Wait until the X11 file descriptor has become readable
    ///
    /// A wake that arrives while nobody is waiting is stored, so events that
    /// show up between a drain and the next call are not missed. Several
    /// wakes may collapse into one.
    pub async fn wait_readable(&self) {
        self.notify.notified().await;
    }
}
