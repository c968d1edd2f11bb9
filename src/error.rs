//! Error types crossing the library boundary

use thiserror::Error;

use crate::shared::NativeHandle;

/// Failure reported by a [`crate::wm::backend::WindowSystem`] call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The connection to the windowing system is gone
    #[error("connection to the windowing system lost: {0}")]
    ConnectionLost(String),

    /// A query about one window failed (usually because it just vanished)
    #[error("query on window 0x{handle:x} failed: {reason}")]
    Query { handle: NativeHandle, reason: String },

    /// An outgoing request could not be written
    #[error("request to window 0x{handle:x} failed: {reason}")]
    Request { handle: NativeHandle, reason: String },
}

/// Failure surfaced to the owning shell
///
/// Everything transient is absorbed inside the engine; only losing the
/// windowing connection makes it out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WmError {
    #[error("lost connection to the windowing system: {0}")]
    ConnectionLost(String),
}

impl WmError {
    /// Promote a backend error, keeping only the fatal kind
    ///
    /// Returns `None` for errors that must be absorbed locally.
    pub fn from_backend(err: &BackendError) -> Option<Self> {
        match err {
            BackendError::ConnectionLost(reason) => Some(Self::ConnectionLost(reason.clone())),
            _ => None,
        }
    }
}
