//! Area window lifecycle core
//!
//! Discovers top-level application windows on an X11 display, tracks their
//! lifecycle state and geometry against the shell's workspace, asks the
//! running window manager for state changes and reports everything to the
//! shell's panel and taskbar through a notification bus.

pub mod config;
pub mod driver;
pub mod error;
pub mod shared;
pub mod wm;
pub mod x11_async;

pub use driver::{ChangeSource, Driver, ShellRequest};
pub use error::{BackendError, WmError};
pub use shared::{Geometry, NativeHandle, WindowState};
pub use wm::WindowManager;
